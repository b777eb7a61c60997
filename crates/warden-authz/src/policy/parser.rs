// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy document parser.
//!
//! Accepts the XACML 1.x/2.0 policy language subset this crate evaluates:
//! `PolicySet`, `Policy`, `Rule`, targets with `*Match` elements, attribute
//! designators, literal values, `Condition` and `Apply`. Obligations are
//! skipped. References, selectors and variables are rejected.

use std::sync::Arc;

use crate::attribute::{AttributeDesignator, AttributeValue, Category, DataType};
use crate::error::PolicyParseError;

use super::combining::CombiningAlgorithms;
use super::expression::{Expression, Function, Pattern};
use super::target::{Target, TargetMatch, TargetSection};
use super::xml::{parse_document, Element};
use super::{Effect, Policy, PolicySet, PolicyTree, Rule};

const IGNORED: [&str; 4] = ["Obligations", "PolicyDefaults", "PolicySetDefaults", "CombinerParameters"];
const UNSUPPORTED: [&str; 7] = [
	"PolicyIdReference",
	"PolicySetIdReference",
	"AttributeSelector",
	"VariableReference",
	"VariableDefinition",
	"Function",
	"RuleCombinerParameters",
];

/// Parses one policy or policy-set document.
pub fn parse_policy(
	bytes: &[u8],
	algorithms: &CombiningAlgorithms,
) -> Result<PolicyTree, PolicyParseError> {
	PolicyParser::new(algorithms).parse(bytes)
}

pub struct PolicyParser<'a> {
	algorithms: &'a CombiningAlgorithms,
}

struct SectionNames {
	container: &'static str,
	alternative: &'static str,
	any: &'static str,
	matcher: &'static str,
	designator: &'static str,
	category: Category,
}

const SECTIONS: [SectionNames; 4] = [
	SectionNames {
		container: "Subjects",
		alternative: "Subject",
		any: "AnySubject",
		matcher: "SubjectMatch",
		designator: "SubjectAttributeDesignator",
		category: Category::Subject,
	},
	SectionNames {
		container: "Resources",
		alternative: "Resource",
		any: "AnyResource",
		matcher: "ResourceMatch",
		designator: "ResourceAttributeDesignator",
		category: Category::Resource,
	},
	SectionNames {
		container: "Actions",
		alternative: "Action",
		any: "AnyAction",
		matcher: "ActionMatch",
		designator: "ActionAttributeDesignator",
		category: Category::Action,
	},
	SectionNames {
		container: "Environments",
		alternative: "Environment",
		any: "AnyEnvironment",
		matcher: "EnvironmentMatch",
		designator: "EnvironmentAttributeDesignator",
		category: Category::Environment,
	},
];

fn designator_category(element_name: &str) -> Option<Category> {
	SECTIONS
		.iter()
		.find(|s| s.designator == element_name)
		.map(|s| s.category)
}

fn check_supported(element: &Element) -> Result<(), PolicyParseError> {
	if UNSUPPORTED.contains(&element.name.as_str()) {
		return Err(PolicyParseError::UnsupportedElement(element.name.clone()));
	}
	Ok(())
}

fn description(element: &Element) -> Option<String> {
	element
		.child("Description")
		.map(|d| d.text.clone())
		.filter(|t| !t.is_empty())
}

impl<'a> PolicyParser<'a> {
	pub fn new(algorithms: &'a CombiningAlgorithms) -> Self {
		Self { algorithms }
	}

	pub fn parse(&self, bytes: &[u8]) -> Result<PolicyTree, PolicyParseError> {
		let root = parse_document(bytes)?;
		match root.name.as_str() {
			"Policy" => Ok(PolicyTree::Policy(self.policy(&root)?)),
			"PolicySet" => Ok(PolicyTree::PolicySet(self.policy_set(&root)?)),
			_ => Err(PolicyParseError::UnexpectedRoot(root.name)),
		}
	}

	fn policy_set(&self, element: &Element) -> Result<PolicySet, PolicyParseError> {
		let id = element.required_attribute("PolicySetId")?.to_string();
		let policy_combining = self
			.algorithms
			.policy_algorithm(element.required_attribute("PolicyCombiningAlgId")?)?;

		let mut target = Target::any();
		let mut children = Vec::new();
		for child in &element.children {
			check_supported(child)?;
			match child.name.as_str() {
				"Description" => {}
				"Target" => target = self.target(child)?,
				"Policy" => children.push(Arc::new(PolicyTree::Policy(self.policy(child)?))),
				"PolicySet" => {
					children.push(Arc::new(PolicyTree::PolicySet(self.policy_set(child)?)))
				}
				name if IGNORED.contains(&name) => {
					tracing::debug!(policy_set_id = %id, element = %name, "ignoring element");
				}
				other => return Err(PolicyParseError::UnsupportedElement(other.to_string())),
			}
		}

		Ok(PolicySet {
			id,
			description: description(element),
			target,
			policy_combining,
			children,
		})
	}

	fn policy(&self, element: &Element) -> Result<Policy, PolicyParseError> {
		let id = element.required_attribute("PolicyId")?.to_string();
		let rule_combining = self
			.algorithms
			.rule_algorithm(element.required_attribute("RuleCombiningAlgId")?)?;

		let mut target = Target::any();
		let mut rules = Vec::new();
		for child in &element.children {
			check_supported(child)?;
			match child.name.as_str() {
				"Description" => {}
				"Target" => target = self.target(child)?,
				"Rule" => rules.push(self.rule(child)?),
				name if IGNORED.contains(&name) => {
					tracing::debug!(policy_id = %id, element = %name, "ignoring element");
				}
				other => return Err(PolicyParseError::UnsupportedElement(other.to_string())),
			}
		}

		Ok(Policy {
			id,
			description: description(element),
			target,
			rule_combining,
			rules,
		})
	}

	fn rule(&self, element: &Element) -> Result<Rule, PolicyParseError> {
		let id = element.required_attribute("RuleId")?.to_string();
		let effect = Effect::parse(element.required_attribute("Effect")?)?;

		let mut target = Target::any();
		let mut condition = None;
		for child in &element.children {
			check_supported(child)?;
			match child.name.as_str() {
				"Description" => {}
				"Target" => target = self.target(child)?,
				"Condition" => condition = Some(self.condition(child)?),
				other => return Err(PolicyParseError::UnsupportedElement(other.to_string())),
			}
		}

		Ok(Rule {
			id,
			effect,
			description: description(element),
			target,
			condition,
		})
	}

	fn target(&self, element: &Element) -> Result<Target, PolicyParseError> {
		let mut target = Target::any();
		for child in &element.children {
			check_supported(child)?;
			let names = SECTIONS
				.iter()
				.find(|s| s.container == child.name)
				.ok_or_else(|| PolicyParseError::UnsupportedElement(child.name.clone()))?;
			let section = self.section(child, names)?;
			match names.category {
				Category::Subject => target.subjects = section,
				Category::Resource => target.resources = section,
				Category::Action => target.actions = section,
				Category::Environment => target.environments = section,
			}
		}
		Ok(target)
	}

	fn section(
		&self,
		element: &Element,
		names: &SectionNames,
	) -> Result<TargetSection, PolicyParseError> {
		let mut section = TargetSection::any();
		for alternative in &element.children {
			if alternative.name == names.any {
				return Ok(TargetSection::any());
			}
			if alternative.name != names.alternative {
				return Err(PolicyParseError::UnsupportedElement(alternative.name.clone()));
			}
			let matches = alternative
				.children
				.iter()
				.map(|m| {
					if m.name != names.matcher {
						return Err(PolicyParseError::UnsupportedElement(m.name.clone()));
					}
					self.target_match(m)
				})
				.collect::<Result<Vec<_>, _>>()?;
			section.alternatives.push(matches);
		}
		Ok(section)
	}

	fn target_match(&self, element: &Element) -> Result<TargetMatch, PolicyParseError> {
		let function = Function::from_urn(element.required_attribute("MatchId")?)?;
		if !function.is_match_function() {
			return Err(PolicyParseError::Structure(format!(
				"{} cannot be used in <{}>",
				element.required_attribute("MatchId")?,
				element.name
			)));
		}

		let mut value = None;
		let mut designator = None;
		for child in &element.children {
			check_supported(child)?;
			match child.name.as_str() {
				"AttributeValue" => value = Some(attribute_value(child)?),
				name => match designator_category(name) {
					Some(category) => designator = Some(attribute_designator(child, category)?),
					None => return Err(PolicyParseError::UnsupportedElement(name.to_string())),
				},
			}
		}

		match (value, designator) {
			(Some(value), Some(designator)) => TargetMatch::new(function, value, designator),
			_ => Err(PolicyParseError::Structure(format!(
				"<{}> needs an AttributeValue and an attribute designator",
				element.name
			))),
		}
	}

	/// XACML 2.0 wraps one expression; XACML 1.0 puts the function on the
	/// `Condition` element itself.
	fn condition(&self, element: &Element) -> Result<Expression, PolicyParseError> {
		if element.attribute("FunctionId").is_some() {
			return self.apply(element);
		}
		let mut expressions = element
			.children
			.iter()
			.filter(|c| c.name != "Description");
		match (expressions.next(), expressions.next()) {
			(Some(expr), None) => self.expression(expr),
			_ => Err(PolicyParseError::Structure(
				"<Condition> must contain exactly one expression".into(),
			)),
		}
	}

	fn apply(&self, element: &Element) -> Result<Expression, PolicyParseError> {
		let function = Function::from_urn(element.required_attribute("FunctionId")?)?;
		let mut args = element
			.children
			.iter()
			.filter(|c| c.name != "Description")
			.map(|c| self.expression(c))
			.collect::<Result<Vec<_>, _>>()?;

		if let Some(arity) = function.arity() {
			if args.len() != arity {
				return Err(PolicyParseError::Structure(format!(
					"{function:?} takes {arity} argument(s), got {}",
					args.len()
				)));
			}
		}
		if function == Function::RegexpMatch {
			let compiled = match args.first() {
				Some(Expression::Literal(literal)) => Pattern::compile(literal)?,
				_ => None,
			};
			if let Some(pattern) = compiled {
				args[0] = Expression::Pattern(pattern);
			}
		}

		Ok(Expression::Apply { function, args })
	}

	fn expression(&self, element: &Element) -> Result<Expression, PolicyParseError> {
		check_supported(element)?;
		match element.name.as_str() {
			"AttributeValue" => Ok(Expression::Literal(attribute_value(element)?)),
			"Apply" => self.apply(element),
			name => match designator_category(name) {
				Some(category) => Ok(Expression::Designator(attribute_designator(element, category)?)),
				None => Err(PolicyParseError::UnsupportedElement(name.to_string())),
			},
		}
	}
}

fn data_type(element: &Element) -> Result<DataType, PolicyParseError> {
	match element.attribute("DataType") {
		Some(uri) => {
			DataType::from_uri(uri).ok_or_else(|| PolicyParseError::UnknownDataType(uri.to_string()))
		}
		None => Ok(DataType::String),
	}
}

fn attribute_value(element: &Element) -> Result<AttributeValue, PolicyParseError> {
	AttributeValue::parse(data_type(element)?, &element.text)
}

fn attribute_designator(
	element: &Element,
	category: Category,
) -> Result<AttributeDesignator, PolicyParseError> {
	let mut designator = AttributeDesignator::new(category, element.required_attribute("AttributeId")?)
		.with_data_type(data_type(element)?);
	if let Some(issuer) = element.attribute("Issuer") {
		designator = designator.with_issuer(issuer);
	}
	if element.attribute("MustBePresent") == Some("true") {
		designator = designator.required();
	}
	Ok(designator)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::attribute::ids;
	use crate::decision::Decision;
	use crate::finder::AttributeFinderChain;
	use crate::request::RequestCtx;
	use crate::context::EvaluationCtx;

	const OWNER_POLICY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Policy xmlns="urn:oasis:names:tc:xacml:2.0:policy:schema:os"
        PolicyId="deny-purge-unless-owner"
        RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable">
  <Description>Only the owner may purge an object</Description>
  <Target>
    <Actions>
      <Action>
        <ActionMatch MatchId="urn:oasis:names:tc:xacml:1.0:function:string-equal">
          <AttributeValue DataType="http://www.w3.org/2001/XMLSchema#string">purge</AttributeValue>
          <ActionAttributeDesignator AttributeId="urn:oasis:names:tc:xacml:1.0:action:action-id"
                                     DataType="http://www.w3.org/2001/XMLSchema#string"/>
        </ActionMatch>
      </Action>
    </Actions>
  </Target>
  <Rule RuleId="owner-may-purge" Effect="Permit">
    <Condition>
      <Apply FunctionId="urn:oasis:names:tc:xacml:1.0:function:string-is-in">
        <Apply FunctionId="urn:oasis:names:tc:xacml:1.0:function:string-one-and-only">
          <SubjectAttributeDesignator AttributeId="urn:oasis:names:tc:xacml:1.0:subject:subject-id"
                                      DataType="http://www.w3.org/2001/XMLSchema#string"
                                      MustBePresent="true"/>
        </Apply>
        <ResourceAttributeDesignator AttributeId="urn:test:owner"
                                     DataType="http://www.w3.org/2001/XMLSchema#string"/>
      </Apply>
    </Condition>
  </Rule>
  <Rule RuleId="otherwise-deny" Effect="Deny"/>
  <Obligations>
    <Obligation ObligationId="urn:test:audit" FulfillOn="Deny"/>
  </Obligations>
</Policy>"#;

	fn parse(doc: &str) -> Result<PolicyTree, PolicyParseError> {
		parse_policy(doc.as_bytes(), &CombiningAlgorithms::standard())
	}

	fn decide(tree: &PolicyTree, subject: &str, action: &str, owner: &str) -> Decision {
		let request = RequestCtx::builder()
			.subject_string(ids::SUBJECT_ID, subject)
			.resource_string("urn:test:owner", owner)
			.action_string(ids::ACTION_ID, action)
			.build();
		let chain = AttributeFinderChain::empty();
		let ctx = EvaluationCtx::new(&request, &(), &chain);
		tree.evaluate(&ctx).decision
	}

	mod documents {
		use super::*;

		#[test]
		fn parses_and_evaluates_policy() {
			let tree = parse(OWNER_POLICY).unwrap();
			assert_eq!(tree.id(), "deny-purge-unless-owner");
			let PolicyTree::Policy(policy) = &tree else {
				panic!("expected a policy");
			};
			assert_eq!(policy.rules.len(), 2);
			assert_eq!(
				policy.description.as_deref(),
				Some("Only the owner may purge an object")
			);

			assert_eq!(decide(&tree, "alice", "purge", "alice"), Decision::Permit);
			assert_eq!(decide(&tree, "bob", "purge", "alice"), Decision::Deny);
			assert_eq!(decide(&tree, "alice", "read", "alice"), Decision::NotApplicable);
		}

		#[test]
		fn parses_nested_policy_sets() {
			let doc = r#"<PolicySet PolicySetId="root"
				PolicyCombiningAlgId="urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:only-one-applicable">
				<Target/>
				<PolicySet PolicySetId="inner"
					PolicyCombiningAlgId="urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:deny-overrides">
					<Policy PolicyId="leaf"
						RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:permit-overrides">
						<Rule RuleId="r" Effect="Permit"/>
					</Policy>
				</PolicySet>
			</PolicySet>"#;
			let tree = parse(doc).unwrap();
			let set = tree.as_policy_set().unwrap();
			assert_eq!(set.child_ids(), vec!["inner"]);
			assert_eq!(decide(&tree, "x", "y", "z"), Decision::Permit);
		}

		#[test]
		fn any_subject_is_a_wildcard() {
			let doc = r#"<Policy PolicyId="p"
				RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:deny-overrides">
				<Target><Subjects><AnySubject/></Subjects></Target>
				<Rule RuleId="r" Effect="Deny"/>
			</Policy>"#;
			let tree = parse(doc).unwrap();
			assert_eq!(decide(&tree, "x", "y", "z"), Decision::Deny);
		}

		#[test]
		fn accepts_xacml_1_0_condition_form() {
			let doc = r#"<Policy PolicyId="p"
				RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable">
				<Rule RuleId="r" Effect="Permit">
					<Condition FunctionId="urn:oasis:names:tc:xacml:1.0:function:string-equal">
						<AttributeValue DataType="http://www.w3.org/2001/XMLSchema#string">alice</AttributeValue>
						<Apply FunctionId="urn:oasis:names:tc:xacml:1.0:function:string-one-and-only">
							<SubjectAttributeDesignator AttributeId="urn:oasis:names:tc:xacml:1.0:subject:subject-id"
								DataType="http://www.w3.org/2001/XMLSchema#string"/>
						</Apply>
					</Condition>
				</Rule>
			</Policy>"#;
			let tree = parse(doc).unwrap();
			assert_eq!(decide(&tree, "alice", "read", "x"), Decision::Permit);
			assert_eq!(decide(&tree, "bob", "read", "x"), Decision::NotApplicable);
		}
	}

	mod rejections {
		use super::*;

		fn policy_with_rule_body(body: &str) -> String {
			format!(
				r#"<Policy PolicyId="p" RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable">
					<Rule RuleId="r" Effect="Permit">{body}</Rule>
				</Policy>"#
			)
		}

		#[test]
		fn rejects_references_and_selectors() {
			let doc = r#"<PolicySet PolicySetId="s"
				PolicyCombiningAlgId="urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:first-applicable">
				<PolicyIdReference>other</PolicyIdReference>
			</PolicySet>"#;
			assert_eq!(
				parse(doc).unwrap_err(),
				PolicyParseError::UnsupportedElement("PolicyIdReference".into())
			);

			let selector = policy_with_rule_body(
				r#"<Condition><Apply FunctionId="urn:oasis:names:tc:xacml:1.0:function:string-bag-size">
					<AttributeSelector RequestContextPath="//x"/></Apply></Condition>"#,
			);
			assert_eq!(
				parse(&selector).unwrap_err(),
				PolicyParseError::UnsupportedElement("AttributeSelector".into())
			);

			let variable = policy_with_rule_body(r#"<Condition><VariableReference VariableId="v"/></Condition>"#);
			assert!(matches!(
				parse(&variable),
				Err(PolicyParseError::UnsupportedElement(_))
			));
		}

		#[test]
		fn rejects_unknown_algorithms_and_functions() {
			let doc = r#"<Policy PolicyId="p" RuleCombiningAlgId="urn:example:majority"/>"#;
			assert!(matches!(
				parse(doc),
				Err(PolicyParseError::UnknownCombiningAlgorithm(_))
			));

			let doc = r#"<Policy PolicyId="p" RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:only-one-applicable"/>"#;
			assert!(matches!(
				parse(doc),
				Err(PolicyParseError::PolicyOnlyAlgorithm(_))
			));

			let unknown_fn = policy_with_rule_body(
				r#"<Condition><Apply FunctionId="urn:oasis:names:tc:xacml:1.0:function:string-concatenate"/></Condition>"#,
			);
			assert!(matches!(
				parse(&unknown_fn),
				Err(PolicyParseError::UnknownFunction(_))
			));
		}

		#[test]
		fn rejects_structural_problems() {
			assert!(matches!(
				parse("<Rule RuleId=\"r\" Effect=\"Permit\"/>"),
				Err(PolicyParseError::UnexpectedRoot(_))
			));
			assert!(matches!(
				parse("<Policy RuleCombiningAlgId=\"x\"/>"),
				Err(PolicyParseError::MissingAttribute { .. })
			));

			let bad_effect = r#"<Policy PolicyId="p" RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable">
				<Rule RuleId="r" Effect="Maybe"/></Policy>"#;
			assert!(matches!(parse(bad_effect), Err(PolicyParseError::InvalidEffect(_))));

			let wrong_arity = policy_with_rule_body(
				r#"<Condition><Apply FunctionId="urn:oasis:names:tc:xacml:1.0:function:not"/></Condition>"#,
			);
			assert!(matches!(parse(&wrong_arity), Err(PolicyParseError::Structure(_))));

			let bad_value = policy_with_rule_body(
				r#"<Condition><Apply FunctionId="urn:oasis:names:tc:xacml:1.0:function:integer-equal">
					<AttributeValue DataType="http://www.w3.org/2001/XMLSchema#integer">ten</AttributeValue>
					<AttributeValue DataType="http://www.w3.org/2001/XMLSchema#integer">10</AttributeValue>
				</Apply></Condition>"#,
			);
			assert!(matches!(parse(&bad_value), Err(PolicyParseError::InvalidValue { .. })));

			let bad_regex = policy_with_rule_body(
				r#"<Condition><Apply FunctionId="urn:oasis:names:tc:xacml:1.0:function:string-regexp-match">
					<AttributeValue DataType="http://www.w3.org/2001/XMLSchema#string">(</AttributeValue>
					<AttributeValue DataType="http://www.w3.org/2001/XMLSchema#string">x</AttributeValue>
				</Apply></Condition>"#,
			);
			assert!(matches!(parse(&bad_regex), Err(PolicyParseError::InvalidPattern { .. })));
		}

		#[test]
		fn regexp_patterns_are_compiled_once_at_parse_time() {
			let doc = r#"<Policy PolicyId="p" RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable">
				<Target><Resources><Resource>
					<ResourceMatch MatchId="urn:oasis:names:tc:xacml:1.0:function:string-regexp-match">
						<AttributeValue>^demo:[0-9]+$</AttributeValue>
						<ResourceAttributeDesignator AttributeId="urn:test:owner"/>
					</ResourceMatch>
				</Resource></Resources></Target>
				<Rule RuleId="r" Effect="Permit">
					<Condition><Apply FunctionId="urn:oasis:names:tc:xacml:1.0:function:string-regexp-match">
						<AttributeValue>^al</AttributeValue>
						<Apply FunctionId="urn:oasis:names:tc:xacml:1.0:function:string-one-and-only">
							<SubjectAttributeDesignator AttributeId="urn:oasis:names:tc:xacml:1.0:subject:subject-id"/>
						</Apply>
					</Apply></Condition>
				</Rule>
			</Policy>"#;
			let tree = parse(doc).unwrap();
			let PolicyTree::Policy(policy) = &tree else {
				panic!("expected a policy");
			};

			let target_match = &policy.target.resources.alternatives[0][0];
			assert_eq!(
				target_match.pattern.as_ref().map(Pattern::as_str),
				Some("^demo:[0-9]+$")
			);
			let Some(Expression::Apply { args, .. }) = &policy.rules[0].condition else {
				panic!("expected an Apply condition");
			};
			assert!(matches!(&args[0], Expression::Pattern(p) if p.as_str() == "^al"));

			assert_eq!(decide(&tree, "alice", "read", "demo:12"), Decision::Permit);
			assert_eq!(decide(&tree, "bob", "read", "demo:12"), Decision::NotApplicable);
			assert_eq!(decide(&tree, "alice", "read", "other:1"), Decision::NotApplicable);
		}

		#[test]
		fn invalid_target_pattern_is_rejected() {
			let doc = r#"<Policy PolicyId="p" RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable">
				<Target><Subjects><Subject>
					<SubjectMatch MatchId="urn:oasis:names:tc:xacml:1.0:function:string-regexp-match">
						<AttributeValue>(</AttributeValue>
						<SubjectAttributeDesignator AttributeId="urn:oasis:names:tc:xacml:1.0:subject:subject-id"/>
					</SubjectMatch>
				</Subject></Subjects></Target>
			</Policy>"#;
			assert!(matches!(parse(doc), Err(PolicyParseError::InvalidPattern { .. })));
		}

		#[test]
		fn match_elements_need_value_and_designator() {
			let doc = r#"<Policy PolicyId="p" RuleCombiningAlgId="urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable">
				<Target><Subjects><Subject>
					<SubjectMatch MatchId="urn:oasis:names:tc:xacml:1.0:function:string-equal">
						<AttributeValue>alice</AttributeValue>
					</SubjectMatch>
				</Subject></Subjects></Target>
			</Policy>"#;
			assert!(matches!(parse(doc), Err(PolicyParseError::Structure(_))));
		}
	}
}
