// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Condition expressions and the function library.

use std::cmp::Ordering;

use regex::Regex;

use crate::attribute::{AttributeBag, AttributeDesignator, AttributeValue, DataType};
use crate::context::EvaluationCtx;
use crate::decision::Status;
use crate::error::PolicyParseError;

const FUNCTION_PREFIXES: [&str; 2] = [
	"urn:oasis:names:tc:xacml:1.0:function:",
	"urn:oasis:names:tc:xacml:2.0:function:",
];

// dateTime must be tried before date.
const TYPE_PREFIXES: [DataType; 6] = [
	DataType::DateTime,
	DataType::Date,
	DataType::AnyUri,
	DataType::String,
	DataType::Boolean,
	DataType::Integer,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
	Equal(DataType),
	GreaterThan(DataType),
	GreaterThanOrEqual(DataType),
	LessThan(DataType),
	LessThanOrEqual(DataType),
	RegexpMatch,
	OneAndOnly(DataType),
	BagSize(DataType),
	IsIn(DataType),
	AtLeastOneMemberOf(DataType),
	Bag(DataType),
	And,
	Or,
	Not,
}

impl Function {
	/// Resolves a function URN such as
	/// `urn:oasis:names:tc:xacml:1.0:function:string-equal`.
	pub fn from_urn(urn: &str) -> Result<Self, PolicyParseError> {
		let unknown = || PolicyParseError::UnknownFunction(urn.to_string());
		let name = FUNCTION_PREFIXES
			.iter()
			.find_map(|prefix| urn.strip_prefix(prefix))
			.ok_or_else(unknown)?;

		match name {
			"and" => return Ok(Function::And),
			"or" => return Ok(Function::Or),
			"not" => return Ok(Function::Not),
			"string-regexp-match" => return Ok(Function::RegexpMatch),
			_ => {}
		}

		let (data_type, op) = TYPE_PREFIXES
			.iter()
			.find_map(|dt| {
				name.strip_prefix(dt.short_name())
					.and_then(|rest| rest.strip_prefix('-'))
					.map(|op| (*dt, op))
			})
			.ok_or_else(unknown)?;

		let function = match op {
			"equal" => Function::Equal(data_type),
			"one-and-only" => Function::OneAndOnly(data_type),
			"bag-size" => Function::BagSize(data_type),
			"is-in" => Function::IsIn(data_type),
			"at-least-one-member-of" => Function::AtLeastOneMemberOf(data_type),
			"bag" => Function::Bag(data_type),
			"greater-than" if data_type.is_ordered() => Function::GreaterThan(data_type),
			"greater-than-or-equal" if data_type.is_ordered() => {
				Function::GreaterThanOrEqual(data_type)
			}
			"less-than" if data_type.is_ordered() => Function::LessThan(data_type),
			"less-than-or-equal" if data_type.is_ordered() => Function::LessThanOrEqual(data_type),
			_ => return Err(unknown()),
		};
		Ok(function)
	}

	/// Exact argument count, where the function has one.
	pub fn arity(&self) -> Option<usize> {
		match self {
			Function::Equal(_)
			| Function::GreaterThan(_)
			| Function::GreaterThanOrEqual(_)
			| Function::LessThan(_)
			| Function::LessThanOrEqual(_)
			| Function::RegexpMatch
			| Function::IsIn(_)
			| Function::AtLeastOneMemberOf(_) => Some(2),
			Function::OneAndOnly(_) | Function::BagSize(_) | Function::Not => Some(1),
			Function::Bag(_) | Function::And | Function::Or => None,
		}
	}

	/// Whether the function can compare a literal with one attribute value in a target.
	pub fn is_match_function(&self) -> bool {
		matches!(
			self,
			Function::Equal(_)
				| Function::GreaterThan(_)
				| Function::GreaterThanOrEqual(_)
				| Function::LessThan(_)
				| Function::LessThanOrEqual(_)
				| Function::RegexpMatch
		)
	}

	/// Applies a match function to a literal and one attribute value.
	pub fn apply_match(&self, literal: &AttributeValue, value: &AttributeValue) -> Result<bool, Status> {
		match self {
			Function::Equal(dt) => equal(*dt, literal, value),
			Function::GreaterThan(_) => compare(literal, value).map(|o| o == Ordering::Greater),
			Function::GreaterThanOrEqual(_) => compare(literal, value).map(|o| o != Ordering::Less),
			Function::LessThan(_) => compare(literal, value).map(|o| o == Ordering::Less),
			Function::LessThanOrEqual(_) => compare(literal, value).map(|o| o != Ordering::Greater),
			Function::RegexpMatch => regexp_match(literal, value),
			other => Err(Status::processing_error(format!(
				"{other:?} cannot be used as a match function"
			))),
		}
	}
}

fn type_error(expected: &str, got: &AttributeValue) -> Status {
	Status::processing_error(format!(
		"expected {expected}, got {} value {got}",
		got.data_type()
	))
}

fn equal(data_type: DataType, a: &AttributeValue, b: &AttributeValue) -> Result<bool, Status> {
	let compatible = |v: &AttributeValue| {
		v.data_type() == data_type || (data_type.is_text() && v.data_type().is_text())
	};
	if !compatible(a) {
		return Err(type_error(data_type.short_name(), a));
	}
	if !compatible(b) {
		return Err(type_error(data_type.short_name(), b));
	}
	Ok(a.equivalent(b))
}

fn compare(a: &AttributeValue, b: &AttributeValue) -> Result<Ordering, Status> {
	a.compare(b).ok_or_else(|| {
		Status::processing_error(format!(
			"cannot order {} value {a} against {} value {b}",
			a.data_type(),
			b.data_type()
		))
	})
}

fn regexp_match(pattern: &AttributeValue, value: &AttributeValue) -> Result<bool, Status> {
	let pattern = pattern.as_text().ok_or_else(|| type_error("string pattern", pattern))?;
	let re = Regex::new(pattern)
		.map_err(|e| Status::syntax_error(format!("invalid pattern {pattern:?}: {e}")))?;
	Pattern(re).is_match(value)
}

/// A `string-regexp-match` pattern compiled when the policy is parsed.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
	/// Compiles a literal pattern. Non-text literals are left for evaluation
	/// to reject.
	pub fn compile(literal: &AttributeValue) -> Result<Option<Self>, PolicyParseError> {
		let Some(text) = literal.as_text() else {
			return Ok(None);
		};
		Regex::new(text)
			.map(|re| Some(Self(re)))
			.map_err(|e| PolicyParseError::InvalidPattern {
				pattern: text.to_string(),
				message: e.to_string(),
			})
	}

	pub fn as_str(&self) -> &str {
		self.0.as_str()
	}

	pub fn is_match(&self, value: &AttributeValue) -> Result<bool, Status> {
		let text = value.as_text().ok_or_else(|| type_error("string", value))?;
		Ok(self.0.is_match(text))
	}
}

impl PartialEq for Pattern {
	fn eq(&self, other: &Self) -> bool {
		self.as_str() == other.as_str()
	}
}

impl Eq for Pattern {}

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
	Single(AttributeValue),
	Bag(AttributeBag),
}

impl Value {
	fn single(self) -> Result<AttributeValue, Status> {
		match self {
			Value::Single(v) => Ok(v),
			Value::Bag(_) => Err(Status::processing_error("expected a single value, got a bag")),
		}
	}

	fn bag(self) -> Result<AttributeBag, Status> {
		match self {
			Value::Bag(b) => Ok(b),
			Value::Single(_) => Err(Status::processing_error("expected a bag, got a single value")),
		}
	}

	fn boolean(self) -> Result<bool, Status> {
		let value = self.single()?;
		value.as_bool().ok_or_else(|| type_error("boolean", &value))
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
	Literal(AttributeValue),
	Designator(AttributeDesignator),
	/// A literal regexp-match pattern, compiled.
	Pattern(Pattern),
	Apply { function: Function, args: Vec<Expression> },
}

impl Expression {
	pub fn evaluate(&self, ctx: &EvaluationCtx<'_>) -> Result<Value, Status> {
		match self {
			Expression::Literal(v) => Ok(Value::Single(v.clone())),
			Expression::Designator(d) => ctx.resolve(d).map(Value::Bag),
			Expression::Pattern(p) => Ok(Value::Single(AttributeValue::string(p.as_str()))),
			Expression::Apply { function, args } => apply(*function, args, ctx),
		}
	}

	/// Evaluates to a boolean, as a rule condition must.
	pub fn evaluate_condition(&self, ctx: &EvaluationCtx<'_>) -> Result<bool, Status> {
		self.evaluate(ctx)?.boolean()
	}
}

fn arg<'a>(args: &'a [Expression], index: usize) -> Result<&'a Expression, Status> {
	args.get(index)
		.ok_or_else(|| Status::syntax_error(format!("missing argument {index}")))
}

fn apply(function: Function, args: &[Expression], ctx: &EvaluationCtx<'_>) -> Result<Value, Status> {
	let bool_value = |b: bool| Ok(Value::Single(AttributeValue::Boolean(b)));

	match function {
		Function::And => {
			for a in args {
				if !a.evaluate(ctx)?.boolean()? {
					return bool_value(false);
				}
			}
			bool_value(true)
		}
		Function::Or => {
			for a in args {
				if a.evaluate(ctx)?.boolean()? {
					return bool_value(true);
				}
			}
			bool_value(false)
		}
		Function::Not => bool_value(!arg(args, 0)?.evaluate(ctx)?.boolean()?),
		Function::OneAndOnly(_) => {
			let bag = arg(args, 0)?.evaluate(ctx)?.bag()?;
			match bag.values() {
				[only] => Ok(Value::Single(only.clone())),
				values => Err(Status::processing_error(format!(
					"one-and-only applied to a bag of {} values",
					values.len()
				))),
			}
		}
		Function::BagSize(_) => {
			let bag = arg(args, 0)?.evaluate(ctx)?.bag()?;
			let size = i64::try_from(bag.len())
				.map_err(|_| Status::processing_error("bag too large"))?;
			Ok(Value::Single(AttributeValue::Integer(size)))
		}
		Function::IsIn(dt) => {
			let needle = arg(args, 0)?.evaluate(ctx)?.single()?;
			let bag = arg(args, 1)?.evaluate(ctx)?.bag()?;
			for v in &bag {
				if equal(dt, &needle, v)? {
					return bool_value(true);
				}
			}
			bool_value(false)
		}
		Function::AtLeastOneMemberOf(dt) => {
			let left = arg(args, 0)?.evaluate(ctx)?.bag()?;
			let right = arg(args, 1)?.evaluate(ctx)?.bag()?;
			for l in &left {
				for r in &right {
					if equal(dt, l, r)? {
						return bool_value(true);
					}
				}
			}
			bool_value(false)
		}
		Function::Bag(_) => {
			let mut bag = AttributeBag::empty();
			for a in args {
				bag.push(a.evaluate(ctx)?.single()?);
			}
			Ok(Value::Bag(bag))
		}
		Function::RegexpMatch => {
			let value = arg(args, 1)?.evaluate(ctx)?.single()?;
			match arg(args, 0)? {
				Expression::Pattern(pattern) => bool_value(pattern.is_match(&value)?),
				dynamic => {
					let pattern = dynamic.evaluate(ctx)?.single()?;
					bool_value(regexp_match(&pattern, &value)?)
				}
			}
		}
		binary => {
			let left = arg(args, 0)?.evaluate(ctx)?.single()?;
			let right = arg(args, 1)?.evaluate(ctx)?.single()?;
			bool_value(binary.apply_match(&left, &right)?)
		}
	}
}
