// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! A minimal element tree built from quick-xml events.
//!
//! Names are stored without namespace prefixes; namespace declarations are
//! dropped. Text is trimmed and concatenated per element.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::PolicyParseError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
	pub name: String,
	pub attributes: Vec<(String, String)>,
	pub children: Vec<Element>,
	pub text: String,
}

impl Element {
	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|(k, _)| k == name)
			.map(|(_, v)| v.as_str())
	}

	pub fn required_attribute(&self, name: &str) -> Result<&str, PolicyParseError> {
		self.attribute(name)
			.ok_or_else(|| PolicyParseError::MissingAttribute {
				element: self.name.clone(),
				attribute: name.to_string(),
			})
	}

	pub fn child(&self, name: &str) -> Option<&Element> {
		self.children.iter().find(|c| c.name == name)
	}

	pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
		self.children.iter().filter(move |c| c.name == name)
	}
}

fn xml_err(e: impl std::fmt::Display) -> PolicyParseError {
	PolicyParseError::Xml(e.to_string())
}

fn utf8(bytes: &[u8]) -> Result<String, PolicyParseError> {
	std::str::from_utf8(bytes)
		.map(str::to_string)
		.map_err(xml_err)
}

fn open_element(e: &quick_xml::events::BytesStart<'_>) -> Result<Element, PolicyParseError> {
	let mut element = Element {
		name: utf8(e.local_name().as_ref())?,
		..Element::default()
	};
	for attr in e.attributes() {
		let attr = attr.map_err(xml_err)?;
		if attr.key.as_ref().starts_with(b"xmlns") {
			continue;
		}
		let key = utf8(attr.key.local_name().as_ref())?;
		let value = attr.unescape_value().map_err(xml_err)?.into_owned();
		element.attributes.push((key, value));
	}
	Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
	match stack.last_mut() {
		Some(parent) => parent.children.push(element),
		None => {
			if root.is_none() {
				*root = Some(element);
			}
		}
	}
}

/// Parses a whole document into its root element.
pub(crate) fn parse_document(bytes: &[u8]) -> Result<Element, PolicyParseError> {
	let text = std::str::from_utf8(bytes).map_err(xml_err)?;
	let mut reader = Reader::from_str(text);
	reader.config_mut().trim_text(true);

	let mut stack: Vec<Element> = Vec::new();
	let mut root: Option<Element> = None;

	loop {
		match reader.read_event().map_err(xml_err)? {
			Event::Start(e) => stack.push(open_element(&e)?),
			Event::Empty(e) => {
				let element = open_element(&e)?;
				attach(&mut stack, &mut root, element);
			}
			Event::End(_) => {
				let element = stack
					.pop()
					.ok_or_else(|| PolicyParseError::Xml("unbalanced end tag".into()))?;
				attach(&mut stack, &mut root, element);
			}
			Event::Text(t) => {
				if let Some(current) = stack.last_mut() {
					current.text.push_str(&t.unescape().map_err(xml_err)?);
				}
			}
			Event::CData(c) => {
				if let Some(current) = stack.last_mut() {
					current.text.push_str(&utf8(&c.into_inner())?);
				}
			}
			Event::Eof => break,
			_ => {}
		}
	}

	if !stack.is_empty() {
		return Err(PolicyParseError::Xml("unexpected end of document".into()));
	}
	root.ok_or_else(|| PolicyParseError::Xml("document has no root element".into()))
}
