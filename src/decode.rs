// Scenario decoder
//
//  Copyright (C) 2014-2023 Ryan Specialty Group, LLC.
//
//  This file is part of sippscn.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Decode scenario documents into a [`Scenario`].
//!
//! Decoding is a walk over an element tree produced by a
//!   [`TreeBuilder`];
//!     this module never sees raw XML.
//! Only direct children of the root `scenario` element are considered,
//!   and of those only step kinds and the statistics/reference markers;
//!     everything else is ignored so that documents using parts of the
//!     DTD that we do not model still decode.
//!
//! Decoding fails fast:
//!   there is no attempt at partial recovery from a malformed document.

use crate::scenario::{
    Action, Attrs, Scenario, Step, StepKind, UNNAMED_SCENARIO,
};
use crate::xml::{self, Element, QuickXmlTreeBuilder, TreeBuilder};
use std::fmt::Display;
use tracing::{debug, trace};

pub(crate) const TAG_SCENARIO: &str = "scenario";
pub(crate) const TAG_ACTION: &str = "action";
pub(crate) const TAG_RESPONSE_TIME_REPARTITION: &str =
    "ResponseTimeRepartition";
pub(crate) const TAG_CALL_LENGTH_REPARTITION: &str = "CallLengthRepartition";
pub(crate) const TAG_REFERENCE: &str = "Reference";

/// Error decoding a scenario document.
#[derive(Debug)]
pub enum Error {
    /// The document could not be parsed as XML.
    MalformedDocument(xml::Error),

    /// The document has no `scenario` element.
    MissingRoot,
}

impl Error {
    /// Byte offset into the document at which decoding failed,
    ///   if known.
    pub fn offset(&self) -> Option<xml::Offset> {
        match self {
            Self::MalformedDocument(e) => e.offset(),
            Self::MissingRoot => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedDocument(e) => {
                write!(f, "malformed scenario document: {e}")
            }
            Self::MissingRoot => {
                write!(f, "no <{TAG_SCENARIO}> element found in document")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedDocument(e) => Some(e),
            Self::MissingRoot => None,
        }
    }
}

impl From<xml::Error> for Error {
    fn from(e: xml::Error) -> Self {
        Self::MalformedDocument(e)
    }
}

/// Decode scenario documents using the tree builder `B`.
#[derive(Debug, Clone, Default)]
pub struct Decoder<B: TreeBuilder = QuickXmlTreeBuilder> {
    builder: B,
}

impl<B: TreeBuilder> Decoder<B> {
    pub fn new(builder: B) -> Self {
        Self { builder }
    }

    /// Decode `text` into a [`Scenario`].
    ///
    /// The root is the first element named `scenario`
    ///   (ignoring ASCII case)
    ///   found in a depth-first search of the document.
    pub fn decode(&self, text: &str) -> Result<Scenario, Error> {
        let doc = self.builder.build(text)?;

        let root = doc
            .find(|ele| ele.is_named(TAG_SCENARIO))
            .ok_or(Error::MissingRoot)?;

        let scenario = Self::decode_scenario(root);

        debug!(
            name = %scenario.name,
            steps = scenario.steps.len(),
            "decoded scenario"
        );

        Ok(scenario)
    }

    fn decode_scenario(root: &Element) -> Scenario {
        // An empty name is never written by the encoder,
        //   so it must decode the same as an absent one.
        let name = root
            .attr("name")
            .filter(|name| !name.is_empty())
            .unwrap_or(UNNAMED_SCENARIO);

        let mut scenario = Scenario::new(name);

        for child in root.child_elements() {
            let tag = child.name();

            if let Some(kind) = StepKind::from_tag(tag) {
                scenario.push_step(Self::decode_step(kind, child));
            } else if child.is_named(TAG_RESPONSE_TIME_REPARTITION) {
                scenario.response_time_repartition =
                    Some(child.attr("value").unwrap_or_default().to_owned());
            } else if child.is_named(TAG_CALL_LENGTH_REPARTITION) {
                scenario.call_length_repartition =
                    Some(child.attr("value").unwrap_or_default().to_owned());
            } else if child.is_named(TAG_REFERENCE) {
                scenario.references.push(
                    child.attr("variables").unwrap_or_default().to_owned(),
                );
            } else {
                trace!(tag, "ignoring unmodelled scenario child");
            }
        }

        scenario
    }

    fn decode_step(kind: StepKind, ele: &Element) -> Step {
        let actions = if kind.carries_actions() {
            Self::decode_actions(ele)
        } else {
            Vec::new()
        };

        Step {
            kind,
            attrs: decode_attrs(ele),
            payload: Self::decode_payload(ele),
            actions,
        }
    }

    /// Literal content of a step.
    ///
    /// CDATA is authoritative whenever present,
    ///   regardless of any surrounding text or child elements.
    /// Otherwise plain text is used only if the element has no child
    ///   elements,
    ///     since text of an element holding only an `<action>` block is
    ///     merely indentation.
    fn decode_payload(ele: &Element) -> Option<String> {
        let mut cdata = ele.cdata().peekable();

        if cdata.peek().is_some() {
            return Some(cdata.collect());
        }

        if ele.has_child_elements() {
            return None;
        }

        let text = ele.text_content();
        (!text.trim().is_empty()).then_some(text)
    }

    /// Actions held by the first `<action>` block found beneath `ele`.
    fn decode_actions(ele: &Element) -> Vec<Action> {
        ele.find_descendant(|e| e.is_named(TAG_ACTION))
            .map(|block| {
                block
                    .child_elements()
                    .map(|child| Action {
                        kind: child.name().to_ascii_lowercase(),
                        attrs: decode_attrs(child),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// All attributes of `ele`,
///   unfiltered and in document order.
fn decode_attrs(ele: &Element) -> Attrs {
    ele.attrs()
        .iter()
        .map(|attr| (attr.name.as_str(), attr.value.as_str()))
        .collect()
}

/// Decode `text` using the default [`Decoder`].
pub fn decode(text: &str) -> Result<Scenario, Error> {
    Decoder::<QuickXmlTreeBuilder>::default().decode(text)
}

#[cfg(test)]
mod test;
