// XML element tree
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

//! Generic XML element tree and the abstraction used to construct it.
//!
//! This module serves as an abstraction layer atop of whatever XML library
//!   is used (e.g. `quick_xml`).
//! It is _not_ intended to be comprehensive,
//!   or even general-purpose---it
//!     exposes only what the scenario [decoder](crate::decode) needs:
//!
//!   - tag names;
//!   - attributes in document order;
//!   - child nodes discriminated as element, text, or CDATA; and
//!   - aggregate text content.
//!
//! Comments,
//!   processing instructions,
//!   and the document type declaration are discarded during
//!   construction.
//!
//! To construct a tree from text,
//!   see [`TreeBuilder`] and its default implementation
//!   [`QuickXmlTreeBuilder`].
//! To write XML,
//!   see [`writer`];
//!     [`latin1`] converts the result into the bytes of a Latin-1
//!     document.

mod error;
pub use error::{Error, Location, Offset};

mod escape;
pub use escape::{cdata_sections, DefaultEscaper, Escaper, QuickXmlEscaper};

pub mod latin1;
pub mod reader;
pub mod writer;

pub use reader::QuickXmlTreeBuilder;

use std::result;

pub type Result<T> = result::Result<T, Error>;

/// Capability to construct an element tree from XML text.
///
/// This is the seam at which XML tokenization is plugged into the
///   decoder;
///     any standards-conforming builder will do.
/// Implementations must report malformed input as an [`Error`] rather
///   than attempting recovery.
pub trait TreeBuilder {
    /// Construct the tree for `text`,
    ///   returning its root element.
    fn build(&self, text: &str) -> Result<Element>;
}

/// An unescaped attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

impl Attr {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A child node of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Unescaped text.
    Text(String),
    /// Contents of a CDATA section,
    ///   exactly as they appeared in the source.
    CData(String),
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<Attr>,
    children: Vec<Node>,
}

impl Element {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr<N: Into<String>, V: Into<String>>(
        mut self,
        name: N,
        value: V,
    ) -> Self {
        self.attrs.push(Attr::new(name, value));
        self
    }

    pub fn with_child(mut self, node: Node) -> Self {
        self.children.push(node);
        self
    }

    pub(crate) fn push_attr(&mut self, attr: Attr) {
        self.attrs.push(attr);
    }

    pub(crate) fn push_child(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Tag name as written in the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the tag name is `name`,
    ///   ignoring ASCII case.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Attributes in document order.
    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    /// Value of the first attribute named `name`,
    ///   if any.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Direct child elements in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(ele) => Some(ele),
            _ => None,
        })
    }

    pub fn has_child_elements(&self) -> bool {
        self.child_elements().next().is_some()
    }

    /// Contents of direct CDATA children in document order.
    pub fn cdata(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(|node| match node {
            Node::CData(data) => Some(data.as_str()),
            _ => None,
        })
    }

    /// Concatenation of all descendant text and CDATA in document order.
    pub fn text_content(&self) -> String {
        let mut dest = String::new();
        self.collect_text(&mut dest);
        dest
    }

    fn collect_text(&self, dest: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) | Node::CData(text) => dest.push_str(text),
                Node::Element(ele) => ele.collect_text(dest),
            }
        }
    }

    /// First element satisfying `pred`,
    ///   searching depth-first in document order and starting with
    ///   `self`.
    pub fn find<P>(&self, pred: P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool + Copy,
    {
        if pred(self) {
            Some(self)
        } else {
            self.find_descendant(pred)
        }
    }

    /// Like [`find`](Element::find),
    ///   but excluding `self`.
    pub fn find_descendant<P>(&self, pred: P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool + Copy,
    {
        self.child_elements().find_map(|child| child.find(pred))
    }
}
