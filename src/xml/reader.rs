// XML tree reader
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

//! Parse XML text into an [`Element`] tree.
//!
//! This uses [`quick_xml`] as the tokenizer.
//! quick-xml is a pull parser that does not itself maintain a tree or
//!   check that tags are balanced
//!     (we disable its own name check),
//!   so both of those responsibilities are handled here by a stack of
//!   open elements.

use super::{
    Attr, DefaultEscaper, Element, Error, Escaper, Node, Offset, Result,
    TreeBuilder,
};
use quick_xml::events::{BytesStart, Event as QuickXmlEvent};
use std::marker::PhantomData;

/// Construct an element tree using [`quick_xml`].
///
/// Text and attribute values are unescaped using `S`;
///   CDATA is taken verbatim.
#[derive(Debug, Clone, Copy)]
pub struct QuickXmlTreeBuilder<S: Escaper = DefaultEscaper> {
    _escaper: PhantomData<S>,
}

impl<S: Escaper> Default for QuickXmlTreeBuilder<S> {
    fn default() -> Self {
        Self {
            _escaper: PhantomData,
        }
    }
}

impl<S: Escaper> TreeBuilder for QuickXmlTreeBuilder<S> {
    fn build(&self, text: &str) -> Result<Element> {
        let mut reader = quick_xml::Reader::from_str(text);

        // Whitespace is significant within payloads.
        reader.trim_text(false);

        // Mismatched tags are detected by `Stack` so that they are
        //   reported with the names of both tags.
        reader.check_end_names(false);

        let mut stack = Stack::default();

        loop {
            let pos = reader.buffer_position();

            let ev = reader
                .read_event()
                .map_err(Error::from_quick_xml_at(pos))?;

            match ev {
                QuickXmlEvent::Eof => break,

                QuickXmlEvent::Start(ele) => {
                    stack.open(Self::parse_element_open(&ele, pos)?, pos)?
                }

                QuickXmlEvent::Empty(ele) => {
                    stack.attach(Self::parse_element_open(&ele, pos)?, pos)?
                }

                QuickXmlEvent::End(ele) => {
                    let qname = ele.name();
                    stack.close(utf8(qname.as_ref(), pos)?, pos)?
                }

                // quick-xml may emit empty text between adjacent markup.
                QuickXmlEvent::Text(bytes) if bytes.is_empty() => (),

                QuickXmlEvent::Text(bytes) => {
                    let raw = utf8(&bytes, pos)?;
                    let unesc = S::unescape(raw)
                        .map_err(Error::from_quick_xml_at(pos))?;

                    stack.text(Node::Text(unesc.into_owned()), pos)?
                }

                // CDATA is never escaped.
                QuickXmlEvent::CData(bytes) => {
                    let data = utf8(&bytes, pos)?;
                    stack.text(Node::CData(data.to_owned()), pos)?
                }

                // None of these carry information the tree exposes.
                QuickXmlEvent::Comment(..)
                | QuickXmlEvent::Decl(..)
                | QuickXmlEvent::PI(..)
                | QuickXmlEvent::DocType(..) => (),
            }
        }

        stack.finish(text.len())
    }
}

impl<S: Escaper> QuickXmlTreeBuilder<S> {
    /// Parse an opening (or empty) tag and its attributes into an
    ///   [`Element`] with no children.
    ///
    /// The order of attributes is maintained.
    /// Duplicate attributes are rejected by quick-xml's attribute checks.
    fn parse_element_open(ele: &BytesStart, pos: Offset) -> Result<Element> {
        let mut element = Element::new(utf8(ele.name().as_ref(), pos)?);

        for result in ele.attributes() {
            let attr = result.map_err(Error::from_quick_xml_at(pos))?;

            let name = utf8(attr.key.as_ref(), pos)?;
            let value = S::unescape(utf8(&attr.value, pos)?)
                .map_err(Error::from_quick_xml_at(pos))?;

            element.push_attr(Attr::new(name, value.into_owned()));
        }

        Ok(element)
    }
}

fn utf8(bytes: &[u8], at: Offset) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| Error::InvalidUtf8(e, bytes.to_owned(), at))
}

/// Stack of open elements.
///
/// Elements are moved into their parent when closed;
///   the first element closed with an empty stack becomes the root.
#[derive(Debug, Default)]
struct Stack {
    open: Vec<Element>,
    root: Option<Element>,
}

impl Stack {
    fn open(&mut self, ele: Element, at: Offset) -> Result<()> {
        if self.open.is_empty() && self.root.is_some() {
            return Err(Error::MultipleRoots(ele.name().to_owned(), at));
        }

        self.open.push(ele);
        Ok(())
    }

    fn close(&mut self, name: &str, at: Offset) -> Result<()> {
        match self.open.pop() {
            None => Err(Error::UnexpectedClose(name.to_owned(), at)),

            Some(ele) if ele.name() != name => Err(Error::UnbalancedTag(
                ele.name().to_owned(),
                name.to_owned(),
                at,
            )),

            Some(ele) => self.attach(ele, at),
        }
    }

    /// Attach a complete element to the innermost open element,
    ///   or make it the root.
    fn attach(&mut self, ele: Element, at: Offset) -> Result<()> {
        if let Some(parent) = self.open.last_mut() {
            parent.push_child(Node::Element(ele));
            return Ok(());
        }

        if self.root.is_some() {
            return Err(Error::MultipleRoots(ele.name().to_owned(), at));
        }

        self.root = Some(ele);
        Ok(())
    }

    /// Attach a text or CDATA node to the innermost open element.
    ///
    /// Whitespace outside of the root element
    ///   (e.g. between the prolog and the root)
    ///   is discarded;
    ///     anything else there is an error.
    fn text(&mut self, node: Node, at: Offset) -> Result<()> {
        if let Some(parent) = self.open.last_mut() {
            parent.push_child(node);
            return Ok(());
        }

        match node {
            Node::Text(text) if text.trim().is_empty() => Ok(()),
            Node::Text(text) | Node::CData(text) => {
                Err(Error::TextOutsideRoot(text, at))
            }
            Node::Element(ele) => self.attach(ele, at),
        }
    }

    fn finish(mut self, eof: Offset) -> Result<Element> {
        if let Some(ele) = self.open.pop() {
            return Err(Error::UnclosedElement(ele.name().to_owned(), eof));
        }

        self.root.ok_or(Error::EmptyDocument)
    }
}
