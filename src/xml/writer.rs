// XML writer
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

//! Lower a [`Token`] stream into XML text via [`fmt::Write`].
//!
//! All values carried by tokens are _unescaped_;
//!   escaping is performed here,
//!     at the last possible moment,
//!     by an [`Escaper`].

use super::{cdata_sections, Escaper};
use std::fmt::{self, Write};
use std::result;

pub type Result<T = WriterState> = result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Fmt(fmt::Error),
    UnexpectedToken(String, WriterState),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fmt(e) => e.fmt(f),
            Self::UnexpectedToken(tok, state) => write!(
                f,
                "invalid token {} at XML writer state {:?}",
                tok, state
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fmt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<fmt::Error> for Error {
    fn from(e: fmt::Error) -> Self {
        Self::Fmt(e)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriterState {
    /// A node is expected to be output next.
    #[default]
    NodeExpected,
    /// An opening tag has been output and has not yet been closed with
    ///   `>` or `/>`.
    NodeOpen,
}

impl WriterState {
    #[inline]
    fn close_tag_if_open<W: Write>(&self, sink: &mut W) -> Result<()> {
        if let Self::NodeOpen = *self {
            sink.write_char('>')?;
        }

        Ok(())
    }
}

/// A unit of XML output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// XML declaration `<?xml version=".." encoding=".." ?>`.
    Decl { version: &'a str, encoding: &'a str },
    /// Document type declaration referencing an external DTD.
    Doctype { root: &'a str, system: &'a str },
    /// Beginning of an opening tag.
    Open(&'a str),
    /// Attribute name and unescaped value within an opening tag.
    Attr(&'a str, &'a str),
    /// Closing tag,
    ///   or `/>` if no name is provided.
    Close(Option<&'a str>),
    /// Unescaped text.
    Text(&'a str),
    /// Character data,
    ///   written verbatim within one or more CDATA sections.
    CData(&'a str),
    /// Whitespace between nodes.
    Whitespace(&'a str),
}

/// Write an XML representation.
///
/// It uses a finite state machine (FSM),
///   where states are represented by [`WriterState`],
///   to avoid lookahead requirements:
///     whether an opening tag is terminated by `>` or `/>` is not known
///     until the token following its attributes is seen.
pub trait XmlWriter: Sized {
    /// Write XML representation into the provided sink.
    ///
    /// Each write operation takes a previous [`WriterState`],
    ///   and transitions to a new [`WriterState`] after performing the
    ///   write operation
    ///     (which may be the same as the previous state).
    /// This returned state must be provided to the next `write` operation
    ///   to produce valid output.
    #[must_use = "Write operation may fail"]
    fn write<W: Write, S: Escaper>(
        self,
        sink: &mut W,
        prev_state: WriterState,
    ) -> Result;

    /// Allocate a new string and write into it,
    ///   returning both the new string and the writer state.
    ///
    /// This is intended primarily for testing.
    fn write_new<S: Escaper>(
        self,
        prev_state: WriterState,
    ) -> Result<(String, WriterState)> {
        let mut buf = String::new();
        let state = self.write::<_, S>(&mut buf, prev_state)?;

        Ok((buf, state))
    }
}

impl<'a> XmlWriter for Token<'a> {
    fn write<W: Write, S: Escaper>(
        self,
        sink: &mut W,
        prev_state: WriterState,
    ) -> Result {
        type St = WriterState;

        match (self, prev_state) {
            (Self::Decl { version, encoding }, St::NodeExpected) => {
                write!(
                    sink,
                    r#"<?xml version="{}" encoding="{}" ?>"#,
                    S::escape(version),
                    S::escape(encoding),
                )?;

                Ok(St::NodeExpected)
            }

            (Self::Doctype { root, system }, St::NodeExpected) => {
                write!(
                    sink,
                    r#"<!DOCTYPE {} SYSTEM "{}">"#,
                    root,
                    S::escape(system),
                )?;

                Ok(St::NodeExpected)
            }

            (Self::Open(name), St::NodeExpected | St::NodeOpen) => {
                // If a node is still open, then we are a child.
                prev_state.close_tag_if_open(sink)?;
                sink.write_char('<')?;
                sink.write_str(name)?;

                Ok(St::NodeOpen)
            }

            (Self::Attr(name, value), St::NodeOpen) => {
                write!(sink, r#" {}="{}""#, name, S::escape(value))?;

                Ok(St::NodeOpen)
            }

            (Self::Close(None), St::NodeOpen) => {
                sink.write_str("/>")?;

                Ok(St::NodeExpected)
            }

            (Self::Close(Some(name)), St::NodeExpected | St::NodeOpen) => {
                // If open, we're going to produce an element of the form
                //   `<foo></foo>`.
                prev_state.close_tag_if_open(sink)?;
                write!(sink, "</{}>", name)?;

                Ok(St::NodeExpected)
            }

            (Self::Text(text), St::NodeExpected | St::NodeOpen) => {
                prev_state.close_tag_if_open(sink)?;
                sink.write_str(&S::escape(text))?;

                Ok(St::NodeExpected)
            }

            (Self::CData(data), St::NodeExpected | St::NodeOpen) => {
                prev_state.close_tag_if_open(sink)?;

                for section in cdata_sections(data) {
                    write!(sink, "<![CDATA[{}]]>", section)?;
                }

                Ok(St::NodeExpected)
            }

            (Self::Whitespace(ws), St::NodeExpected | St::NodeOpen) => {
                prev_state.close_tag_if_open(sink)?;
                sink.write_str(ws)?;

                Ok(St::NodeExpected)
            }

            // Everything else represents an invalid state transition that
            //   would produce invalid XML.
            (invalid, _) => Err(Error::UnexpectedToken(
                format!("{:?}", invalid),
                prev_state,
            )),
        }
    }
}

impl<'a, I: Iterator<Item = Token<'a>>> XmlWriter for I {
    fn write<W: Write, S: Escaper>(
        mut self,
        sink: &mut W,
        initial_state: WriterState,
    ) -> Result {
        self.try_fold(initial_state, |prev_state, tok| {
            tok.write::<_, S>(sink, prev_state)
        })
    }
}
