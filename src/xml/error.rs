// XML tree construction errors
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

//! Errors produced while constructing an element tree.
//!
//! Every variant carries the byte offset into the source document at
//!   which the problem was detected,
//!     so that callers may translate it into a line and column for
//!     display.

use std::{fmt::Display, str::Utf8Error};

/// Byte offset into the source document.
pub type Offset = usize;

/// Line and column of an [`Offset`],
///   both starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    /// Column in characters,
    ///   not bytes.
    pub column: usize,
}

impl Location {
    /// Locate the byte offset `at` within `text`.
    ///
    /// An offset past the end of `text` is taken to be its end,
    ///   and an offset within a multibyte character to be the start of
    ///   that character.
    pub fn of(text: &str, at: Offset) -> Self {
        let mut end = at.min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }

        let before = &text[..end];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);

        Self {
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Error attempting to construct an element tree from XML text.
#[derive(Debug)]
pub enum Error {
    /// The underlying tokenizer rejected the input.
    ///
    /// quick-xml does not expose enough context to map its errors onto
    ///   anything more specific,
    ///     so they are passed through as-is.
    QuickXml(quick_xml::Error, Offset),

    /// A UTF-8 error together with the byte slice that caused it.
    ///
    /// By storing the raw bytes instead of a string,
    ///   we allow the displayer to determine how to handle invalid UTF-8
    ///   encodings.
    InvalidUtf8(Utf8Error, Vec<u8>, Offset),

    /// A closing tag does not match the element it closes.
    ///
    /// The first string is the name of the open element,
    ///   the second the name found on the closing tag.
    UnbalancedTag(String, String, Offset),

    /// A closing tag was found with no element open.
    UnexpectedClose(String, Offset),

    /// The document ended with the named element still open.
    UnclosedElement(String, Offset),

    /// A second root element was found after the first was closed.
    MultipleRoots(String, Offset),

    /// Non-whitespace text appeared outside of the root element.
    TextOutsideRoot(String, Offset),

    /// The document contains no elements at all.
    EmptyDocument,
}

impl Error {
    /// Byte offset at which the error was detected,
    ///   if any.
    pub fn offset(&self) -> Option<Offset> {
        match self {
            Self::QuickXml(_, at)
            | Self::InvalidUtf8(_, _, at)
            | Self::UnbalancedTag(_, _, at)
            | Self::UnexpectedClose(_, at)
            | Self::UnclosedElement(_, at)
            | Self::MultipleRoots(_, at)
            | Self::TextOutsideRoot(_, at) => Some(*at),
            Self::EmptyDocument => None,
        }
    }

    /// Produce a closure that wraps a quick-xml error at the given
    ///   offset.
    ///
    /// This is intended for use with [`Result::map_err`].
    pub(super) fn from_quick_xml_at<E: Into<quick_xml::Error>>(
        at: Offset,
    ) -> impl FnOnce(E) -> Self {
        move |e| Self::QuickXml(e.into(), at)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuickXml(inner, at) => {
                write!(f, "{inner} at byte {at}")
            }
            Self::InvalidUtf8(inner, bytes, at) => {
                write!(
                    f,
                    "{inner} for string `{}` at byte {at}",
                    String::from_utf8_lossy(bytes)
                )
            }
            Self::UnbalancedTag(open, close, at) => {
                write!(
                    f,
                    "closing tag `</{close}>` at byte {at} \
                       does not match open element `<{open}>`"
                )
            }
            Self::UnexpectedClose(close, at) => {
                write!(
                    f,
                    "closing tag `</{close}>` at byte {at} \
                       has no matching open element"
                )
            }
            Self::UnclosedElement(open, at) => {
                write!(
                    f,
                    "document ended at byte {at} \
                       with element `<{open}>` still open"
                )
            }
            Self::MultipleRoots(name, at) => {
                write!(
                    f,
                    "unexpected second root element `<{name}>` at byte {at}"
                )
            }
            Self::TextOutsideRoot(text, at) => {
                write!(
                    f,
                    "unexpected text `{}` outside of root element \
                       at byte {at}",
                    text.trim()
                )
            }
            Self::EmptyDocument => {
                write!(f, "document contains no elements")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::QuickXml(err, ..) => Some(err),
            Self::InvalidUtf8(err, ..) => Some(err),
            _ => None,
        }
    }
}
