// XML string escaping and unescaping
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

//! Escaping and unescaping for writers and readers respectively.
//!
//! An [`Escaper`] is required by the tree builder and the writer.
//!
//! Safety
//! ======
//! The purpose of this module is to provide safety against XML injection
//!   by encapsulating all responsibility within a single place.
//! The idea is simple:
//!   a string held by the element tree or the scenario model _always_
//!   represents an unescaped value.
//! This prevents, primarily,
//!
//!  1. XML injection (via lack of escaping); and
//!  2. Erroneous multiple escape/unescape.
//!
//! Character data is handled separately by [`cdata_sections`],
//!   since CDATA has no escape mechanism of its own and must instead be
//!   split around its terminator.

use memchr::memmem;
use std::borrow::Cow;

/// Terminator of a CDATA section.
const CDATA_END: &str = "]]>";

/// Escaper and unescaper.
///
/// Escapers are responsible for parsing XML escape sequences as necessary
///   on read,
///     and properly escaping characters on write.
/// This is the only part of the system defending the output against XML
///   injection.
pub trait Escaper: Default {
    /// Escape a value such that it becomes suitable for writing into an
    ///   XML document as text or as a quoted attribute value.
    ///
    /// This value must be escaped such that subsequent unescaping
    ///   (using [`unescape`](Escaper::unescape))
    ///   will result in the same value.
    fn escape(value: &str) -> Cow<str>;

    /// Unescape a value such that any relevant escape sequences are
    ///   parsed into their text representation.
    fn unescape(value: &str) -> Result<Cow<str>, quick_xml::Error>;
}

/// Escape and unescape using [`quick_xml`].
///
/// Escaping uses the full five-entity table
///   (`&`, `<`, `>`, `"`, `'`)
///   for both element text and attribute values.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickXmlEscaper {}

impl Escaper for QuickXmlEscaper {
    #[inline]
    fn escape(value: &str) -> Cow<str> {
        quick_xml::escape::escape(value)
    }

    #[inline]
    fn unescape(value: &str) -> Result<Cow<str>, quick_xml::Error> {
        // quick-xml's `EscapeError` converts into its general error type,
        //   which is what we carry in our own errors.
        Ok(quick_xml::escape::unescape(value)?)
    }
}

/// Escaper used by [`QuickXmlTreeBuilder`](super::QuickXmlTreeBuilder)
///   and the [`Encoder`](crate::encode::Encoder) unless otherwise
///   specified.
pub type DefaultEscaper = QuickXmlEscaper;

/// Split character data into the bodies of one or more CDATA sections.
///
/// A CDATA section cannot contain its own terminator `]]>`.
/// Each occurrence is split between the `]]` and the `>`,
///   so that the sections,
///     once read back and concatenated,
///     reproduce `data` exactly.
///
/// Data without a terminator yields a single section.
pub fn cdata_sections(data: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = data;

    while let Some(pos) = memmem::find(rest.as_bytes(), CDATA_END.as_bytes())
    {
        // `]]` | `>`
        let (head, tail) = rest.split_at(pos + 2);
        sections.push(head);
        rest = tail;
    }

    sections.push(rest);
    sections
}
