// ISO-8859-1 serialization of XML text
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

//! Convert an XML document into ISO-8859-1 bytes.
//!
//! Scenario documents declare `encoding="ISO-8859-1"`,
//!   so every character must be written as a single byte.
//! Characters above U+00FF have no such byte.
//! Where XML permits it
//!   (character data and attribute values)
//!   they are written as hexadecimal character references,
//!     which decode back to the same character.
//! Within names,
//!   CDATA sections,
//!   and comments a reference would not be interpreted,
//!   and so such a character is an error.
//!
//! The input is expected to be well-formed,
//!   as produced by [`XmlWriter`](super::writer::XmlWriter).

use std::{error::Error, fmt::Display};

use super::Offset;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";
const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Position within the document being converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Character data between tags.
    Content,
    /// Within a tag,
    ///   outside of any attribute value.
    Markup,
    /// Within an attribute value delimited by the given quote.
    Quoted(char),
    CData,
    Comment,
}

impl State {
    /// Transition on a single character.
    fn next(self, ch: char) -> Self {
        match (self, ch) {
            (Self::Content, '<') => Self::Markup,
            (Self::Markup, '>') => Self::Content,
            (Self::Markup, '"' | '\'') => Self::Quoted(ch),
            (Self::Quoted(quote), ch) if ch == quote => Self::Markup,
            (state, _) => state,
        }
    }

    /// Whether a character reference is recognized here.
    fn allows_reference(self) -> bool {
        matches!(self, Self::Content | Self::Quoted(_))
    }
}

/// A character that cannot be represented in ISO-8859-1 at its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unrepresentable {
    pub ch: char,
    pub offset: Offset,
}

impl Display for Unrepresentable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "character U+{:04X} at byte {} cannot be encoded as ISO-8859-1",
            u32::from(self.ch),
            self.offset
        )
    }
}

impl Error for Unrepresentable {}

/// Encode `doc` as ISO-8859-1 bytes.
pub fn encode(doc: &str) -> Result<Vec<u8>, Unrepresentable> {
    let mut out = Vec::with_capacity(doc.len());
    let mut state = State::Content;
    let mut chars = doc.char_indices();

    while let Some((offset, ch)) = chars.next() {
        let rest = &doc[offset..];

        let (next, delim) = match state {
            State::Content if rest.starts_with(CDATA_OPEN) => {
                (State::CData, CDATA_OPEN)
            }
            State::Content if rest.starts_with(COMMENT_OPEN) => {
                (State::Comment, COMMENT_OPEN)
            }
            State::CData if rest.starts_with(CDATA_CLOSE) => {
                (State::Content, CDATA_CLOSE)
            }
            State::Comment if rest.starts_with(COMMENT_CLOSE) => {
                (State::Content, COMMENT_CLOSE)
            }
            _ => {
                push_char(&mut out, state, ch, offset)?;
                state = state.next(ch);
                continue;
            }
        };

        // Delimiters are ASCII,
        //   one char per byte.
        out.extend_from_slice(delim.as_bytes());
        chars.nth(delim.len() - 2);
        state = next;
    }

    Ok(out)
}

fn push_char(
    out: &mut Vec<u8>,
    state: State,
    ch: char,
    offset: Offset,
) -> Result<(), Unrepresentable> {
    match u8::try_from(u32::from(ch)) {
        Ok(byte) => out.push(byte),
        Err(_) if state.allows_reference() => {
            let reference = format!("&#x{:X};", u32::from(ch));
            out.extend_from_slice(reference.as_bytes())
        }
        Err(_) => return Err(Unrepresentable { ch, offset }),
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ascii_is_unchanged() {
        let doc = "<?xml version=\"1.0\" ?>\n<a b='c'>d</a>\n";

        assert_eq!(encode(doc), Ok(doc.as_bytes().to_vec()));
    }

    #[test]
    fn latin1_characters_are_single_bytes() {
        assert_eq!(
            encode("<a n=\"Caf\u{e9}\">\u{fc}ber</a>"),
            Ok(b"<a n=\"Caf\xe9\">\xfcber</a>".to_vec())
        );
    }

    #[test]
    fn latin1_within_cdata() {
        assert_eq!(
            encode("<send><![CDATA[caf\u{e9}]]></send>"),
            Ok(b"<send><![CDATA[caf\xe9]]></send>".to_vec())
        );
    }

    #[test]
    fn wide_characters_in_text_and_values_become_references() {
        assert_eq!(
            encode("<a n=\"\u{20ac}'\" m='\u{2713}\"'>x\u{1f600}</a>"),
            Ok(b"<a n=\"&#x20AC;'\" m='&#x2713;\"'>x&#x1F600;</a>".to_vec())
        );
    }

    #[test]
    fn wide_character_in_cdata_is_an_error() {
        assert_eq!(
            encode("<send><![CDATA[\u{20ac}]]></send>"),
            Err(Unrepresentable {
                ch: '\u{20ac}',
                offset: 15,
            })
        );
    }

    #[test]
    fn text_after_cdata_allows_references() {
        assert_eq!(
            encode("<a><![CDATA[<b>]]>\u{20ac}</a>"),
            Ok(b"<a><![CDATA[<b>]]>&#x20AC;</a>".to_vec())
        );
    }

    #[test]
    fn wide_character_in_name_is_an_error() {
        assert_eq!(
            encode("<\u{3b1}/>"),
            Err(Unrepresentable {
                ch: '\u{3b1}',
                offset: 1,
            })
        );

        assert!(encode("<a \u{3b1}=\"x\"/>").is_err());
    }

    #[test]
    fn wide_character_in_comment_is_an_error() {
        assert!(encode("<a><!-- \u{20ac} --></a>").is_err());
        assert!(encode("<a><!-- it's --></a>\u{20ac}").is_ok());
    }

    #[test]
    fn unrepresentable_display() {
        let err = Unrepresentable {
            ch: '\u{20ac}',
            offset: 3,
        };

        assert_eq!(
            err.to_string(),
            "character U+20AC at byte 3 cannot be encoded as ISO-8859-1"
        );
    }
}
