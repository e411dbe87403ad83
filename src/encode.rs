// Scenario encoder
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

//! Encode a [`Scenario`] into its canonical document form.
//!
//! The output of the encoder is deterministic:
//!   attributes are written in insertion order,
//!   each step kind has exactly one shape,
//!   and layout is fixed apart from the indentation width.
//!
//! Step Shapes
//! ===========
//! | Kind                   | Shape                                        |
//! |------------------------|----------------------------------------------|
//! | `send`, `sendCmd`,     | open tag, CDATA payload (if any), action     |
//! | `recv`, `recvCmd`      |   block (if any), close tag                  |
//! | `nop`                  | as above, or self-closing if it has neither  |
//! |                        |   payload nor actions                        |
//! | `pause`, `timewait`    | always self-closing                          |
//! | `label`                | open tag, escaped text payload, close tag    |
//!
//! Payloads are always written as CDATA
//!   (except for `label`),
//!   and are written verbatim---they
//!     are not re-indented,
//!       so that they survive a round trip byte-for-byte.
//!
//! Attributes with empty values are omitted,
//!   as are empty repartition markers and an empty scenario name.

use crate::decode::{
    TAG_ACTION, TAG_CALL_LENGTH_REPARTITION, TAG_REFERENCE,
    TAG_RESPONSE_TIME_REPARTITION, TAG_SCENARIO,
};
use crate::scenario::{Action, Attrs, Scenario, Step, StepKind};
use crate::xml::{
    writer::{Result, Token, WriterState, XmlWriter},
    DefaultEscaper, Escaper,
};
use std::fmt::Write;
use std::marker::PhantomData;
use tracing::debug;

pub const XML_VERSION: &str = "1.0";

/// Encoding declared by the document prolog.
///
/// SIPp scenario files are conventionally declared as Latin-1.
pub const XML_ENCODING: &str = "ISO-8859-1";

/// System identifier of the scenario DTD.
pub const DTD_SYSTEM: &str = "sipp.dtd";

/// Default number of spaces per nesting level.
pub const DEFAULT_INDENT: usize = 2;

/// Encode scenarios,
///   escaping text and attribute values using `S`.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<S: Escaper = DefaultEscaper> {
    indent: usize,
    _escaper: PhantomData<S>,
}

impl<S: Escaper> Default for Encoder<S> {
    fn default() -> Self {
        Self::with_indent(DEFAULT_INDENT)
    }
}

impl<S: Escaper> Encoder<S> {
    /// Encoder indenting each nesting level by `width` spaces.
    pub fn with_indent(width: usize) -> Self {
        Self {
            indent: width,
            _escaper: PhantomData,
        }
    }

    /// Write the document for `scenario` into `sink`.
    ///
    /// This can fail only if `sink` does.
    pub fn write<W: Write>(
        &self,
        scenario: &Scenario,
        sink: &mut W,
    ) -> Result<()> {
        let mut emitter = Emitter::<W, S> {
            sink,
            state: WriterState::default(),
            depth: 0,
            unit: " ".repeat(self.indent),
            _escaper: PhantomData,
        };

        emitter.document(scenario)
    }

    /// Encode `scenario` into a new string.
    pub fn encode(&self, scenario: &Scenario) -> String {
        let mut buf = String::new();

        // Writing into a `String` cannot fail,
        //   and `Emitter` produces only valid writer state transitions.
        if let Err(e) = self.write(scenario, &mut buf) {
            unreachable!("internal error: failed to encode scenario: {e}");
        }

        debug!(
            name = %scenario.name,
            steps = scenario.steps.len(),
            len = buf.len(),
            "encoded scenario"
        );

        buf
    }
}

/// Encode `scenario` using the default [`Encoder`].
pub fn encode(scenario: &Scenario) -> String {
    Encoder::<DefaultEscaper>::default().encode(scenario)
}

/// Lowers a [`Scenario`] into a [`Token`] stream,
///   writing each token as it is produced.
struct Emitter<'w, W: Write, S: Escaper> {
    sink: &'w mut W,
    state: WriterState,
    depth: usize,
    /// Indentation for a single nesting level.
    unit: String,
    _escaper: PhantomData<S>,
}

impl<'w, W: Write, S: Escaper> Emitter<'w, W, S> {
    fn emit(&mut self, tok: Token) -> Result<()> {
        self.state = tok.write::<_, S>(self.sink, self.state)?;
        Ok(())
    }

    /// Begin a new line at the current depth.
    fn line(&mut self) -> Result<()> {
        let ws = format!("\n{}", self.unit.repeat(self.depth));
        self.emit(Token::Whitespace(&ws))
    }

    /// Opening tag with all non-empty attributes.
    fn open(&mut self, name: &str, attrs: &Attrs) -> Result<()> {
        self.emit(Token::Open(name))?;

        for (key, value) in attrs.iter().filter(|(_, v)| !v.is_empty()) {
            self.emit(Token::Attr(key, value))?;
        }

        Ok(())
    }

    /// Self-closing element with at most a single attribute.
    fn marker(&mut self, name: &str, attr: &str, value: &str) -> Result<()> {
        self.line()?;
        self.emit(Token::Open(name))?;

        if !value.is_empty() {
            self.emit(Token::Attr(attr, value))?;
        }

        self.emit(Token::Close(None))
    }

    fn document(&mut self, scenario: &Scenario) -> Result<()> {
        self.emit(Token::Decl {
            version: XML_VERSION,
            encoding: XML_ENCODING,
        })?;
        self.emit(Token::Whitespace("\n"))?;
        self.emit(Token::Doctype {
            root: TAG_SCENARIO,
            system: DTD_SYSTEM,
        })?;
        self.emit(Token::Whitespace("\n\n"))?;

        self.emit(Token::Open(TAG_SCENARIO))?;
        if !scenario.name.is_empty() {
            self.emit(Token::Attr("name", &scenario.name))?;
        }

        self.depth += 1;

        for step in &scenario.steps {
            self.line()?;
            self.step(step)?;

            // Blank line between steps.
            self.emit(Token::Whitespace("\n"))?;
        }

        let repartitions = [
            (
                TAG_RESPONSE_TIME_REPARTITION,
                &scenario.response_time_repartition,
            ),
            (TAG_CALL_LENGTH_REPARTITION, &scenario.call_length_repartition),
        ];

        for (tag, value) in repartitions {
            match value.as_deref() {
                Some(value) if !value.is_empty() => {
                    self.marker(tag, "value", value)?
                }
                _ => (),
            }
        }

        for reference in &scenario.references {
            self.marker(TAG_REFERENCE, "variables", reference)?;
        }

        self.depth -= 1;
        self.line()?;
        self.emit(Token::Close(Some(TAG_SCENARIO)))?;
        self.emit(Token::Whitespace("\n"))
    }

    fn step(&mut self, step: &Step) -> Result<()> {
        let tag = step.kind.tag();

        self.open(tag, &step.attrs)?;

        match step.kind {
            StepKind::Pause | StepKind::Timewait => {
                self.emit(Token::Close(None))
            }

            StepKind::Label => {
                if let Some(payload) = &step.payload {
                    self.emit(Token::Text(payload))?;
                }

                self.emit(Token::Close(Some(tag)))
            }

            StepKind::Nop
                if step.payload.is_none() && step.actions.is_empty() =>
            {
                self.emit(Token::Close(None))
            }

            StepKind::Send
            | StepKind::SendCmd
            | StepKind::Recv
            | StepKind::RecvCmd
            | StepKind::Nop => {
                self.depth += 1;

                if let Some(payload) = &step.payload {
                    self.line()?;
                    self.emit(Token::CData(payload))?;
                }

                if !step.actions.is_empty() {
                    self.actions(&step.actions)?;
                }

                self.depth -= 1;
                self.line()?;
                self.emit(Token::Close(Some(tag)))
            }
        }
    }

    fn actions(&mut self, actions: &[Action]) -> Result<()> {
        self.line()?;
        self.emit(Token::Open(TAG_ACTION))?;
        self.depth += 1;

        for action in actions {
            self.line()?;
            self.open(&action.kind, &action.attrs)?;
            self.emit(Token::Close(None))?;
        }

        self.depth -= 1;
        self.line()?;
        self.emit(Token::Close(Some(TAG_ACTION)))
    }
}
