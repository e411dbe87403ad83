// DTD validation of scenario documents
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

//! Validate encoded documents against the scenario DTD.
//!
//! The codec itself never validates;
//!   this is an optional collaborator for tools that want to check their
//!   output against `sipp.dtd`.
//! The only provided implementation shells out to `xmllint`.
//!
//! An unavailable validator is not a failure:
//!   it is reported as [`Validation::valid`] of [`None`] together with a
//!   [`DiagnosticKind::Warning`].

use crate::xml::latin1;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Outcome of validating a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /// Whether the document is valid,
    ///   or [`None`] if validation could not be performed at all.
    pub valid: Option<bool>,
    pub errors: Vec<Diagnostic>,
}

impl Validation {
    fn unavailable<M: Into<String>>(message: M) -> Self {
        Self {
            valid: None,
            errors: vec![Diagnostic::new(DiagnosticKind::Warning, message)],
        }
    }

    fn system<M: Into<String>>(message: M) -> Self {
        Self {
            valid: Some(false),
            errors: vec![Diagnostic::new(DiagnosticKind::System, message)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The document violates the DTD.
    Dtd,
    /// The validator failed for reasons unrelated to the document.
    System,
    /// Validation was skipped.
    Warning,
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dtd => write!(f, "dtd"),
            Self::System => write!(f, "system"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Line of the document the diagnostic refers to,
    ///   if known.
    pub line: Option<usize>,
}

impl Diagnostic {
    pub fn new<M: Into<String>>(kind: DiagnosticKind, message: M) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
        }
    }

    pub fn with_line(self, line: Option<usize>) -> Self {
        Self { line, ..self }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => {
                write!(f, "{}: line {}: {}", self.kind, line, self.message)
            }
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Validate a document against a DTD.
pub trait DtdValidator {
    fn validate(&self, doc: &str, dtd: &Path) -> Validation;
}

/// Default name of the `xmllint` executable,
///   looked up on `PATH`.
pub const XMLLINT: &str = "xmllint";

/// Validate using libxml2's `xmllint`.
///
/// The document is provided on standard input in its declared
///   ISO-8859-1 encoding,
///     so no temporary files are created.
#[derive(Debug, Clone)]
pub struct Xmllint {
    program: PathBuf,
}

impl Default for Xmllint {
    fn default() -> Self {
        Self::with_program(XMLLINT)
    }
}

impl Xmllint {
    /// Use `program` in place of `xmllint`.
    pub fn with_program<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, doc: Vec<u8>, dtd: &Path) -> io::Result<(bool, String)> {
        let mut child = Command::new(&self.program)
            .arg("--dtdvalid")
            .arg(dtd)
            .args(["--noout", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed stdin from another thread so that a child filling its
        //   stderr pipe cannot deadlock against us.
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || stdin.write_all(&doc))
        });

        let output = child.wait_with_output()?;

        // A child that exits without consuming its input closes the
        //   pipe on us;
        //     its exit status is what matters.
        if let Some(Ok(Err(e))) = writer.map(|handle| handle.join()) {
            debug!(error = %e, "failed writing document to validator");
        }

        Ok((
            output.status.success(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ))
    }
}

impl DtdValidator for Xmllint {
    fn validate(&self, doc: &str, dtd: &Path) -> Validation {
        let program = self.program.display();

        let bytes = match latin1::encode(doc) {
            Ok(bytes) => bytes,
            Err(e) => return Validation::system(e.to_string()),
        };

        match self.run(bytes, dtd) {
            Ok((true, _)) => Validation {
                valid: Some(true),
                errors: Vec::new(),
            },

            Ok((false, stderr)) => Validation {
                valid: Some(false),
                errors: parse_diagnostics(&stderr),
            },

            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(%program, "validator not found");

                Validation::unavailable(format!(
                    "{program} is not available; DTD validation skipped"
                ))
            }

            Err(e) => Validation::system(format!(
                "failed to run {program}: {e}"
            )),
        }
    }
}

/// Parse `xmllint` error output into diagnostics.
///
/// Each non-empty line is a diagnostic,
///   except for the summary line stating that the document validates.
/// If no line qualifies,
///   the entire trimmed output becomes a single diagnostic so that a
///   failure is never reported without explanation.
pub fn parse_diagnostics(stderr: &str) -> Vec<Diagnostic> {
    let diagnostics = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains("validates"))
        .map(|line| {
            Diagnostic::new(DiagnosticKind::Dtd, line)
                .with_line(line_number(line))
        })
        .collect::<Vec<_>>();

    if diagnostics.is_empty() {
        vec![Diagnostic::new(DiagnosticKind::Dtd, stderr.trim())]
    } else {
        diagnostics
    }
}

/// Line number referenced by an `xmllint` message,
///   either as a `-:N:` location prefix
///     (the document was read from stdin)
///   or as `line N:` within the message.
fn line_number(line: &str) -> Option<usize> {
    fn leading_number(s: &str) -> Option<usize> {
        let (digits, _) = s.split_once(':')?;
        digits.parse().ok()
    }

    line.strip_prefix("-:").and_then(leading_number).or_else(|| {
        line.match_indices("line ")
            .find_map(|(i, m)| leading_number(&line[i + m.len()..]))
    })
}
