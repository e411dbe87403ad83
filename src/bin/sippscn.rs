// SIPp scenario round-trip checker
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

//! Round-trip a scenario document through the codec.
//!
//! `sippscn` decodes a scenario,
//!   re-encodes it,
//!   decodes the result again,
//!   and verifies that nothing the model carries was lost along the way.
//! The re-encoded document may be emitted,
//!   validated against the scenario DTD using `xmllint`,
//!   or generated from a built-in template.

extern crate sippscn;

use getopts::{Fail, Options};
use sippscn::{
    decode,
    dtd::{DtdValidator, Validation, Xmllint},
    templates::Template,
    xml::{latin1, DefaultEscaper, Location},
    Encoder, Scenario, Step,
};
use std::{
    env,
    error::Error,
    fmt::{self, Display},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, Level};

/// Types of commands
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run(Job),
    Usage,
}

/// Where the scenario comes from.
#[derive(Debug, PartialEq, Eq)]
enum Source {
    File(String),
    Template(Template),
}

/// What to write to standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emit {
    /// Scenario summary and round-trip checks.
    Summary,
    /// Re-encoded document.
    Xml,
}

#[derive(Debug, PartialEq, Eq)]
struct Job {
    source: Source,
    emit: Emit,
    output: Option<String>,
    dtd: Option<String>,
    indent: usize,
    verbosity: usize,
}

/// Read a source file as text.
///
/// Scenario files are conventionally Latin-1;
///   anything that is not valid UTF-8 is decoded as such,
///     which cannot fail since every byte is a Latin-1 code point.
fn read_source(path: &str) -> Result<String, SippscnError> {
    let bytes = fs::read(path).map_err(|e| SippscnError::Read(path.into(), e))?;

    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!(path, "input is not UTF-8; reading as ISO-8859-1");
            e.into_bytes().into_iter().map(char::from).collect()
        }
    })
}

/// Outcome of comparing one aspect of the original and re-decoded
///   scenarios.
#[derive(Debug, PartialEq, Eq)]
struct Check {
    label: String,
    expected: String,
    actual: String,
}

impl Check {
    fn new<L: Into<String>, E: ToString, A: ToString>(
        label: L,
        expected: E,
        actual: A,
    ) -> Self {
        Self {
            label: label.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    fn passed(&self) -> bool {
        self.expected == self.actual
    }
}

impl Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (mark, op) = if self.passed() {
            ("ok", "==")
        } else {
            ("FAIL", "!=")
        };

        write!(
            f,
            "  {mark} {}: {} {op} {}",
            self.label, self.expected, self.actual
        )
    }
}

/// Kind and attributes of a step as a single comparable line.
///
/// Empty attribute values are never encoded,
///   and so are not part of what must survive a round trip.
fn step_signature(step: &Step) -> String {
    step.attrs
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .fold(step.kind.to_string(), |mut sig, (key, value)| {
            sig.push_str(&format!(" {key}={value:?}"));
            sig
        })
}

/// Compare name,
///   step count,
///   and the kind and attributes of each step.
fn compare(orig: &Scenario, again: &Scenario) -> Vec<Check> {
    let mut checks = vec![
        Check::new("Name", &orig.name, &again.name),
        Check::new("Step count", orig.steps.len(), again.steps.len()),
    ];

    checks.extend(orig.steps.iter().zip(&again.steps).enumerate().map(
        |(i, (a, b))| {
            Check::new(
                format!("Step {}", i + 1),
                step_signature(a),
                step_signature(b),
            )
        },
    ));

    checks
}

/// Distinct step kinds in order of first appearance.
fn distinct_kinds(scenario: &Scenario) -> Vec<String> {
    let mut kinds = Vec::new();

    for step in &scenario.steps {
        let kind = step.kind.to_string();
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    kinds
}

fn write_summary<W: Write>(
    out: &mut W,
    scenario: &Scenario,
    doc: &[u8],
    checks: &[Check],
) -> io::Result<()> {
    let kinds = distinct_kinds(scenario).join(", ");

    writeln!(out, "Scenario name: {}", scenario.name)?;
    writeln!(out, "Number of steps: {}", scenario.steps.len())?;
    writeln!(out, "Step kinds: {kinds}")?;
    writeln!(out, "Generated XML length: {} bytes", doc.len())?;

    for check in checks {
        writeln!(out, "{check}")?;
    }

    Ok(())
}

fn report_validation(dtd: &Path, validation: &Validation) {
    let dtd = dtd.display();

    match validation.valid {
        Some(true) => eprintln!("document validates against {dtd}"),
        Some(false) => eprintln!("document does not validate against {dtd}"),
        None => (),
    }

    for diagnostic in &validation.errors {
        eprintln!("{diagnostic}");
    }
}

/// Round-trip the scenario described by `job`,
///   returning whether every check passed and the output validated.
fn run(job: &Job) -> Result<bool, SippscnError> {
    let text = match &job.source {
        Source::File(path) => read_source(path)?,
        Source::Template(template) => template.xml().to_owned(),
    };

    let encoder = Encoder::<DefaultEscaper>::with_indent(job.indent);

    let scenario = decode_located(&text)?;
    let xml = encoder.encode(&scenario);
    let again = decode_located(&xml)?;

    // The document declares itself to be ISO-8859-1.
    let doc = latin1::encode(&xml)?;

    let checks = compare(&scenario, &again);
    let mut passed = checks.iter().all(Check::passed);

    if let Some(dtd) = &job.dtd {
        let dtd = PathBuf::from(dtd);
        let validation = Xmllint::default().validate(&xml, &dtd);

        report_validation(&dtd, &validation);
        passed &= validation.valid != Some(false);
    }

    if let Some(path) = &job.output {
        fs::write(path, &doc)
            .map_err(|e| SippscnError::Write(path.into(), e))?;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match job.emit {
        Emit::Xml if job.output.is_none() => out.write_all(&doc)?,
        Emit::Xml => (),
        Emit::Summary => {
            write_summary(&mut out, &scenario, &doc, &checks)?;

            if passed {
                writeln!(out, "Round-trip PASSED")?;
            } else {
                writeln!(out, "Round-trip FAILED")?;
            }
        }
    }

    Ok(passed)
}

/// Decode `text`,
///   locating any error by line and column.
fn decode_located(text: &str) -> Result<Scenario, SippscnError> {
    decode(text).map_err(|e| {
        let at = e.offset().map(|offset| Location::of(text, offset));
        SippscnError::Decode(e, at)
    })
}

/// Install a subscriber writing to stderr,
///   more verbose with each `-v`.
fn init_logging(verbosity: usize) {
    let level = match verbosity {
        0 => return,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    if let Err(e) = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .try_init()
    {
        eprintln!("warning: failed to initialize logging: {e}");
    }
}

/// Entrypoint for the round-trip checker
pub fn main() -> Result<(), SippscnError> {
    let args: Vec<String> = env::args().collect();
    let program = &args[0];
    let opts = get_opts();
    let usage =
        opts.usage(&format!("Usage: {} [OPTIONS] INPUT", program));

    match parse_options(opts, args) {
        Ok(Command::Run(job)) => {
            init_logging(job.verbosity);

            match run(&job) {
                Ok(true) => Ok(()),
                Ok(false) => std::process::exit(1),
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(1);
                }
            }
        }
        Ok(Command::Usage) => {
            println!("{}", usage);
            std::process::exit(exitcode::OK);
        }
        Err(e) => {
            eprintln!("{}", e);
            println!("{}", usage);
            std::process::exit(exitcode::USAGE);
        }
    }
}

/// Get 'Options'
fn get_opts() -> Options {
    let mut opts = Options::new();
    opts.optopt("o", "output", "write re-encoded document to FILE", "FILE");
    opts.optopt("", "emit", "set output type", "summary|xml");
    opts.optopt("", "dtd", "validate re-encoded document against DTD", "PATH");
    opts.optopt("t", "template", "use a built-in template as input", "NAME");
    opts.optopt("", "indent", "spaces per nesting level", "N");
    opts.optflagmulti("v", "verbose", "log to stderr (repeat for more)");
    opts.optflag("h", "help", "print this help menu");

    opts
}

/// Option parser
fn parse_options(opts: Options, args: Vec<String>) -> Result<Command, Fail> {
    let matches = opts.parse(&args[1..])?;

    if matches.opt_present("h") {
        return Ok(Command::Usage);
    }

    let template = match matches.opt_str("t") {
        Some(name) => Some(name.parse::<Template>().map_err(|_| {
            let names = Template::ALL.map(Template::name).join("|");
            Fail::ArgumentMissing(format!("--template {names}"))
        })?),
        None => None,
    };

    let source = match (template, matches.free.len()) {
        (Some(template), 0) => Source::Template(template),
        (None, 0) => return Err(Fail::OptionMissing(String::from("INPUT"))),
        (None, 1) => Source::File(matches.free[0].clone()),
        (Some(_), _) => {
            return Err(Fail::UnrecognizedOption(matches.free[0].clone()))
        }
        (None, _) => {
            return Err(Fail::UnrecognizedOption(matches.free[1].clone()))
        }
    };

    let emit = match matches.opt_str("emit").as_deref() {
        Some("summary") => Emit::Summary,
        Some("xml") => Emit::Xml,
        Some(_) => {
            return Err(Fail::ArgumentMissing(String::from(
                "--emit summary|xml",
            )))
        }
        // Templates exist to be emitted.
        None => match source {
            Source::Template(_) => Emit::Xml,
            Source::File(_) => Emit::Summary,
        },
    };

    let indent = match matches.opt_str("indent") {
        Some(n) => n
            .parse::<usize>()
            .map_err(|_| Fail::ArgumentMissing(String::from("--indent N")))?,
        None => sippscn::encode::DEFAULT_INDENT,
    };

    Ok(Command::Run(Job {
        source,
        emit,
        output: matches.opt_str("o"),
        dtd: matches.opt_str("dtd"),
        indent,
        verbosity: matches.opt_count("v"),
    }))
}

/// Round-trip checker (`sippscn`) error.
///
/// Round-trip mismatches and DTD violations are not errors;
///   they are reported as failed checks.
#[derive(Debug)]
pub enum SippscnError {
    Read(String, io::Error),
    Write(String, io::Error),
    Io(io::Error),
    Decode(decode::Error, Option<Location>),
    Encode(latin1::Unrepresentable),
}

impl From<io::Error> for SippscnError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<latin1::Unrepresentable> for SippscnError {
    fn from(e: latin1::Unrepresentable) -> Self {
        Self::Encode(e)
    }
}

impl Display for SippscnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(path, e) => write!(f, "failed to read `{path}`: {e}"),
            Self::Write(path, e) => write!(f, "failed to write `{path}`: {e}"),
            Self::Io(e) => Display::fmt(e, f),
            Self::Decode(e, None) => Display::fmt(e, f),
            Self::Decode(e, Some(at)) => write!(f, "{e} ({at})"),
            Self::Encode(e) => write!(f, "cannot encode document: {e}"),
        }
    }
}

impl Error for SippscnError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(_, e) | Self::Write(_, e) | Self::Io(e) => Some(e),
            Self::Decode(e, _) => Some(e),
            Self::Encode(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use sippscn::{Action, StepKind};

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("program")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    fn job(list: &[&str]) -> Job {
        match parse_options(get_opts(), args(list)) {
            Ok(Command::Run(job)) => job,
            other => panic!("expected a job, got {other:?}"),
        }
    }

    #[test]
    fn parse_options_help() {
        for flag in ["-h", "--help"] {
            assert_eq!(
                parse_options(get_opts(), args(&[flag])),
                Ok(Command::Usage)
            );
        }
    }

    #[test]
    fn parse_options_invalid() {
        match parse_options(get_opts(), args(&["-q"])) {
            Err(Fail::UnrecognizedOption(_)) => {}
            _ => panic!("Invalid option not caught"),
        }
    }

    #[test]
    fn parse_options_missing_input() {
        match parse_options(get_opts(), args(&[])) {
            Err(Fail::OptionMissing(message)) => {
                assert_eq!("INPUT", message);
            }
            _ => panic!("Missing input not caught"),
        }
    }

    #[test]
    fn parse_options_too_many_args() {
        match parse_options(get_opts(), args(&["foo.xml", "bar.xml"])) {
            Err(Fail::UnrecognizedOption(message)) => {
                assert_eq!("bar.xml", message);
            }
            _ => panic!("Extra argument not caught"),
        }
    }

    #[test]
    fn parse_options_input_with_template() {
        match parse_options(get_opts(), args(&["-t", "uac", "foo.xml"])) {
            Err(Fail::UnrecognizedOption(message)) => {
                assert_eq!("foo.xml", message);
            }
            _ => panic!("Input alongside template not caught"),
        }
    }

    #[test]
    fn parse_options_invalid_emit() {
        match parse_options(get_opts(), args(&["foo.xml", "--emit", "foo"])) {
            Err(Fail::ArgumentMissing(message)) => {
                assert_eq!("--emit summary|xml", message);
            }
            _ => panic!("Invalid emit not caught"),
        }
    }

    #[test]
    fn parse_options_invalid_template() {
        match parse_options(get_opts(), args(&["-t", "nope"])) {
            Err(Fail::ArgumentMissing(message)) => {
                assert_eq!("--template blank|uac|uas|3pcc|rtp|srtp", message);
            }
            _ => panic!("Invalid template not caught"),
        }
    }

    #[test]
    fn parse_options_invalid_indent() {
        match parse_options(get_opts(), args(&["foo.xml", "--indent", "two"])) {
            Err(Fail::ArgumentMissing(message)) => {
                assert_eq!("--indent N", message);
            }
            _ => panic!("Invalid indent not caught"),
        }
    }

    #[test]
    fn parse_options_defaults() {
        assert_eq!(
            job(&["foo.xml"]),
            Job {
                source: Source::File("foo.xml".into()),
                emit: Emit::Summary,
                output: None,
                dtd: None,
                indent: 2,
                verbosity: 0,
            }
        );
    }

    #[test]
    fn parse_options_valid_full() {
        assert_eq!(
            job(&[
                "foo.xml", "--emit", "xml", "-o", "out.xml", "--dtd",
                "sipp.dtd", "--indent", "4", "-v", "-v",
            ]),
            Job {
                source: Source::File("foo.xml".into()),
                emit: Emit::Xml,
                output: Some("out.xml".into()),
                dtd: Some("sipp.dtd".into()),
                indent: 4,
                verbosity: 2,
            }
        );
    }

    #[test]
    fn parse_options_template_emits_xml_by_default() {
        let parsed = job(&["--template", "3pcc"]);

        assert_eq!(parsed.source, Source::Template(Template::ThreePcc));
        assert_eq!(parsed.emit, Emit::Xml);

        assert_eq!(
            job(&["-t", "uas", "--emit", "summary"]).emit,
            Emit::Summary
        );
    }

    #[test]
    fn step_signature_ignores_empty_attrs() {
        let step = Step::new(StepKind::Recv)
            .with_attr("response", "200")
            .with_attr("crlf", "")
            .with_action(Action::new("log"));

        assert_eq!(step_signature(&step), r#"recv response="200""#);
    }

    #[test]
    fn compare_reports_mismatches() {
        let mut orig = Scenario::new("A");
        orig.push_step(
            Step::new(StepKind::Pause).with_attr("milliseconds", "1"),
        );
        orig.push_step(Step::new(StepKind::Nop));

        let mut again = Scenario::new("A");
        again.push_step(
            Step::new(StepKind::Pause).with_attr("milliseconds", "2"),
        );

        let checks = compare(&orig, &again);
        let failed = checks
            .iter()
            .filter(|check| !check.passed())
            .map(|check| check.label.as_str())
            .collect::<Vec<_>>();

        assert_eq!(checks.len(), 3);
        assert_eq!(failed, vec!["Step count", "Step 1"]);
    }

    #[test]
    fn check_display() {
        assert_eq!(
            Check::new("Name", "a", "a").to_string(),
            "  ok Name: a == a"
        );
        assert_eq!(
            Check::new("Name", "a", "b").to_string(),
            "  FAIL Name: a != b"
        );
    }

    #[test]
    fn distinct_kinds_in_first_appearance_order() {
        let scenario = Template::Uac.scenario().expect("decode failed");

        assert_eq!(distinct_kinds(&scenario), vec!["send", "recv", "pause"]);
    }
}
