//! The batch literal format of `implementors/**/trait.*.js` files.
//!
//! ```text
//! (function() {var implementors = {};
//! implementors["eyre"] = [{"text":"impl Drop for Report","synthetic":false,"types":[]}];
//! if (window.register_implementors) {window.register_implementors(implementors);} else {window.pending_implementors = implementors;}})()
//! ```
//!
//! Every assignment sits on its own line. Subjects and records are JSON values.
use std::fmt::{Display, Formatter};

use crate::types::{ImplementorBatch, ImplementorRecord};

pub(crate) const PROLOGUE: &str = "(function() {var implementors = {};";
pub(crate) const EPILOGUE: &str = "if (window.register_implementors) {window.register_implementors(implementors);} else {window.pending_implementors = implementors;}})()";
const ASSIGNMENT_PREFIX: &str = "implementors[";
const ASSIGNMENT_SEPARATOR: &str = "] = ";

/// Decode a batch literal.
///
/// Line endings can be either `\n` or `\r\n`. Blank lines are ignored.
/// If a subject is assigned more than once, the last assignment wins.
pub fn parse(source: &str) -> Result<ImplementorBatch, ParseLiteralError> {
    let mut lines = source
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end()))
        .filter(|(_, line)| !line.is_empty());

    match lines.next() {
        Some((_, line)) if line == PROLOGUE => {}
        _ => return Err(ParseLiteralError::MissingPrologue),
    }

    let mut batch = ImplementorBatch::new();
    let mut closed = false;
    for (line_number, line) in lines {
        if closed {
            return Err(ParseLiteralError::TrailingContent { line: line_number });
        }
        if line == EPILOGUE {
            closed = true;
            continue;
        }
        let (subject, records) = parse_assignment(line, line_number)?;
        if batch.insert(subject, records).is_some() {
            tracing::debug!(
                line = line_number,
                "A subject is assigned more than once in the same batch literal"
            );
        }
    }
    if !closed {
        return Err(ParseLiteralError::MissingEpilogue);
    }
    Ok(batch)
}

/// Render a batch literal, with the exact layout used by `rustdoc`.
pub fn emit(batch: &ImplementorBatch) -> String {
    Literal(batch).to_string()
}

/// Renders the wrapped batch in the batch literal format.
pub struct Literal<'a>(pub &'a ImplementorBatch);

impl Display for Literal<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{PROLOGUE}")?;
        for (subject, records) in self.0.iter() {
            let subject = serde_json::to_string(subject).map_err(|_| std::fmt::Error)?;
            let records = serde_json::to_string(records).map_err(|_| std::fmt::Error)?;
            writeln!(f, "{ASSIGNMENT_PREFIX}{subject}{ASSIGNMENT_SEPARATOR}{records};")?;
        }
        write!(f, "{EPILOGUE}")
    }
}

/// Parse `implementors["<subject>"] = [<records>];`.
fn parse_assignment(
    line: &str,
    line_number: usize,
) -> Result<(String, Vec<ImplementorRecord>), ParseLiteralError> {
    let malformed = || ParseLiteralError::MalformedAssignment { line: line_number };

    let rest = line.strip_prefix(ASSIGNMENT_PREFIX).ok_or_else(malformed)?;
    let mut subjects = serde_json::Deserializer::from_str(rest).into_iter::<String>();
    let subject = match subjects.next() {
        Some(Ok(subject)) => subject,
        Some(Err(source)) => {
            return Err(ParseLiteralError::InvalidSubject {
                line: line_number,
                source,
            });
        }
        None => return Err(malformed()),
    };
    let rest = &rest[subjects.byte_offset()..];
    let records = rest
        .strip_prefix(ASSIGNMENT_SEPARATOR)
        .and_then(|r| r.strip_suffix(';'))
        .ok_or_else(malformed)?;
    let records: Vec<ImplementorRecord> = serde_json::from_str(records).map_err(|source| {
        ParseLiteralError::InvalidRecords {
            line: line_number,
            subject: subject.clone(),
            source,
        }
    })?;
    Ok((subject, records))
}

#[derive(Debug, thiserror::Error)]
/// Failure modes of [`parse`].
pub enum ParseLiteralError {
    #[error("The batch literal doesn't start with `{prologue}`", prologue = PROLOGUE)]
    MissingPrologue,
    #[error("The batch literal doesn't end with the conditional publish of the implementors")]
    MissingEpilogue,
    #[error("Unexpected content after the end of the batch literal, at line {line}")]
    TrailingContent { line: usize },
    #[error("Line {line} is not an `implementors[\"<subject>\"] = [...];` assignment")]
    MalformedAssignment { line: usize },
    #[error("The subject at line {line} is not a valid string literal")]
    InvalidSubject {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("The implementors of `{subject}` at line {line} are not a valid list of records")]
    InvalidRecords {
        line: usize,
        subject: String,
        #[source]
        source: serde_json::Error,
    },
}
