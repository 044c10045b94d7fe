//! CSV report output
//!
//! Spreadsheet-friendly: session reports become one row per history entry,
//! batch reports one row per file. Fields that may contain commas (file
//! names, error messages) are quoted.

use super::{FileOutcome, SessionReport};
use std::io::{self, Write};

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

pub fn write_session<W: Write>(writer: &mut W, report: &SessionReport) -> io::Result<()> {
    writeln!(
        writer,
        "analysis_number,verdict,confidence,fake_probability,real_probability,completed_at"
    )?;

    for line in &report.history {
        writeln!(
            writer,
            "{},{},{},{},{},{}",
            line.analysis_number,
            line.verdict,
            line.confidence,
            line.fake_probability,
            line.real_probability,
            line.completed_at
        )?;
    }

    Ok(())
}

pub fn write_batch<W: Write>(writer: &mut W, outcomes: &[FileOutcome]) -> io::Result<()> {
    writeln!(
        writer,
        "file,media,verdict,confidence,fake_probability,real_probability,processing_time,error"
    )?;

    for outcome in outcomes {
        match &outcome.result {
            Some(result) => writeln!(
                writer,
                "{},{},{},{},{},{},{:.2}s,",
                quote(&outcome.file.file_name),
                outcome.file.kind,
                result.verdict.label(),
                super::percent(result.confidence),
                super::percent(result.fake_probability),
                super::percent(result.real_probability),
                result.processing_time
            )?,
            None => writeln!(
                writer,
                "{},{},ERROR,,,,,{}",
                quote(&outcome.file.file_name),
                outcome.file.kind,
                quote(outcome.error.as_deref().unwrap_or("unknown error"))
            )?,
        }
    }

    Ok(())
}
