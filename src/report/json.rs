//! JSON report output
//!
//! Pretty-printed, matching the shape of the dashboard's downloadable
//! report so existing consumers of those files keep working.

use super::{FileOutcome, SessionReport, Summary};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct BatchReport<'a> {
    generated: String,
    summary: Summary,
    files: &'a [FileOutcome],
}

pub fn write_session<W: Write>(writer: &mut W, report: &SessionReport) -> io::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")
}

pub fn write_batch<W: Write>(writer: &mut W, outcomes: &[FileOutcome]) -> io::Result<()> {
    let report = BatchReport {
        generated: chrono::Local::now().to_rfc3339(),
        summary: Summary::from_outcomes(outcomes),
        files: outcomes,
    };
    let json = serde_json::to_string_pretty(&report)?;
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")
}
