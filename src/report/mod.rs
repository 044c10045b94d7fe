//! Report generation for analysis results
//!
//! Two report shapes share this module:
//!
//! - **Session reports**: one file, its current verdict and the full
//!   analysis history — the downloadable report from the dashboard.
//! - **Batch reports**: one row per file from a directory scan.
//!
//! The output format is picked from the file extension: `.csv` writes CSV,
//! anything else writes pretty-printed JSON.

pub mod csv;
pub mod json;

use crate::media::{FileInfo, MediaKind};
use crate::normalize::{NormalizedResult, Verdict};
use crate::session::Session;
use serde::Serialize;
use std::io;
use std::path::Path;

/// Render a probability as the rounded percentage string used everywhere in
/// reports ("87%").
pub fn percent(value: f64) -> String {
    format!("{}%", (value * 100.0).round() as i64)
}

/// File metadata section of a session report.
#[derive(Debug, Clone, Serialize)]
pub struct FileInformation {
    pub filename: String,
    pub filesize: String,
    pub filetype: String,
    pub analysis_date: String,
}

/// The verdict block for the most recent analysis.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentAnalysis {
    pub verdict: String,
    pub confidence: String,
    pub fake_probability: String,
    pub real_probability: String,
    pub processing_time: String,
}

/// One history line in a session report.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryLine {
    pub analysis_number: u32,
    pub verdict: String,
    pub confidence: String,
    pub fake_probability: String,
    pub real_probability: String,
    pub completed_at: String,
}

/// The downloadable report for a single file's session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub file_information: FileInformation,
    pub current_analysis: CurrentAnalysis,
    pub total_analyses: usize,
    pub key_indicators: String,
    pub history: Vec<HistoryLine>,
}

impl SessionReport {
    /// Build the report for a session that has at least one completed
    /// analysis. `None` before the first result lands.
    pub fn from_session(session: &Session) -> Option<Self> {
        let file = session.current_file()?;
        let latest = session.latest()?;

        let history = session
            .history()
            .iter()
            .map(|entry| HistoryLine {
                analysis_number: entry.analysis_number,
                verdict: entry.result.verdict.label().to_string(),
                confidence: percent(entry.result.confidence),
                fake_probability: percent(entry.result.fake_probability),
                real_probability: percent(entry.result.real_probability),
                completed_at: entry.completed_at.to_rfc3339(),
            })
            .collect();

        Some(Self {
            file_information: FileInformation {
                filename: file.file_name.clone(),
                filesize: file.size_display(),
                filetype: file.kind.to_string(),
                analysis_date: chrono::Utc::now().to_rfc3339(),
            },
            current_analysis: CurrentAnalysis {
                verdict: latest.verdict.label().to_string(),
                confidence: percent(latest.confidence),
                fake_probability: percent(latest.fake_probability),
                real_probability: percent(latest.real_probability),
                processing_time: format!("{:.2}s", latest.processing_time),
            },
            total_analyses: session.history().len(),
            key_indicators: indicators(file.kind, latest),
            history,
        })
    }
}

/// One row of a batch scan: a file plus either its result or the error that
/// prevented one. Never both.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    #[serde(flatten)]
    pub file: FileInfo,
    pub result: Option<NormalizedResult>,
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn ok(file: FileInfo, result: NormalizedResult) -> Self {
        Self {
            file,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(file: FileInfo, error: String) -> Self {
        Self {
            file,
            result: None,
            error: Some(error),
        }
    }
}

/// Verdict counts for a batch of files.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub total: usize,
    pub real: usize,
    pub fake: usize,
    pub error: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        let mut summary = Self::default();
        summary.total = outcomes.len();

        for outcome in outcomes {
            match outcome.result.as_ref().map(|r| r.verdict) {
                Some(Verdict::Real) => summary.real += 1,
                Some(Verdict::Fake) => summary.fake += 1,
                None => summary.error += 1,
            }
        }

        summary
    }
}

/// The narrative paragraph shown under "key indicators", phrased per media
/// kind and verdict the way the dashboard wrote it.
pub fn indicators(kind: MediaKind, result: &NormalizedResult) -> String {
    let method = kind.detection_method();
    let mut text = if result.is_real() {
        format!(
            "{} detected natural compression artifacts and consistent \
             structural patterns. Examination shows organic noise \
             distribution typical of authentic {} content.",
            method,
            kind.to_string().to_lowercase()
        )
    } else {
        format!(
            "{} detected compression inconsistencies and artificial pattern \
             generation. Examination reveals synthetic noise distribution \
             and potential deepfake artifacts.",
            method
        )
    };

    text.push_str(&format!(
        " The model determined a {} probability of synthesis vs {} \
         probability of authenticity. Overall confidence level: {}.",
        percent(result.fake_probability),
        percent(result.real_probability),
        percent(result.confidence)
    ));
    text
}

/// Write a session report, format picked by extension.
pub fn generate_session<P: AsRef<Path>>(path: P, report: &SessionReport) -> io::Result<()> {
    let path = path.as_ref();
    let mut file = std::fs::File::create(path)?;
    match extension_of(path).as_str() {
        "csv" => csv::write_session(&mut file, report),
        _ => json::write_session(&mut file, report),
    }
}

/// Write a batch report, format picked by extension.
pub fn generate_batch<P: AsRef<Path>>(path: P, outcomes: &[FileOutcome]) -> io::Result<()> {
    let path = path.as_ref();
    let mut file = std::fs::File::create(path)?;
    match extension_of(path).as_str() {
        "csv" => csv::write_batch(&mut file, outcomes),
        _ => json::write_batch(&mut file, outcomes),
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;
    use crate::normalize::{normalize, RawResult};

    // ==========================================================================
    // SUMMARY STATISTICS TESTS
    // ==========================================================================
    //
    // The Summary struct aggregates verdict counts for a batch of files and
    // drives both the CLI footer and the batch report header.
    // ==========================================================================

    fn file_info(name: &str) -> FileInfo {
        FileInfo {
            path: format!("/media/{}", name).into(),
            file_name: name.to_string(),
            size_bytes: 2048,
            kind: MediaKind::from_path(name).unwrap_or(MediaKind::Image),
        }
    }

    fn result_with(prediction: &str, fake: f64, real: f64) -> NormalizedResult {
        normalize(&RawResult {
            prediction: Some(prediction.to_string()),
            confidence: None,
            fake_probability: Some(fake),
            real_probability: Some(real),
            processing_time: Some(2.4),
            model_info: None,
        })
    }

    #[test]
    fn test_summary_empty() {
        let summary = Summary::from_outcomes(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.real, 0);
        assert_eq!(summary.fake, 0);
        assert_eq!(summary.error, 0);
    }

    #[test]
    fn test_summary_mixed() {
        let outcomes = vec![
            FileOutcome::ok(file_info("a.jpg"), result_with("real", 0.2, 0.8)),
            FileOutcome::ok(file_info("b.mp4"), result_with("fake", 0.9, 0.1)),
            FileOutcome::ok(file_info("c.png"), result_with("real", 0.3, 0.7)),
            FileOutcome::failed(file_info("d.wav"), "backend returned HTTP 500".into()),
        ];
        let summary = Summary::from_outcomes(&outcomes);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.real, 2);
        assert_eq!(summary.fake, 1);
        assert_eq!(summary.error, 1);
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(0.87), "87%");
        assert_eq!(percent(0.005), "1%");
        assert_eq!(percent(0.0), "0%");
        assert_eq!(percent(1.0), "100%");
        assert_eq!(percent(0.666), "67%");
    }

    #[test]
    fn test_indicators_mentions_percentages_and_method() {
        let result = result_with("fake", 0.9, 0.1);
        let text = indicators(MediaKind::Video, &result);

        assert!(text.contains("Multi-modal Fusion"));
        assert!(text.contains("90% probability of synthesis"));
        assert!(text.contains("10% probability of authenticity"));
    }

    #[test]
    fn test_indicators_real_vs_fake_phrasing() {
        let real = result_with("real", 0.1, 0.9);
        let fake = result_with("fake", 0.9, 0.1);

        assert!(indicators(MediaKind::Image, &real).contains("authentic"));
        assert!(indicators(MediaKind::Image, &fake).contains("deepfake artifacts"));
    }

    #[test]
    fn test_session_report_requires_a_result() {
        let session = Session::new();
        assert!(SessionReport::from_session(&session).is_none());
    }

    #[test]
    fn test_session_report_shape() {
        let mut session = Session::new();
        session.select_file(file_info("photo.jpg"));
        let token = session.begin_analysis().unwrap();
        session.complete(token, result_with("fake", 0.85, 0.15));

        let report = SessionReport::from_session(&session).unwrap();
        assert_eq!(report.file_information.filename, "photo.jpg");
        assert_eq!(report.file_information.filetype, "Image");
        assert_eq!(report.current_analysis.verdict, "FAKE");
        assert_eq!(report.current_analysis.confidence, "85%");
        assert_eq!(report.current_analysis.processing_time, "2.40s");
        assert_eq!(report.total_analyses, 1);
        assert_eq!(report.history.len(), 1);
        assert_eq!(report.history[0].analysis_number, 1);
    }
}
