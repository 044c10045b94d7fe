//! Analysis session state machine
//!
//! The original dashboard kept its state in instance fields mutated from a
//! dozen event handlers, with the classic stale-response bug: whichever
//! request finished last overwrote the current result. This module replaces
//! that with a single owning [`Session`] and reducer-style transitions, plus
//! a monotonically increasing request token so a response only lands if it
//! belongs to the latest request.

use crate::media::FileInfo;
use crate::normalize::NormalizedResult;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where the UI currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Waiting for a file.
    Upload,
    /// A request is in flight.
    Analyzing,
    /// A completed result is on display.
    Results,
}

/// Token identifying one analysis request. Only the response carrying the
/// latest token is applied; everything else is discarded silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// One completed analysis, as recorded in the session history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    /// 1-based: the first completed analysis of a file is #1.
    pub analysis_number: u32,
    pub completed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: NormalizedResult,
}

/// Session state for one file's analysis lifecycle. Single-threaded by
/// design; the request itself runs elsewhere and reports back through
/// [`Session::complete`] / [`Session::fail`] with its token.
#[derive(Debug)]
pub struct Session {
    phase: Phase,
    current_file: Option<FileInfo>,
    latest: Option<NormalizedResult>,
    history: Vec<HistoryEntry>,
    analyses_completed: u32,
    next_token: u64,
    current_token: Option<RequestToken>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Upload,
            current_file: None,
            latest: None,
            history: Vec::new(),
            analyses_completed: 0,
            next_token: 0,
            current_token: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_file(&self) -> Option<&FileInfo> {
        self.current_file.as_ref()
    }

    pub fn latest(&self) -> Option<&NormalizedResult> {
        self.latest.as_ref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn analyses_completed(&self) -> u32 {
        self.analyses_completed
    }

    /// A result arriving now counts as a re-analysis (and gets the cosmetic
    /// confidence boost) when the file already has at least one completed
    /// analysis behind it.
    pub fn is_reanalysis(&self) -> bool {
        !self.history.is_empty()
    }

    /// Select a new file. Supersedes any in-flight request and clears the
    /// previous file's history.
    pub fn select_file(&mut self, file: FileInfo) {
        self.current_file = Some(file);
        self.latest = None;
        self.history.clear();
        self.analyses_completed = 0;
        self.current_token = None;
        self.phase = Phase::Analyzing;
    }

    /// Start an analysis of the current file, issuing a fresh token. Any
    /// previously issued token becomes stale. Returns `None` when no file
    /// is selected.
    pub fn begin_analysis(&mut self) -> Option<RequestToken> {
        self.current_file.as_ref()?;

        self.next_token += 1;
        let token = RequestToken(self.next_token);
        self.current_token = Some(token);
        self.phase = Phase::Analyzing;
        Some(token)
    }

    /// Apply a completed result. Stale tokens are dropped without touching
    /// any state. Returns true if the result was applied.
    pub fn complete(&mut self, token: RequestToken, result: NormalizedResult) -> bool {
        if self.current_token != Some(token) {
            return false;
        }

        self.analyses_completed += 1;
        self.history.push(HistoryEntry {
            analysis_number: self.analyses_completed,
            completed_at: Utc::now(),
            result: result.clone(),
        });
        self.latest = Some(result);
        self.current_token = None;
        self.phase = Phase::Results;
        true
    }

    /// A request failed. The current request reverts the session to the
    /// upload state with no partial results; stale failures are ignored.
    pub fn fail(&mut self, token: RequestToken) -> bool {
        if self.current_token != Some(token) {
            return false;
        }
        self.reset();
        true
    }

    /// Back to the initial upload state, everything cleared.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
