//! Synthdetect - Detect AI-generated media
//!
//! Synthdetect is the client side of a synthetic-media detector: it uploads
//! images, audio and video to a remote classification backend and turns the
//! backend's (often messy) payloads into self-consistent real/fake verdicts
//! with confidence statistics, an analysis history and downloadable reports.
//!
//! # Overview
//!
//! The backend exposes one detection endpoint per media class
//! (`/api/detect/image`, `/api/detect/audio`, `/api/detect/video`) and
//! returns a JSON payload with a prediction, a confidence and two
//! complementary probabilities. In practice fields go missing, the
//! probabilities drift away from summing to 1, and the label sometimes
//! contradicts the probabilities. The [`normalize`] module repairs all of
//! that with a total, idempotent pipeline, so everything downstream can
//! rely on a handful of invariants.
//!
//! # Quick Start
//!
//! ```no_run
//! use synthdetect::{DetectorClient, FileInfo, Verdict};
//!
//! let client = DetectorClient::new("http://localhost:8080");
//! let file = FileInfo::from_path("suspicious.jpg").expect("supported media type");
//!
//! let raw = client.detect(&file).expect("backend reachable");
//! let result = synthdetect::normalize::normalize(&raw);
//!
//! match result.verdict {
//!     Verdict::Real => println!("Looks authentic"),
//!     Verdict::Fake => println!("Synthetic media detected!"),
//! }
//!
//! println!("Confidence: {:.0}%", result.confidence * 100.0);
//! ```
//!
//! # Modules
//!
//! - [`media`]: media-kind detection, validation and endpoint routing
//! - [`normalize`]: the result-normalization pipeline (the core)
//! - [`client`]: blocking multipart uploads to the backend
//! - [`session`]: analysis state machine with history and stale-response
//!   protection
//! - [`progress`]: staged progress simulation overlapping the real request
//! - [`report`]: JSON/CSV session and batch reports
//! - [`serve`]: embedded web dashboard

pub mod client;
pub mod media;
pub mod normalize;
pub mod progress;
pub mod report;
pub mod serve;
pub mod session;

pub use client::{DetectError, DetectorClient};
pub use media::{FileInfo, MediaKind};
pub use normalize::{NormalizedResult, RawResult, Verdict};
pub use session::{Phase, Session};
