//! Result normalization for backend classification payloads
//!
//! The backend's detectors are independent services and their payloads are
//! not trustworthy: fields go missing, probabilities drift away from summing
//! to 1, and the reported label sometimes disagrees with the reported
//! probabilities. Everything downstream (display, history, reports) assumes
//! a self-consistent result, so every payload passes through [`normalize`]
//! exactly once, immediately after deserialization.
//!
//! # Invariants after normalization
//!
//! - `fake_probability` and `real_probability` are in `[0, 1]` and sum to 1
//!   (within [`PROB_TOLERANCE`])
//! - `confidence == max(fake_probability, real_probability)` — confidence is
//!   *defined* as the dominance of the winning class, never taken from the
//!   backend
//! - the verdict matches the larger probability; exact ties keep the
//!   incoming verdict
//!
//! The pipeline is total: there is no input, however malformed, for which it
//! fails. Missing fields get defaults, out-of-range numbers are clamped, and
//! a payload with no probability mass at all is reconstructed from the label
//! and confidence alone.
//!
//! Normalization is idempotent: feeding a normalized result back through
//! yields the same result.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance for probability comparisons. No exact float equality is used
/// anywhere in the pipeline.
pub const PROB_TOLERANCE: f64 = 1e-9;

/// Processing time reported when the backend omits it, in seconds.
const DEFAULT_PROCESSING_TIME: f64 = 2.0;

/// Confidence assumed when the backend omits it.
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Floor for the winning probability when both probabilities are missing.
/// Keeps the chosen label from being reported as a minority probability.
const REPAIR_FLOOR: f64 = 0.6;

/// Ceiling for the cosmetic re-analysis boost.
const BOOST_CAP: f64 = 0.95;

/// Final real/fake label shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Real,
    Fake,
}

impl Verdict {
    /// Uppercase form used in reports and badge display.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Real => "REAL",
            Verdict::Fake => "FAKE",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Real => write!(f, "real"),
            Verdict::Fake => write!(f, "fake"),
        }
    }
}

/// Free-form model metadata echoed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            model_name: Some("DeepFake-v1".to_string()),
            method: Some("Visual Analysis".to_string()),
        }
    }
}

impl ModelInfo {
    pub fn model_name(&self) -> &str {
        self.model_name.as_deref().unwrap_or("DeepFake-v1")
    }

    pub fn method(&self) -> &str {
        self.method.as_deref().unwrap_or("Visual Analysis")
    }
}

/// Raw classification payload as the backend sends it. Every field is
/// optional; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResult {
    pub prediction: Option<String>,
    pub confidence: Option<f64>,
    pub fake_probability: Option<f64>,
    pub real_probability: Option<f64>,
    pub processing_time: Option<f64>,
    pub model_info: Option<ModelInfo>,
}

/// Self-consistent classification result. Serializes back to the backend's
/// wire field names so serve-mode responses look like the upstream API.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedResult {
    #[serde(rename = "prediction")]
    pub verdict: Verdict,
    pub confidence: f64,
    pub fake_probability: f64,
    pub real_probability: f64,
    /// Seconds spent by the backend, or the local default when omitted.
    pub processing_time: f64,
    pub model_info: ModelInfo,
}

impl NormalizedResult {
    pub fn is_real(&self) -> bool {
        self.verdict == Verdict::Real
    }
}

/// Clamp a probability-like value into `[0, 1]`. NaN collapses to 0 so
/// hostile payloads cannot poison later arithmetic.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Repair a raw payload into a self-consistent result.
///
/// Steps, in order:
/// 1. defaulting (missing label → real, missing confidence → 0.5, missing
///    probabilities → 0, missing processing time → 2.0 s)
/// 2. zero-sum repair: no probability mass at all → rebuild from the label,
///    with the winning side at `max(0.6, confidence)`
/// 3. rescale by the sum whenever the sum is positive (the already-1 case
///    is a no-op of the same division)
/// 4. flip the verdict when it disagrees with the larger probability
/// 5. confidence = the larger probability
pub fn normalize(raw: &RawResult) -> NormalizedResult {
    let mut verdict = match raw.prediction.as_deref() {
        Some(p) if p.eq_ignore_ascii_case("fake") => Verdict::Fake,
        _ => Verdict::Real,
    };

    let reported_confidence = clamp_unit(raw.confidence.unwrap_or(DEFAULT_CONFIDENCE));
    let mut fake = clamp_unit(raw.fake_probability.unwrap_or(0.0));
    let mut real = clamp_unit(raw.real_probability.unwrap_or(0.0));

    let processing_time = raw
        .processing_time
        .filter(|t| t.is_finite() && *t >= 0.0)
        .unwrap_or(DEFAULT_PROCESSING_TIME);

    let model_info = raw.model_info.clone().unwrap_or_default();

    // Zero-sum repair: nothing to rescale, so derive the distribution from
    // the label and whatever confidence the backend claimed.
    if fake + real <= PROB_TOLERANCE {
        let dominant = reported_confidence.max(REPAIR_FLOOR);
        match verdict {
            Verdict::Real => {
                real = dominant;
                fake = 1.0 - dominant;
            }
            Verdict::Fake => {
                fake = dominant;
                real = 1.0 - dominant;
            }
        }
    }

    // Rescale so the two probabilities sum to exactly 1. Applies even when
    // the sum is already 1 (then it divides by 1).
    let sum = fake + real;
    if sum > PROB_TOLERANCE {
        fake /= sum;
        real /= sum;
    }

    // The label must match the dominant probability, whatever the upstream
    // classifier claimed. Strict comparisons: ties keep the incoming label.
    if fake > real && verdict == Verdict::Real {
        verdict = Verdict::Fake;
    } else if real > fake && verdict == Verdict::Fake {
        verdict = Verdict::Real;
    }

    // Confidence is the dominance of the winning class. The fallback covers
    // the degenerate all-zero case, which the repair above already prevents
    // for any reachable input.
    let mut confidence = fake.max(real);
    if confidence <= PROB_TOLERANCE {
        confidence = DEFAULT_CONFIDENCE;
    }

    NormalizedResult {
        verdict,
        confidence,
        fake_probability: fake,
        real_probability: real,
        processing_time,
        model_info,
    }
}

/// Cosmetic confidence boost applied to repeat analyses of the same file.
///
/// Pure presentation: re-running the same file through the same backend
/// would otherwise return the same numbers, so repeats nudge confidence up
/// by `increment` (capped at 0.95) and re-derive both probabilities in the
/// direction of the current verdict. This never changes the verdict.
///
/// The increment is passed in so callers (and tests) control the random
/// source; [`boost`] is the production wrapper.
pub fn boost_with(result: &NormalizedResult, increment: f64) -> NormalizedResult {
    let confidence = (result.confidence + increment.clamp(0.0, 1.0)).min(BOOST_CAP);

    let (fake, real) = match result.verdict {
        Verdict::Fake => (confidence, 1.0 - confidence),
        Verdict::Real => (1.0 - confidence, confidence),
    };

    NormalizedResult {
        verdict: result.verdict,
        confidence,
        fake_probability: fake,
        real_probability: real,
        processing_time: result.processing_time,
        model_info: result.model_info.clone(),
    }
}

/// Production boost: increment drawn uniformly from `[0.02, 0.08]`.
pub fn boost(result: &NormalizedResult) -> NormalizedResult {
    let increment = rand::thread_rng().gen_range(0.02..=0.08);
    boost_with(result, increment)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // NORMALIZATION PIPELINE TESTS
    // ==========================================================================
    //
    // The normalizer is the one piece of real logic between the backend and
    // everything the user sees. These tests pin down each repair step and
    // the invariants that the rest of the crate relies on.
    // ==========================================================================

    fn raw(
        prediction: Option<&str>,
        confidence: Option<f64>,
        fake: Option<f64>,
        real: Option<f64>,
    ) -> RawResult {
        RawResult {
            prediction: prediction.map(String::from),
            confidence,
            fake_probability: fake,
            real_probability: real,
            processing_time: None,
            model_info: None,
        }
    }

    fn assert_invariants(r: &NormalizedResult) {
        assert!((r.fake_probability + r.real_probability - 1.0).abs() < PROB_TOLERANCE);
        assert!((0.0..=1.0).contains(&r.fake_probability));
        assert!((0.0..=1.0).contains(&r.real_probability));
        assert!(
            (r.confidence - r.fake_probability.max(r.real_probability)).abs() < PROB_TOLERANCE
        );
        // Verdict matches the dominant probability (ties allow either side)
        if r.fake_probability > r.real_probability + PROB_TOLERANCE {
            assert_eq!(r.verdict, Verdict::Fake);
        } else if r.real_probability > r.fake_probability + PROB_TOLERANCE {
            assert_eq!(r.verdict, Verdict::Real);
        }
    }

    #[test]
    fn test_empty_payload_default_fill() {
        // {} -> real at 60/40, confidence 0.6, processing time 2.0s
        let result = normalize(&RawResult::default());

        assert_eq!(result.verdict, Verdict::Real);
        assert!((result.real_probability - 0.6).abs() < PROB_TOLERANCE);
        assert!((result.fake_probability - 0.4).abs() < PROB_TOLERANCE);
        assert!((result.confidence - 0.6).abs() < PROB_TOLERANCE);
        assert!((result.processing_time - 2.0).abs() < f64::EPSILON);
        assert_eq!(result.model_info.model_name(), "DeepFake-v1");
        assert_eq!(result.model_info.method(), "Visual Analysis");
        assert_invariants(&result);
    }

    #[test]
    fn test_zero_sum_repair_respects_confidence_floor() {
        // Confidence below the 0.6 floor: the floor wins
        let result = normalize(&raw(Some("fake"), Some(0.55), None, None));
        assert_eq!(result.verdict, Verdict::Fake);
        assert!((result.fake_probability - 0.6).abs() < PROB_TOLERANCE);

        // Confidence above the floor: confidence wins
        let result = normalize(&raw(Some("fake"), Some(0.9), None, None));
        assert!((result.fake_probability - 0.9).abs() < PROB_TOLERANCE);
        assert!((result.real_probability - 0.1).abs() < PROB_TOLERANCE);
        assert_invariants(&result);
    }

    #[test]
    fn test_rescale_drifted_probabilities() {
        // Sum 0.6: both rescale to 0.5, tie keeps the incoming verdict
        let result = normalize(&raw(Some("fake"), None, Some(0.3), Some(0.3)));

        assert!((result.fake_probability - 0.5).abs() < PROB_TOLERANCE);
        assert!((result.real_probability - 0.5).abs() < PROB_TOLERANCE);
        assert_eq!(result.verdict, Verdict::Fake);
        assert!((result.confidence - 0.5).abs() < PROB_TOLERANCE);
    }

    #[test]
    fn test_rescale_sum_above_one() {
        let result = normalize(&raw(Some("real"), None, Some(0.9), Some(0.9)));
        assert!(
            (result.fake_probability + result.real_probability - 1.0).abs() < PROB_TOLERANCE
        );
        // Tie after rescale keeps the incoming verdict
        assert_eq!(result.verdict, Verdict::Real);
    }

    #[test]
    fn test_label_flip_when_probabilities_disagree() {
        // Backend says real but 90% fake: label flips, confidence follows
        let result = normalize(&raw(Some("real"), None, Some(0.9), Some(0.1)));
        assert_eq!(result.verdict, Verdict::Fake);
        assert!((result.confidence - 0.9).abs() < PROB_TOLERANCE);

        // Symmetric direction
        let result = normalize(&raw(Some("fake"), None, Some(0.2), Some(0.8)));
        assert_eq!(result.verdict, Verdict::Real);
        assert!((result.confidence - 0.8).abs() < PROB_TOLERANCE);
    }

    #[test]
    fn test_confidence_overrides_backend_value() {
        // Backend claims 0.99 confidence but the distribution says 0.7
        let result = normalize(&raw(Some("fake"), Some(0.99), Some(0.7), Some(0.3)));
        assert!((result.confidence - 0.7).abs() < PROB_TOLERANCE);
    }

    #[test]
    fn test_idempotence() {
        let inputs = vec![
            RawResult::default(),
            raw(Some("fake"), Some(0.8), Some(0.3), Some(0.3)),
            raw(Some("real"), None, Some(0.9), Some(0.1)),
            raw(Some("fake"), Some(0.55), None, None),
            raw(None, Some(0.2), Some(0.45), Some(0.65)),
        ];

        for input in inputs {
            let once = normalize(&input);
            let again = normalize(&RawResult {
                prediction: Some(once.verdict.to_string()),
                confidence: Some(once.confidence),
                fake_probability: Some(once.fake_probability),
                real_probability: Some(once.real_probability),
                processing_time: Some(once.processing_time),
                model_info: Some(once.model_info.clone()),
            });

            assert_eq!(once.verdict, again.verdict);
            assert!((once.confidence - again.confidence).abs() < PROB_TOLERANCE);
            assert!((once.fake_probability - again.fake_probability).abs() < PROB_TOLERANCE);
            assert!((once.real_probability - again.real_probability).abs() < PROB_TOLERANCE);
        }
    }

    #[test]
    fn test_invariants_hold_across_inputs() {
        let inputs = vec![
            raw(None, None, Some(0.2), Some(0.2)),
            raw(Some("FAKE"), Some(1.0), None, None),
            raw(Some("garbage"), Some(0.3), Some(0.1), Some(0.2)),
            raw(Some("real"), Some(0.0), Some(0.0), Some(0.0)),
            raw(None, Some(0.7), Some(1.0), Some(1.0)),
        ];

        for input in inputs {
            assert_invariants(&normalize(&input));
        }
    }

    #[test]
    fn test_hostile_numbers_are_clamped() {
        // NaN, negatives and >1 never escape into the output
        let result = normalize(&raw(Some("fake"), Some(f64::NAN), Some(-0.5), Some(2.0)));
        assert_invariants(&result);

        let result = normalize(&raw(None, Some(5.0), Some(f64::NAN), Some(f64::NAN)));
        assert_invariants(&result);
    }

    #[test]
    fn test_unknown_prediction_defaults_to_real() {
        let result = normalize(&raw(Some("synthetic"), None, None, None));
        assert_eq!(result.verdict, Verdict::Real);
    }

    #[test]
    fn test_negative_processing_time_replaced() {
        let mut input = raw(Some("real"), None, None, None);
        input.processing_time = Some(-3.0);
        assert!((normalize(&input).processing_time - 2.0).abs() < f64::EPSILON);

        input.processing_time = Some(f64::INFINITY);
        assert!((normalize(&input).processing_time - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deserializes_backend_payload() {
        let json = r#"{
            "prediction": "fake",
            "confidence": 0.87,
            "fake_probability": 0.87,
            "real_probability": 0.13,
            "processing_time": 2.4,
            "model_info": {"model_name": "video_analyzer_v2", "method": "multimodal_fusion"},
            "file_info": {"filename": "clip.mp4", "size": 12345}
        }"#;

        let parsed: RawResult = serde_json::from_str(json).unwrap();
        let result = normalize(&parsed);
        assert_eq!(result.verdict, Verdict::Fake);
        assert_eq!(result.model_info.model_name(), "video_analyzer_v2");
        assert_invariants(&result);
    }

    // ==========================================================================
    // RE-ANALYSIS BOOST TESTS
    // ==========================================================================

    #[test]
    fn test_boost_with_fixed_increment() {
        // 0.80 fake + 0.05 draw -> 0.85 fake / 0.15 real
        let base = normalize(&raw(Some("fake"), None, Some(0.8), Some(0.2)));
        let boosted = boost_with(&base, 0.05);

        assert_eq!(boosted.verdict, Verdict::Fake);
        assert!((boosted.confidence - 0.85).abs() < PROB_TOLERANCE);
        assert!((boosted.fake_probability - 0.85).abs() < PROB_TOLERANCE);
        assert!((boosted.real_probability - 0.15).abs() < PROB_TOLERANCE);
    }

    #[test]
    fn test_boost_caps_at_095() {
        let base = normalize(&raw(Some("real"), None, Some(0.07), Some(0.93)));
        let boosted = boost_with(&base, 0.08);

        assert!((boosted.confidence - 0.95).abs() < PROB_TOLERANCE);
        assert!((boosted.real_probability - 0.95).abs() < PROB_TOLERANCE);
        assert_eq!(boosted.verdict, Verdict::Real);
    }

    #[test]
    fn test_boost_never_changes_verdict() {
        let base = normalize(&raw(Some("fake"), None, Some(0.51), Some(0.49)));
        for increment in [0.02, 0.05, 0.08] {
            assert_eq!(boost_with(&base, increment).verdict, Verdict::Fake);
        }
    }

    #[test]
    fn test_boosted_result_is_normalize_fixed_point() {
        let base = normalize(&raw(Some("fake"), None, Some(0.7), Some(0.3)));
        let boosted = boost_with(&base, 0.03);

        let renormalized = normalize(&RawResult {
            prediction: Some(boosted.verdict.to_string()),
            confidence: Some(boosted.confidence),
            fake_probability: Some(boosted.fake_probability),
            real_probability: Some(boosted.real_probability),
            processing_time: Some(boosted.processing_time),
            model_info: None,
        });

        assert_eq!(renormalized.verdict, boosted.verdict);
        assert!((renormalized.confidence - boosted.confidence).abs() < PROB_TOLERANCE);
    }
}
