//! Staged analysis progress display
//!
//! The backend gives no progress feedback during an upload, so the bar is a
//! staged simulation: five labeled stages climb to 95% on a fixed schedule
//! while the real request runs on a worker thread. The last 5% is reserved
//! for the request actually finishing, which means the bar can sit at 95%
//! on a slow backend but never reports completion before there is a result.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Stage labels and durations (ms), matching the dashboard's script.
pub const STAGES: &[(&str, u64)] = &[
    ("Uploading file...", 800),
    ("Initializing AI models...", 1000),
    ("Processing content...", 1500),
    ("Analyzing patterns...", 1200),
    ("Generating results...", 700),
];

/// The simulation stops here; the remainder completes with the request.
const SIMULATED_CEILING: u64 = 95;

/// Milliseconds per animation tick.
const TICK_MS: u64 = 40;

/// Bar position after `completed` of `total` stages have played.
fn stage_target(completed: usize, total: usize) -> u64 {
    (completed as u64 * SIMULATED_CEILING) / total as u64
}

fn styled_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );
    pb
}

/// Walk the bar from its current position to `target` over `duration_ms`.
fn animate_to(pb: &ProgressBar, target: u64, duration_ms: u64) {
    let from = pb.position();
    if target <= from {
        return;
    }
    let steps = (duration_ms / TICK_MS).max(1);
    for step in 1..=steps {
        pb.set_position(from + (target - from) * step / steps);
        std::thread::sleep(Duration::from_millis(TICK_MS));
    }
}

/// Run `work` on a worker thread while the staged animation plays. Returns
/// only after both the animation and the work have finished, so a result is
/// never available while the bar is still moving through its stages.
///
/// With `quiet`, the simulation is skipped entirely and `work` runs inline.
pub fn run_while<T, F>(quiet: bool, work: F) -> T
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    if quiet {
        return work();
    }

    std::thread::scope(|scope| {
        let handle = scope.spawn(work);
        let pb = styled_bar();

        for (i, (label, duration_ms)) in STAGES.iter().enumerate() {
            pb.set_message(*label);
            animate_to(&pb, stage_target(i + 1, STAGES.len()), *duration_ms);
        }

        // Both sides must finish before results are shown: the animation is
        // done, now block on the real request.
        let result = match handle.join() {
            Ok(value) => value,
            Err(panic) => std::panic::resume_unwind(panic),
        };

        pb.set_message("Done");
        animate_to(&pb, 100, 400);
        pb.finish_and_clear();
        result
    })
}
