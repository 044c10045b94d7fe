use chrono::Local;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io::{self, Write};
use std::path::PathBuf;
use synthdetect::report::{self, FileOutcome, SessionReport, Summary};
use synthdetect::{normalize, progress, DetectorClient, FileInfo, Session, Verdict};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "synthdetect")]
#[command(author, version, about = "Detect AI-generated images, audio and video")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// File or directory to analyze (optional in GUI mode)
    path: Option<PathBuf>,

    /// Launch GUI file picker (auto-enabled when double-clicked)
    #[arg(long)]
    gui: bool,

    /// Detection backend base URL
    #[arg(
        short,
        long,
        env = "SYNTHDETECT_BACKEND",
        default_value = "http://localhost:8080"
    )]
    backend: String,

    /// Analyze a single file this many times (repeats improve confidence)
    #[arg(long, default_value = "1")]
    runs: u32,

    /// Output report file (.json, .csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for auto-generated reports
    #[arg(long, default_value = "synthdetect-reports")]
    report_dir: PathBuf,

    /// Don't auto-generate a report
    #[arg(long)]
    no_report: bool,

    /// Don't prompt to open the report
    #[arg(long)]
    no_open: bool,

    /// Number of parallel uploads (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Only show the summary
    #[arg(short, long)]
    quiet: bool,

    /// Show the key-indicators narrative for each file
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the interactive web dashboard
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,

        /// Detection backend base URL
        #[arg(
            short,
            long,
            env = "SYNTHDETECT_BACKEND",
            default_value = "http://localhost:8080"
        )]
        backend: String,
    },
}

fn main() {
    let args = Args::parse();

    if let Some(Command::Serve { port, backend }) = &args.command {
        if let Err(e) = synthdetect::serve::start(*port, backend) {
            eprintln!("Server error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // Determine if we should use GUI mode
    // With GUI feature: launch GUI if --gui flag OR no path provided
    // This makes double-click behavior "just work"
    #[cfg(feature = "gui")]
    let use_gui = args.gui || args.path.is_none();

    #[cfg(not(feature = "gui"))]
    let use_gui = false;

    #[cfg(feature = "gui")]
    let path = if use_gui {
        match pick_path_gui() {
            Some(p) => p,
            None => {
                eprintln!("No file or folder selected.");
                std::process::exit(0);
            }
        }
    } else {
        args.path.clone().unwrap()
    };

    #[cfg(not(feature = "gui"))]
    let path = if let Some(p) = args.path.clone() {
        p
    } else {
        eprintln!("Usage: synthdetect <PATH>");
        eprintln!("Run 'synthdetect --help' for more options.");
        eprintln!("Note: GUI mode not available in this build.");
        std::process::exit(1);
    };

    // Set up thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    // Collect supported media files
    let files: Vec<FileInfo> = if path.is_dir() {
        WalkDir::new(&path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| FileInfo::from_path(e.path()))
            .collect()
    } else {
        match FileInfo::from_path(&path) {
            Some(info) => vec![info],
            None => {
                eprintln!("❌ Please provide a valid image, audio, or video file.");
                eprintln!("Supported: jpg, png, gif, webp, mp3, wav, flac, mp4, mov, mkv, ...");
                std::process::exit(1);
            }
        }
    };

    if files.is_empty() {
        eprintln!("No supported media files found (images, audio, video)");
        std::process::exit(1);
    }

    let client = DetectorClient::new(&args.backend);

    if !args.quiet {
        eprintln!("\x1b[1mSynthdetect - Synthetic Media Detector\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!("Backend: {}", client.base_url());
        eprintln!("Found {} media file(s)\n", files.len());
    }

    if args.verbose {
        if let Err(e) = client.health() {
            eprintln!("\x1b[33mWarning: backend health check failed: {}\x1b[0m\n", e);
        }
    }

    let outcomes = if files.len() == 1 {
        analyze_single(&client, files.into_iter().next().unwrap(), &args)
    } else {
        analyze_batch(&client, files, &args)
    };

    // Print results
    if !args.quiet {
        for outcome in &outcomes {
            print_row(outcome, args.verbose);
        }
    }

    // Summary
    let summary = Summary::from_outcomes(&outcomes);
    if !args.quiet {
        eprintln!("\n{}", "─".repeat(70));
        eprintln!("\x1b[1mSummary:\x1b[0m");
        eprintln!("  \x1b[32m✓ Real:\x1b[0m   {}", summary.real);
        eprintln!("  \x1b[31m✗ Fake:\x1b[0m   {}", summary.fake);
        if summary.error > 0 {
            eprintln!("  \x1b[90mErrors:\x1b[0m  {}", summary.error);
        }
    }

    // Determine report path
    let report_path = if let Some(ref output) = args.output {
        Some(output.clone())
    } else if !args.no_report {
        std::fs::create_dir_all(&args.report_dir).ok();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("synthdetect_report_{}.json", timestamp);
        Some(args.report_dir.join(filename))
    } else {
        None
    };

    // Generate report
    if let Some(ref output_path) = report_path {
        if let Err(e) = report::generate_batch(output_path, &outcomes) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        if !args.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }

        // Open report
        if !args.no_open {
            if use_gui {
                let _ = open::that(output_path);
            } else if !args.quiet {
                eprint!("\nOpen report? [Y/n] ");
                io::stderr().flush().ok();

                let mut input = String::new();
                if io::stdin().read_line(&mut input).is_ok() {
                    let input = input.trim().to_lowercase();
                    if input.is_empty() || input == "y" || input == "yes" {
                        if let Err(e) = open::that(output_path) {
                            eprintln!("Failed to open report: {}", e);
                        }
                    }
                }
            }
        }
    }

    if !args.quiet {
        eprintln!("\n\x1b[90mAnalysis complete.\x1b[0m");
    }

    // Exit with appropriate code
    if summary.fake > 0 {
        std::process::exit(2);
    } else if summary.error > 0 {
        std::process::exit(1);
    }
}

/// Single-file flow: staged progress overlapping the upload, optional
/// re-analysis runs, session report alongside the batch-style row.
fn analyze_single(client: &DetectorClient, file: FileInfo, args: &Args) -> Vec<FileOutcome> {
    let mut session = Session::new();
    session.select_file(file.clone());

    let runs = args.runs.max(1);
    for run in 1..=runs {
        let token = match session.begin_analysis() {
            Some(t) => t,
            None => break,
        };

        if !args.quiet && runs > 1 {
            eprintln!("Analysis #{} of {}", run, runs);
        }

        let response = progress::run_while(args.quiet, || client.detect(&file));
        match response {
            Ok(raw) => {
                let mut result = normalize::normalize(&raw);
                if session.is_reanalysis() {
                    result = normalize::boost(&result);
                }
                session.complete(token, result);
            }
            Err(e) => {
                session.fail(token);
                eprintln!("\x1b[31mAnalysis failed: {}\x1b[0m", e);
                eprintln!("Please try again.");
                return vec![FileOutcome::failed(file, e.to_string())];
            }
        }
    }

    // With multiple runs the history is the interesting part, so save a
    // session report next to the main one
    if runs > 1 && !args.no_report {
        if let Some(report) = SessionReport::from_session(&session) {
            std::fs::create_dir_all(&args.report_dir).ok();
            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            let path = args
                .report_dir
                .join(format!("synthdetect_session_{}.json", timestamp));
            if report::generate_session(&path, &report).is_ok() && !args.quiet {
                eprintln!("\x1b[32mSession report saved: {}\x1b[0m", path.display());
            }
        }
    }

    match session.latest() {
        Some(result) => vec![FileOutcome::ok(file, result.clone())],
        None => vec![FileOutcome::failed(file, "no result".to_string())],
    }
}

/// Batch flow: parallel uploads with a shared progress bar.
fn analyze_batch(client: &DetectorClient, files: Vec<FileInfo>, args: &Args) -> Vec<FileOutcome> {
    let pb = if !args.quiet {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let outcomes: Vec<FileOutcome> = files
        .into_par_iter()
        .map(|file| {
            let outcome = match client.detect(&file) {
                Ok(raw) => {
                    let result = normalize::normalize(&raw);
                    FileOutcome::ok(file, result)
                }
                Err(e) => FileOutcome::failed(file, e.to_string()),
            };
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(outcome.file.file_name.clone());
            }
            outcome
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    outcomes
}

fn print_row(outcome: &FileOutcome, verbose: bool) {
    match &outcome.result {
        Some(result) => {
            let (color, label) = match result.verdict {
                Verdict::Real => ("\x1b[32m", "[REAL]"),
                Verdict::Fake => ("\x1b[31m", "[FAKE]"),
            };
            let reset = "\x1b[0m";

            println!(
                "{}{:<8}{} {:>4}  fake:{:>4} real:{:>4}  {:>7}  {:<7}  {}",
                color,
                label,
                reset,
                report::percent(result.confidence),
                report::percent(result.fake_probability),
                report::percent(result.real_probability),
                format!("{:.2}s", result.processing_time),
                outcome.file.kind.to_string(),
                outcome.file.file_name
            );

            if verbose {
                eprintln!("    Model: {} ({})", result.model_info.model_name(), result.model_info.method());
                eprintln!("    {}", report::indicators(outcome.file.kind, result));
            }
        }
        None => {
            println!(
                "\x1b[90m{:<8}\x1b[0m {:>4}  {:<7}  {}  ({})",
                "[ERROR]",
                "-",
                outcome.file.kind.to_string(),
                outcome.file.file_name,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

#[cfg(feature = "gui")]
fn pick_path_gui() -> Option<PathBuf> {
    // First try folder picker
    if let Some(folder) = rfd::FileDialog::new()
        .set_title("Select folder to analyze (or Cancel for single file)")
        .pick_folder()
    {
        return Some(folder);
    }

    // If cancelled, offer file picker
    rfd::FileDialog::new()
        .set_title("Select media file to analyze")
        .add_filter(
            "Media files",
            &["jpg", "jpeg", "png", "gif", "webp", "mp3", "wav", "flac", "mp4", "mov", "mkv"],
        )
        .pick_file()
}
