//! hebrew-columns - second-column extractor for scanned Hebrew manuscripts
//!
//! CLI entry point

use clap::Parser;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use hebrew_columns::util::{format_duration, percentage};
use hebrew_columns::{
    BarProgress, Cli, CliOverrides, Commands, Config, ExitCode, ExtractArgs, ExtractError,
    HebrewTextExtractor, InfoArgs, ProgressCallback, RunSettings, SilentProgress,
};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Extract(args) => run_extract(&args),
        Commands::Info(args) => run_info(&args),
    };

    code.into()
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hebrew_columns={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ============ Extract Command ============

fn run_extract(args: &ExtractArgs) -> ExitCode {
    let start_time = Instant::now();

    if !args.input_dir.is_dir() {
        eprintln!(
            "Error: Input directory does not exist: {}",
            args.input_dir.display()
        );
        return ExitCode::InputNotFound;
    }

    let settings = load_config(args.config.as_deref()).merge_with_cli(&create_cli_overrides(args));
    init_tracing(settings.verbose, args.quiet);
    let extractor = settings.extractor(&args.input_dir, &args.output_dir);

    if args.dry_run {
        return match print_execution_plan(&extractor, &settings) {
            Ok(()) => ExitCode::Success,
            Err(e) => report_error(&e),
        };
    }

    let progress: Box<dyn ProgressCallback> = if args.quiet {
        Box::new(SilentProgress)
    } else {
        Box::new(BarProgress::new())
    };

    let report = match extractor.run(progress.as_ref()) {
        Ok(report) => report,
        Err(e) => return report_error(&e),
    };

    if let Some(path) = &args.report {
        if let Err(e) = report.write_json(path) {
            eprintln!("Error: Failed to write report {}: {}", path.display(), e);
            return ExitCode::OutputError;
        }
    }

    let summary = report.summary;
    if !args.quiet {
        println!(
            "{}: {}/{} images processed ({:.1}%; {} blank, {} skipped by rule, {} failed) in {}",
            report.manuscript,
            summary.processed,
            summary.total(),
            percentage(summary.processed, summary.total()),
            summary.skipped_blank,
            summary.skipped_rule,
            summary.failed,
            format_duration(start_time.elapsed())
        );
    }

    if summary.failed > 0 {
        ExitCode::ProcessingError
    } else {
        ExitCode::Success
    }
}

/// Map a batch-level error to its exit code, printing it
fn report_error(err: &ExtractError) -> ExitCode {
    eprintln!("Error: {}", err);
    match err {
        ExtractError::InputNotFound(_) => ExitCode::InputNotFound,
        ExtractError::OutputError { .. } | ExtractError::Report(_) => ExitCode::OutputError,
        ExtractError::InvalidImage { .. } | ExtractError::DetectionExhausted(_) => {
            ExitCode::ProcessingError
        }
        ExtractError::ThreadPool(_) | ExtractError::Io(_) => ExitCode::GeneralError,
    }
}

// ============ Helper Functions ============

/// Load the explicit config file, or search the default locations
fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(config_path) => match Config::load_from_path(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                Config::default()
            }
        },
        None => Config::load().unwrap_or_default(),
    }
}

/// Only flags the user actually passed override the config file
fn create_cli_overrides(args: &ExtractArgs) -> CliOverrides {
    let mut overrides = CliOverrides::new();
    overrides.threads = args.threads;
    overrides.manuscript = args.manuscript.clone();
    overrides.keep_parity = args.keep;
    if args.skip_existing {
        overrides.skip_existing = Some(true);
    }
    if args.verbose > 0 {
        overrides.verbose = Some(args.verbose);
    }
    overrides
}

/// Print execution plan for dry-run mode
fn print_execution_plan(
    extractor: &HebrewTextExtractor,
    settings: &RunSettings,
) -> Result<(), ExtractError> {
    let tasks = extractor.collect_tasks()?;
    let planned = extractor.plan()?;
    let threads = if settings.threads == 0 {
        num_cpus::get()
    } else {
        settings.threads
    };

    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Input: {}", extractor.input_dir().display());
    println!("Output: {}", extractor.output_dir().display());
    println!("Manuscript: {}", extractor.manuscript_id());
    println!("Kept parity: {}", settings.keep_parity);
    println!("Threads: {}", threads);
    let detectors: Vec<&str> = extractor
        .detector_chain()
        .methods()
        .into_iter()
        .map(|m| m.as_str())
        .collect();
    println!("Detectors: {}", detectors.join(" -> "));
    println!(
        "Skip existing: {}",
        if settings.skip_existing { "YES" } else { "NO" }
    );
    println!();
    println!("Images found: {}", tasks.len());
    println!("Images to process: {}", planned.len());
    println!();
    println!("Files:");
    for task in &tasks {
        match &task.skip_reason {
            Some(reason) => println!("  - {} (skip: {})", task.file_name, reason),
            None if planned.iter().any(|p| p.file_name == task.file_name) => {
                println!("  + {}", task.file_name)
            }
            None => println!("  = {} (already present)", task.file_name),
        }
    }

    Ok(())
}

// ============ Info Command ============

fn run_info(args: &InfoArgs) -> ExitCode {
    println!("hebrew-columns v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  CPUs: {}", num_cpus::get());

    println!();
    println!("Config File Locations:");
    for path in Config::search_paths() {
        let found = if path.exists() { " (found)" } else { "" };
        println!("  {}{}", path.display(), found);
    }

    let config = load_config(args.config.as_deref());
    match config.to_toml() {
        Ok(toml) => {
            println!();
            println!("Effective Configuration:");
            println!("{}", toml);
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error: Failed to serialize configuration: {}", e);
            ExitCode::GeneralError
        }
    }
}
