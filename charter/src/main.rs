//! Charter - constitution-driven spec validation and progress tracking
//!
//! This is the main entry point for the charter CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Validate spec.md against constitution.md
//! charter validate
//!
//! # Mine commit history and rewrite the progress report
//! charter sync --write
//!
//! # Keep the progress report in sync until Ctrl-C
//! CHARTER_POLL_INTERVAL_MS=30000 charter watch
//! ```

use charter::parsers::{parse_file, ConstitutionParser, SpecParser, TasksParser};
use charter::tracker::{GitSyncOptions, PollReport};
use charter::{
    format_report_as_markdown, watch_and_sync, CharterConfig, CharterError, ProgressTracker,
    Result, SpecValidator, Tasks, WatchOptions,
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

/// Charter - constitution-driven spec validation and progress tracking
#[derive(Parser, Debug)]
#[command(name = "charter")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (CHARTER_* variables still override it)
    #[arg(short, long, global = true, env = "CHARTER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (overrides CHARTER_LOG_LEVEL)
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a specification against the constitution
    Validate {
        #[arg(long)]
        constitution: Option<PathBuf>,
        #[arg(long)]
        spec: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },
    /// Print the parsed task list as JSON
    Tasks {
        #[arg(long)]
        tasks: Option<PathBuf>,
    },
    /// Show (or rewrite) the progress report
    Progress {
        #[arg(long)]
        tasks: Option<PathBuf>,
        #[arg(long)]
        progress: Option<PathBuf>,
        /// Write the report to the progress file instead of stdout
        #[arg(short, long)]
        write: bool,
    },
    /// Apply task references from commit history once
    Sync {
        /// Only commits after this RFC 3339 time
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        #[arg(short, long)]
        write: bool,
    },
    /// Poll commit history until Ctrl-C, rewriting the progress file
    Watch,
}

fn load_config(cli: &Cli) -> Result<CharterConfig> {
    let mut config = match &cli.config {
        Some(path) => CharterConfig::from_toml_file(path)?,
        None => CharterConfig::from_env()?,
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
        config.validate()?;
    }
    Ok(config)
}

fn resolve(flag: &Option<PathBuf>, configured: &str) -> PathBuf {
    flag.clone().unwrap_or_else(|| PathBuf::from(configured))
}

/// Seed a tracker and fold in the existing progress report, if any.
async fn seeded_tracker(tasks: &Tasks, progress_path: &Path) -> Result<ProgressTracker> {
    let mut tracker = ProgressTracker::new(tasks);
    if progress_path.exists() {
        let loaded = tracker.load_progress_from_file(progress_path).await?;
        info!(path = %progress_path.display(), loaded, "Loaded existing progress");
    }
    Ok(tracker)
}

fn print_summary(tracker: &ProgressTracker) {
    let stats = tracker.calculate_completion();
    eprintln!(
        "{} {}",
        "Progress:".yellow().bold(),
        stats.to_string().cyan()
    );
}

fn run_validate(
    config: &CharterConfig,
    constitution: &Option<PathBuf>,
    spec: &Option<PathBuf>,
    format: OutputFormat,
) -> Result<bool> {
    let constitution = parse_file(
        &ConstitutionParser,
        resolve(constitution, &config.constitution_path),
    )?;
    let spec = parse_file(&SpecParser, resolve(spec, &config.spec_path))?;

    let report = SpecValidator::new(constitution).generate_report(&spec);
    match format {
        OutputFormat::Markdown => println!("{}", format_report_as_markdown(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    let status = if report.result.valid {
        format!("VALID (score {}/100)", report.result.score).green().bold()
    } else {
        format!("INVALID (score {}/100)", report.result.score).red().bold()
    };
    eprintln!("{} {}", "Validation:".yellow().bold(), status);
    Ok(report.result.valid)
}

async fn run_progress(
    config: &CharterConfig,
    tasks: &Option<PathBuf>,
    progress: &Option<PathBuf>,
    write: bool,
) -> Result<()> {
    let tasks = parse_file(&TasksParser, resolve(tasks, &config.tasks_path))?;
    let progress_path = resolve(progress, &config.progress_path);
    let tracker = seeded_tracker(&tasks, &progress_path).await?;

    if write {
        tracker.save_progress(&progress_path).await?;
        eprintln!("Wrote {}", progress_path.display().to_string().cyan());
    } else {
        println!("{}", tracker.generate_progress_markdown());
    }
    print_summary(&tracker);
    Ok(())
}

async fn run_sync(config: &CharterConfig, since: Option<DateTime<Utc>>, write: bool) -> Result<()> {
    let tasks = parse_file(&TasksParser, &config.tasks_path)?;
    let progress_path = PathBuf::from(&config.progress_path);
    let mut tracker = seeded_tracker(&tasks, &progress_path).await?;

    let options = GitSyncOptions {
        since,
        ..config.sync_options()
    };
    let applied = tracker.sync_from_git(&options).await;

    println!("{}", "Applied updates:".yellow().bold());
    if applied.is_empty() {
        println!("  (none)");
    }
    for update in &applied {
        println!(
            "  {} {} {}",
            update.task_id.cyan(),
            update.status,
            update.notes.as_deref().unwrap_or_default()
        );
    }
    println!();

    if write {
        tracker.save_progress(&progress_path).await?;
        eprintln!("Wrote {}", progress_path.display().to_string().cyan());
    } else {
        println!("{}", tracker.generate_progress_markdown());
    }
    print_summary(&tracker);
    Ok(())
}

async fn run_watch(config: &CharterConfig) -> Result<()> {
    let tasks = parse_file(&TasksParser, &config.tasks_path)?;
    let progress_path = PathBuf::from(&config.progress_path);
    let tracker = Arc::new(Mutex::new(seeded_tracker(&tasks, &progress_path).await?));

    let options = WatchOptions::new(config.sync_options()).interval(config.poll_interval());
    let watcher = watch_and_sync(Arc::clone(&tracker), options);
    let mut reports = watcher.subscribe();

    eprintln!(
        "{} every {}s (Ctrl-C to stop)",
        "Watching commit history".green().bold(),
        config.poll_interval().as_secs()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            report = reports.recv() => match report {
                Ok(report) => persist_poll(&tracker, &report, &progress_path).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed watcher reports");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    watcher.shutdown().await;
    print_summary(&*tracker.lock().await);
    Ok(())
}

async fn persist_poll(tracker: &Mutex<ProgressTracker>, report: &PollReport, path: &Path) {
    if report.applied.is_empty() {
        return;
    }
    for update in &report.applied {
        eprintln!("  {} {}", update.task_id.cyan(), update.status);
    }
    if let Err(e) = tracker.lock().await.save_progress(path).await {
        warn!(error = %e, "Failed to write progress report");
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "Configuration Error".red().bold(), e);
            if let CharterError::ConfigValidation(err) = &e {
                if let Some(suggestion) = &err.suggestion {
                    eprintln!("  {} {}", "Suggestion:".yellow(), suggestion);
                }
            }
            std::process::exit(2);
        }
    };

    if let Err(e) = charter_telemetry::init_with_level("charter", &config.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let outcome = match &cli.command {
        Commands::Validate {
            constitution,
            spec,
            format,
        } => run_validate(&config, constitution, spec, *format),
        Commands::Tasks { tasks } => parse_file(&TasksParser, resolve(tasks, &config.tasks_path))
            .and_then(|tasks| Ok(serde_json::to_string_pretty(&tasks)?))
            .map(|json| {
                println!("{}", json);
                true
            }),
        Commands::Progress {
            tasks,
            progress,
            write,
        } => run_progress(&config, tasks, progress, *write).await.map(|_| true),
        Commands::Sync { since, write } => run_sync(&config, *since, *write).await.map(|_| true),
        Commands::Watch => run_watch(&config).await.map(|_| true),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(2);
        }
    }
}
