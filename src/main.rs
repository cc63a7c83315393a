//! CLI entry point for `mailshrink`.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mailshrink::config::{self, Config};
use mailshrink::{AttachmentSizeReducer, MailFilterAdapter, ReduceOutcome, ReduceStatus};

#[derive(Parser)]
#[command(
    name = "mailshrink",
    version,
    about = "Shrink image attachments until an email fits the provider's size limit"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce a set of attachment files to fit the size limit
    Fit {
        /// Attachment files, in message order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        tuning: Tuning,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rewrite the `attachments` field of mail arguments given as a JSON object
    Filter {
        /// JSON file to read (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Show the effective configuration, or write the defaults to disk
    Config {
        /// Write a default config file to the standard location
        #[arg(long)]
        init: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

/// Command-line overrides for the configured limits.
#[derive(clap::Args)]
struct Tuning {
    /// Total size budget in MB (a 5% safety margin is applied)
    #[arg(long, value_name = "MB", env = "MAILSHRINK_LIMIT_MB")]
    limit_mb: Option<f64>,
    /// Maximum number of resize rounds
    #[arg(long, value_name = "N")]
    max_attempts: Option<u32>,
    /// Scale applied to width and height each round
    #[arg(long, value_name = "FACTOR")]
    factor: Option<f64>,
    /// Directory for resized copies
    #[arg(long, value_name = "DIR")]
    temp_dir: Option<PathBuf>,
}

impl Tuning {
    fn apply(&self, config: &mut Config) {
        if let Some(mb) = self.limit_mb {
            config.limits.max_total_size_mb = mb;
        }
        if let Some(n) = self.max_attempts {
            config.limits.max_attempts = n;
        }
        if let Some(f) = self.factor {
            config.limits.reduction_factor = f;
        }
        if let Some(ref dir) = self.temp_dir {
            config.files.temp_dir = Some(dir.clone());
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    setup_logging(&log_level, &config);

    match cli.command {
        Commands::Fit {
            files,
            tuning,
            json,
        } => {
            tuning.apply(&mut config);
            cmd_fit(&files, &config, json)
        }
        Commands::Filter { input, tuning } => {
            tuning.apply(&mut config);
            cmd_filter(input.as_deref(), &config)
        }
        Commands::Config { init } => cmd_config(&config, init),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailshrink.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Reduce the given files and report the outcome.
fn cmd_fit(files: &[PathBuf], config: &Config, json: bool) -> anyhow::Result<()> {
    for file in files {
        if !file.exists() {
            anyhow::bail!("Attachment not found: {}", file.display());
        }
    }

    let reducer = AttachmentSizeReducer::with_raster_editor(config.reducer_config());
    let limit_mb = reducer.config().max_total_size_mb;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} Resizing {msg}")
            .expect("valid template"),
    );

    let start = Instant::now();
    let outcome = reducer.reduce_with_progress(
        files,
        limit_mb,
        1,
        Some(&|attempt, total| {
            use humansize::{format_size, DECIMAL};
            pb.set_message(format!("round {attempt}: {}", format_size(total, DECIMAL)));
            pb.tick();
        }),
    )?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    if json {
        print_outcome_json(files, &outcome, limit_mb)?;
    } else {
        print_outcome_table(files, &outcome, limit_mb, elapsed);
    }

    Ok(())
}

/// Read mail arguments as JSON, adapt them, and print the result.
fn cmd_filter(input: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let args = match serde_json::from_str::<serde_json::Value>(&raw)? {
        serde_json::Value::Object(map) => map,
        other => anyhow::bail!("Mail arguments must be a JSON object, got: {other}"),
    };

    let adapter = MailFilterAdapter::new(AttachmentSizeReducer::with_raster_editor(
        config.reducer_config(),
    ));
    let adapted = adapter.adapt(args)?;

    println!("{}", serde_json::to_string_pretty(&adapted)?);
    Ok(())
}

/// Print the effective config, or write the default one.
fn cmd_config(config: &Config, init: bool) -> anyhow::Result<()> {
    if init {
        let path = config::save_config(&Config::default())?;
        println!("  Wrote default config to {}", path.display());
        return Ok(());
    }

    if let Some(path) = config::config_file_path() {
        println!("# config file: {}", path.display());
    }
    println!("# log file:    {}", config::log_file_path(config).display());
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailshrink", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Print the outcome as a human-readable table.
fn print_outcome_table(
    files: &[PathBuf],
    outcome: &ReduceOutcome,
    limit_mb: f64,
    elapsed: std::time::Duration,
) {
    use humansize::{format_size, DECIMAL};

    let status = match outcome.status {
        ReduceStatus::AlreadyFits => "already within limit",
        ReduceStatus::Fits => "reduced within limit",
        ReduceStatus::AttemptsExhausted => "gave up, still over limit",
    };

    println!();
    println!("  {:<14} {}", "Status", status);
    println!("  {:<14} {} MB (-5% margin)", "Limit", limit_mb);
    if let Some(total) = outcome.total_size {
        println!("  {:<14} {}", "Total size", format_size(total, DECIMAL));
    }
    println!("  {:<14} {}", "Rounds", outcome.rounds);
    println!("  {:<14} {:.2?}", "Time", elapsed);
    println!();

    for (input, output) in files.iter().zip(outcome.attachments.iter()) {
        let size = std::fs::metadata(output)
            .map(|m| format_size(m.len(), DECIMAL))
            .unwrap_or_else(|_| "?".to_string());
        if input == output {
            println!("  {:>10}  {}", size, input.display());
        } else {
            println!(
                "  {:>10}  {} -> {}",
                size,
                input.display(),
                output.display()
            );
        }
    }
    println!();
}

/// Print the outcome as JSON.
fn print_outcome_json(
    files: &[PathBuf],
    outcome: &ReduceOutcome,
    limit_mb: f64,
) -> anyhow::Result<()> {
    let items: Vec<serde_json::Value> = files
        .iter()
        .zip(outcome.attachments.iter())
        .map(|(input, output)| {
            serde_json::json!({
                "input": input.to_string_lossy(),
                "output": output.to_string_lossy(),
                "resized": input != output,
                "size": std::fs::metadata(output).map(|m| m.len()).ok(),
            })
        })
        .collect();

    let report = serde_json::json!({
        "status": outcome.status,
        "limit_mb": limit_mb,
        "total_size": outcome.total_size,
        "rounds": outcome.rounds,
        "attachments": items,
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
