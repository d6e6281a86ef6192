//! CLI entry point for `emlstamp`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use emlstamp::archive::{ArchiveWalker, WalkSummary};
use emlstamp::config::{Config, MissingDatePolicy};
use emlstamp::parser::mbox::BoundaryStyle;
use emlstamp::sink::LogSink;
use emlstamp::store::LocalFs;

#[derive(Parser)]
#[command(name = "emlstamp", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Archive root to process. Defaults to the directory of this executable.
    #[arg(value_name = "ROOT")]
    root: Option<PathBuf>,

    /// What to do with mailbox messages that have no usable Date header
    #[arg(long, value_enum, value_name = "POLICY")]
    missing_date: Option<MissingDatePolicy>,

    /// Which lines start a new message inside a mailbox
    #[arg(long, value_enum, value_name = "STYLE")]
    boundary: Option<BoundaryStyle>,

    /// Write split messages under this directory instead of next to each mailbox
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

/// Prints report lines above the spinner.
struct ProgressSink {
    bar: ProgressBar,
}

impl LogSink for ProgressSink {
    fn log(&mut self, line: &str) {
        self.bar.suspend(|| println!("{line}"));
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Completions { shell }) => return exit_with(cmd_completions(*shell)),
        Some(Commands::Manpage) => return exit_with(cmd_manpage()),
        None => {}
    }

    let mut config = emlstamp::config::load_config();
    apply_overrides(&cli, &mut config);

    let log_level = match cli.verbose {
        0 => config.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    setup_logging(&log_level, &config);

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {elapsed} {wide_msg}")
            .expect("valid template"),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    let mut sink = ProgressSink { bar: bar.clone() };
    let result = cmd_stamp(&cli, &config, &mut sink, &bar);
    bar.finish_and_clear();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Run aborted");
            sink.log(&format!("ERROR: {e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn exit_with(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Command-line flags win over the config file.
fn apply_overrides(cli: &Cli, config: &mut Config) {
    if let Some(policy) = cli.missing_date {
        config.split.missing_date = policy;
    }
    if let Some(boundary) = cli.boundary {
        config.split.boundary = boundary;
    }
    if let Some(ref output) = cli.output {
        config.split.output_root = Some(output.clone());
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = emlstamp::config::cache_dir(config);
    if config.general.log_to_file && std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "emlstamp.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// The directory holding the running executable.
fn default_root() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("Cannot determine the directory of {}", exe.display()))
}

/// Walk the archive root and print a summary.
fn cmd_stamp(
    cli: &Cli,
    config: &Config,
    sink: &mut ProgressSink,
    bar: &ProgressBar,
) -> anyhow::Result<()> {
    let root = match cli.root {
        Some(ref root) => root.clone(),
        None => default_root()?,
    };
    tracing::info!(root = %root.display(), "Processing archive");

    let start = Instant::now();
    let progress_bar = bar.clone();
    let mut walker = ArchiveWalker::new(LocalFs::new(), sink, config)
        .with_progress(move |dir| progress_bar.set_message(dir.display().to_string()));
    let summary = walker.walk(&root)?;
    let elapsed = start.elapsed();

    bar.finish_and_clear();
    if cli.json {
        print_summary_json(&root, &summary, elapsed)?;
    } else {
        print_summary_table(&root, &summary, elapsed);
    }
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "emlstamp", &mut std::io::stdout());
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

/// Print the run summary in a human-readable table.
fn print_summary_table(root: &Path, summary: &WalkSummary, elapsed: Duration) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<22} {}", "Archive root", root.display());
    println!("  {:<22} {}", "Directories", summary.directories);
    println!("  {:<22} {}", "Mailboxes split", summary.mailboxes);
    println!(
        "  {:<22} {} of {}",
        "Messages written", summary.messages_written, summary.messages
    );
    println!(
        "  {:<22} {}",
        "Bytes written",
        format_size(summary.bytes_written, BINARY)
    );
    println!("  {:<22} {}", "Files retouched", summary.retouched);
    println!("  {:<22} {}", "Already existing", summary.already_existing);
    println!("  {:<22} {}", "Without date", summary.undated);
    println!("  {:<22} {}", "Failed", summary.failed);
    println!("  {:<22} {:.2?}", "Time", elapsed);
    println!();
}

/// Print the run summary as JSON.
fn print_summary_json(root: &Path, summary: &WalkSummary, elapsed: Duration) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "root": root.to_string_lossy(),
        "summary": summary,
        "elapsed_ms": elapsed.as_millis(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
