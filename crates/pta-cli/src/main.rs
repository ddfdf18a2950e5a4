//! CLI entry point for the pta test auto-runner.
//!
//! `pta` runs the project's tests once, then watches the directory tree and
//! re-runs them whenever a tracked source file is modified.
//!
//! # Usage
//!
//! ```bash
//! pta [OPTIONS] [-- <TEST ARGS>...]
//!
//! # Watch the current Go module
//! pta
//!
//! # Watch another directory, forwarding flags to `go test`
//! pta --path ./service -- -race ./...
//!
//! # Only the top-level directory, with debug logging
//! pta --no-recursive --verbose
//! ```
//!
//! The first CTRL-C schedules a re-run; a second one within the delay exits.

#![deny(clippy::all)]
#![warn(missing_docs)]

use camino::Utf8PathBuf;
use clap::Parser;
use pta_core::Config;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Re-run the test suite whenever a source file changes.
///
/// Tests run once at startup and again after every modification of a tracked
/// file under the watched directory. Bursts of saves to the same file within
/// one second count as a single change.
#[derive(Parser)]
#[command(name = "pta", version, about, long_about = None)]
struct Cli {
    /// Directory to watch; the test command runs here too.
    #[arg(short, long, env = "PTA_PATH", default_value = "./")]
    path: Utf8PathBuf,

    /// Test tool to invoke as `<PROGRAM> test [TEST ARGS]...`.
    #[arg(long, env = "PTA_PROGRAM", default_value = "go")]
    program: String,

    /// File extension that marks a tracked source file.
    #[arg(short, long, env = "PTA_EXTENSION", default_value = "go")]
    extension: String,

    /// Watch only the top-level directory.
    #[arg(long)]
    no_recursive: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,

    /// Arguments forwarded verbatim to the test command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "TEST ARGS")]
    args: Vec<String>,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
/// Noisy crates like `notify` and `mio` are filtered to `warn` level.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},mio=warn,notify=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Builds a validated [`Config`] from CLI arguments.
///
/// # Errors
///
/// Returns an error if the path doesn't exist or isn't a directory, or if
/// the program or extension is empty.
fn build_config(cli: Cli) -> color_eyre::Result<Config> {
    let mut config = Config::default();
    config.watch.path = cli.path;
    config.watch.extension = cli.extension;
    config.watch.recursive = !cli.no_recursive;
    config.runner.program = cli.program;
    config.runner.args = cli.args;

    config.validate()?;
    Ok(config)
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Build and validate configuration
    let config = build_config(cli)?;

    info!(
        path = %config.watch.path,
        program = %config.runner.program,
        recursive = config.watch.recursive,
        "Starting test auto-runner"
    );

    pta_app::run(config).await?;

    info!("Shut down");
    Ok(())
}
