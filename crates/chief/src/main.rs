// # chief - declarative DNS zone reconciler
//
// Thin integration layer: flags and environment, logging, signal handling
// and exit codes. All reconciliation logic lives in chief-core.
//
// ## Usage
//
// ```bash
// export CLOUDFLARE_API_TOKEN=your_token
//
// # Dump the live zone as a declarative baseline (chief.yml)
// chief --zone example.com import
//
// # Reconcile the zone against every *.yml / *.yaml file in ./records
// chief --zone example.com sync --dir ./records --dry-run
// chief --zone example.com sync --dir ./records
// ```
//
// ## Configuration
//
// ### Credentials
// - `CLOUDFLARE_API_TOKEN`: scoped API token (preferred)
// - `EMAIL` + `API_KEY`: legacy global API key
//
// ### Flags (each also readable from the environment)
// - `--zone` / `CHIEF_ZONE`: zone to reconcile
// - `--timeout-secs` / `CHIEF_TIMEOUT_SECS`: budget for every provider call
// - `--log-level` / `CHIEF_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Exit codes
//
// - 0: success (advisories do not change this)
// - 1: configuration error (credentials, flags, record files, invalid state)
// - 2: zone not found
// - 3: provider or runtime error
// - 130: cancelled by SIGINT / SIGTERM

use anyhow::{Context, Result};
use chief_core::config::{CloudflareCredentials, ProviderConfig, RunSettings};
use chief_core::source::{self, DEFAULT_IMPORT_FILE};
use chief_core::{ErrorCategory, ProviderRegistry, Runner, ShutdownSignal, ShutdownTrigger};
use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChiefExitCode {
    /// Run finished
    Success = 0,
    /// Configuration error, nothing was changed
    ConfigError = 1,
    /// The requested zone does not exist
    ZoneNotFound = 2,
    /// Provider or runtime failure
    RuntimeError = 3,
    /// Interrupted by a signal
    Cancelled = 130,
}

impl From<ChiefExitCode> for ExitCode {
    fn from(code: ChiefExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<ErrorCategory> for ChiefExitCode {
    fn from(category: ErrorCategory) -> Self {
        match category {
            ErrorCategory::Config => ChiefExitCode::ConfigError,
            ErrorCategory::ZoneNotFound => ChiefExitCode::ZoneNotFound,
            ErrorCategory::Provider => ChiefExitCode::RuntimeError,
            ErrorCategory::Cancelled => ChiefExitCode::Cancelled,
        }
    }
}

/// Pick the exit code for a failed run
///
/// Glue errors that never reached the core (missing credentials, bad
/// flags) are configuration errors.
fn exit_code_for(err: &anyhow::Error) -> ChiefExitCode {
    err.downcast_ref::<chief_core::Error>()
        .map(|e| e.category().into())
        .unwrap_or(ChiefExitCode::ConfigError)
}

#[derive(Debug, Parser)]
#[command(name = "chief", version, about = "Reconcile a DNS zone against declarative YAML records")]
struct Cli {
    /// Zone to operate on, e.g. example.com
    #[arg(long, env = "CHIEF_ZONE")]
    zone: String,

    /// Time budget for every provider call, in seconds
    #[arg(long, env = "CHIEF_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, env = "CHIEF_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile the zone against the declared records
    Sync {
        /// Directory holding *.yml / *.yaml record files
        #[arg(long, env = "CHIEF_DIR", default_value = ".")]
        dir: PathBuf,

        /// Report what would change without changing anything
        #[arg(long, env = "CHIEF_DRY_RUN")]
        dry_run: bool,
    },

    /// Dump the zone's current records as a declarative baseline
    Import {
        /// File to write
        #[arg(long, env = "CHIEF_OUTPUT", default_value = DEFAULT_IMPORT_FILE)]
        output: PathBuf,
    },
}

impl Cli {
    fn run_settings(&self) -> RunSettings {
        let dry_run = matches!(self.command, Command::Sync { dry_run: true, .. });
        RunSettings::default()
            .with_call_timeout_secs(self.timeout_secs)
            .with_dry_run(dry_run)
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "CHIEF_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Read Cloudflare credentials from the environment
///
/// A scoped token wins over the legacy email/key pair.
fn credentials_from_env() -> Result<CloudflareCredentials> {
    if let Ok(token) = env::var("CLOUDFLARE_API_TOKEN")
        && !token.is_empty()
    {
        return Ok(CloudflareCredentials::ApiToken { token });
    }

    match (env::var("EMAIL"), env::var("API_KEY")) {
        (Ok(email), Ok(key)) if !email.is_empty() && !key.is_empty() => {
            Ok(CloudflareCredentials::GlobalKey { email, key })
        }
        _ => anyhow::bail!(
            "Cloudflare credentials are required. \
            Set CLOUDFLARE_API_TOKEN, or EMAIL and API_KEY"
        ),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match parse_log_level(&cli.log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ChiefExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ChiefExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ChiefExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match run(cli).await {
            Ok(()) => ChiefExitCode::Success,
            Err(e) => {
                error!("{:#}", e);
                exit_code_for(&e)
            }
        }
    });

    code.into()
}

/// Run one sync or import
async fn run(cli: Cli) -> Result<()> {
    let settings = cli.run_settings();

    let registry = ProviderRegistry::new();

    #[cfg(feature = "cloudflare")]
    chief_provider_cloudflare::register(&registry);

    let provider_config = ProviderConfig::Cloudflare {
        credentials: credentials_from_env()?,
        base_url: None,
        request_timeout_secs: settings.call_timeout_secs,
    };
    let provider = registry.create_provider(&provider_config)?;
    info!("Using {} provider for zone {}", provider.provider_name(), cli.zone);

    let runner = Runner::new(provider, settings)?;

    let (trigger, shutdown) = ShutdownSignal::channel();
    tokio::spawn(forward_shutdown(trigger));

    match cli.command {
        Command::Sync { dir, dry_run } => {
            let declared = source::load_dir(&dir)
                .await
                .with_context(|| format!("Failed to load records from {}", dir.display()))?;

            let report = runner.sync(&cli.zone, &declared, shutdown).await?;

            if dry_run {
                info!("[dry-run] no changes were sent");
            }
            info!("Sync complete: {}", report.stats);
        }
        Command::Import { output } => {
            let written = runner.import(&cli.zone, &output, shutdown).await?;
            info!("Import complete: {} records in {}", written, output.display());
        }
    }

    Ok(())
}

/// Trigger shutdown on the first SIGTERM / SIGINT
async fn forward_shutdown(trigger: ShutdownTrigger) {
    match wait_for_signal().await {
        Ok(signal) => {
            warn!("Received {}, stopping after the current call", signal);
            trigger.trigger();
        }
        Err(e) => error!("Signal handling unavailable: {}", e),
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Fallback implementation for non-Unix platforms
#[cfg(not(unix))]
async fn wait_for_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
