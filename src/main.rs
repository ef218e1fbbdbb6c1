//! CLI binary for notification-extractor.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use notification_extractor::config::{AttachmentMode, Config, LogConfig};
use notification_extractor::{Error, NotificationExtractor, Result};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Notification extractor - writes queued notifications and their attachments to disk.
#[derive(Parser, Debug)]
#[command(name = "notification-extractor")]
#[command(version, about = "Writes queued notifications and their attachments to disk")]
struct Args {
    /// Path to the TOML configuration file
    config: PathBuf,

    /// Leave processed records in the queue
    #[arg(short, long)]
    read_only: bool,

    /// Do not fetch or write attachments
    #[arg(long, conflicts_with = "limit_attachments")]
    no_attachments: bool,

    /// Fetch at most this many attachments per notification
    #[arg(long, value_name = "N")]
    limit_attachments: Option<u32>,
}

impl Args {
    /// Layer command line flags over the file configuration
    fn apply(&self, config: &mut Config) {
        if self.read_only {
            config.processing.read_only = true;
        }
        if self.no_attachments {
            config.processing.attachments = AttachmentMode::Ignore;
        } else if let Some(limit) = self.limit_attachments {
            config.processing.attachments = AttachmentMode::Limit(limit);
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::from_file(&args.config) {
        Ok(mut config) => {
            args.apply(&mut config);
            config
        }
        Err(e) => {
            // Logging is configured by the file we failed to read
            let _ = init_logging(&LogConfig::default(), "");
            error!(config = %args.config.display(), "{}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = match init_logging(&config.logging, &config.log_file_name()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("notification-extractor: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(fatal = e.is_fatal(), "Extraction aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> Result<()> {
    info!(
        customer_tool = %config.customer_tool,
        database = %config.database.path.display(),
        "Starting notification extractor"
    );

    let extractor = NotificationExtractor::new(config).await?;
    extractor.run().await?;
    Ok(())
}

/// Install the global subscriber: stdout always, plus a log file when
/// `log_path` is configured. The returned guard flushes the file on drop.
fn init_logging(logging: &LogConfig, file_name: &str) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| Error::config("logging.level", e.to_string()))?;

    let (file_layer, guard) = match &logging.log_path {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(file_name)
                .build(dir)
                .map_err(|e| {
                    Error::config(
                        "logging.log_path",
                        format!("cannot open log file in {}: {}", dir.display(), e),
                    )
                })?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Other(format!("failed to install logger: {}", e)))?;

    Ok(guard)
}
