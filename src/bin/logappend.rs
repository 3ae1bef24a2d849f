//! Gallery Log Append Tool
//!
//! Authenticates the writer, validates the entry and appends it to the
//! chained gallery log.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gallery_log::auth::{authorize, Role};
use gallery_log::config::AppConfig;
use gallery_log::security_events::{SecurityAuditor, SecurityEvent};
use gallery_log::validation::validate_entry;
use gallery_log::{GalleryLog, GalleryLogError};

const TOOL: &str = "logappend";

#[derive(Parser)]
#[command(name = "logappend")]
#[command(about = "Append an entry to the tamper-evident gallery log")]
#[command(version)]
struct Cli {
    /// Who entered or left (letters, digits, '_' and '-')
    #[arg(long)]
    actor: String,

    /// enter or exit
    #[arg(long)]
    action: String,

    /// Room identifier
    #[arg(long)]
    room: String,

    /// UTC timestamp, YYYY-MM-DDTHH:MM:SSZ
    #[arg(long)]
    time: String,

    /// Log file (overrides configuration)
    #[arg(long)]
    log: Option<PathBuf>,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "gallery_log=debug,logappend=debug"
    } else {
        "gallery_log=warn,logappend=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli, auditor: &mut SecurityAuditor) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    *auditor = SecurityAuditor::new(&config.audit_log_path);

    let provided = std::env::var(Role::Writer.token_env()).ok();
    if let Err(e) = authorize(Role::Writer, provided.as_deref(), config.writer_token.as_deref()) {
        if matches!(e, GalleryLogError::Unauthorized) {
            auditor.record(TOOL, SecurityEvent::InvalidToken);
        }
        return Err(e.into());
    }

    let fields = match validate_entry(&cli.actor, &cli.action, &cli.room, &cli.time) {
        Ok(fields) => fields,
        Err(e) => {
            auditor.record(TOOL, SecurityEvent::InvalidInput);
            return Err(e.into());
        }
    };

    let key = config.integrity_key()?;
    let log = GalleryLog::new(cli.log.clone().unwrap_or(config.log_path));

    match log.append(&fields, &key) {
        Ok(entry) => {
            info!("Appended entry for {} in {}", entry.actor, entry.room);
            Ok(())
        }
        Err(e) => {
            auditor.record(TOOL, SecurityEvent::WriteFail);
            Err(e.into())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut auditor = SecurityAuditor::new("audit.log");
    match run(&cli, &mut auditor) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = match e.downcast_ref::<GalleryLogError>() {
                Some(err) => {
                    debug!("logappend failed: {}", err);
                    err.user_message()
                }
                None => {
                    error!("Unexpected failure in logappend");
                    auditor.record(TOOL, SecurityEvent::Exception);
                    "Internal error."
                }
            };
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}
