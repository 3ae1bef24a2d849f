//! Gallery Log Read Tool
//!
//! Authenticates the reader, verifies the whole chain and only then
//! answers presence queries.

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gallery_log::audit::{parse_entries, verify_lines};
use gallery_log::auth::{authorize, Role};
use gallery_log::config::AppConfig;
use gallery_log::query::{present_in_room, rooms_for_actor};
use gallery_log::security_events::{SecurityAuditor, SecurityEvent};
use gallery_log::{GalleryLog, GalleryLogError, LogEntry};

const TOOL: &str = "logread";

#[derive(Parser)]
#[command(name = "logread")]
#[command(about = "Verify the gallery log and query room presence")]
#[command(version)]
struct Cli {
    /// Only check the hash chain
    #[arg(long)]
    verify_integrity: bool,

    /// Room to query
    #[arg(long)]
    room: Option<String>,

    /// List actors currently present in --room
    #[arg(long, requires = "room")]
    present: bool,

    /// List rooms an actor is currently in
    #[arg(long, conflicts_with = "room")]
    actor: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

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
        "gallery_log=debug,logread=debug"
    } else {
        "gallery_log=warn,logread=warn"
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

    let provided = std::env::var(Role::Reader.token_env()).ok();
    if let Err(e) = authorize(Role::Reader, provided.as_deref(), config.reader_token.as_deref()) {
        if matches!(e, GalleryLogError::Unauthorized) {
            auditor.record(TOOL, SecurityEvent::InvalidToken);
        }
        return Err(e.into());
    }

    let key = config.integrity_key()?;
    let log = GalleryLog::new(cli.log.clone().unwrap_or(config.log_path));
    let lines = log.read_lines()?;

    let report = verify_lines(&lines, &key);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    if !report.is_valid() {
        auditor.record(TOOL, SecurityEvent::IntegrityFail);
    }
    let report = report.into_result()?;
    info!("{}", report.summary());

    if cli.verify_integrity {
        if !cli.json {
            println!("Log integrity OK.");
        }
        return Ok(());
    }

    let entries: Vec<LogEntry> = parse_entries(&lines)?;
    answer_query(cli, &entries)
}

fn answer_query(cli: &Cli, entries: &[LogEntry]) -> Result<()> {
    if let (Some(room), true) = (cli.room.as_deref(), cli.present) {
        let present = present_in_room(entries, room);
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&json!({ "room": room, "present": present }))?);
        } else {
            println!("Present in {}:", room);
            for actor in &present {
                println!(" - {}", actor);
            }
        }
        return Ok(());
    }

    if let Some(actor) = cli.actor.as_deref() {
        let rooms = rooms_for_actor(entries, actor);
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&json!({ "actor": actor, "rooms": rooms }))?);
        } else {
            println!("Rooms occupied by {}:", actor);
            for room in &rooms {
                println!(" - {}", room);
            }
        }
        return Ok(());
    }

    println!("No query or unsupported query.");
    Ok(())
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
                    debug!("logread failed: {}", err);
                    err.user_message()
                }
                None => {
                    error!("Unexpected failure in logread");
                    auditor.record(TOOL, SecurityEvent::Exception);
                    "Internal error."
                }
            };
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}
