use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};

use inbox_triage::auth::session::{Session, SessionManager};
use inbox_triage::auth::token_store;
use inbox_triage::config::{Config, load_config};
use inbox_triage::daemon::{WatchConfig, run_watch};
use inbox_triage::generate::GenerationClient;
use inbox_triage::generate::backend::CommandBackend;
use inbox_triage::generate::prompt::PromptBuilder;
use inbox_triage::mail::gmail::GmailClient;
use inbox_triage::pipeline::{Scheduling, Triage};
use inbox_triage::schedule::calendar::GoogleCalendar;
use inbox_triage::schedule::recognize::PhraseRecognizer;
use inbox_triage::schedule::{CalendarEventBuilder, EventExtractor};

#[derive(Parser)]
#[command(name = "inbox_triage")]
#[command(about = "Summarize, acknowledge and schedule unread mail", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Triage the unread inbox once
    Run,

    /// Triage repeatedly until Ctrl-C
    Watch {
        #[arg(long, default_value_t = 300)]
        interval: u64,
    },

    /// Run the browser consent flow and cache the new tokens
    Login,

    /// Store the OAuth client secret in keyring
    SetClientSecret {
        #[arg(long)]
        client_id: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::SetClientSecret { client_id } => {
            eprintln!("Paste client secret (end with Ctrl-D):");
            let mut secret = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut secret)?;
            token_store::save_client_secret(&client_id, secret.trim())?;
            println!("Saved client secret for client_id {client_id}");
            Ok(())
        }

        Command::Login => {
            let cfg = load()?;
            SessionManager::from_config(&cfg)?.login()?;
            println!("Login complete for {}", cfg.user_email.unwrap_or_default());
            Ok(())
        }

        Command::Run => {
            let cfg = load()?;
            let sessions = SessionManager::from_config(&cfg)?;
            triage_pass(&cfg, sessions.open_session()?)
        }

        Command::Watch { interval } => {
            let cfg = load()?;
            let sessions = SessionManager::from_config(&cfg)?;
            run_watch(
                WatchConfig {
                    interval_secs: interval,
                },
                || triage_pass(&cfg, sessions.open_session()?),
            )
        }
    }
}

fn load() -> Result<Config> {
    load_config().map_err(|e| anyhow!("Configuration error: {e}"))
}

fn triage_pass(cfg: &Config, session: Session) -> Result<()> {
    let gmail = match &cfg.api.gmail_base_url {
        Some(url) => GmailClient::with_base_url(session.clone(), url.as_str())?,
        None => GmailClient::new(session.clone())?,
    };
    let calendar = match &cfg.api.calendar_base_url {
        Some(url) => GoogleCalendar::with_base_url(session, url.as_str())?,
        None => GoogleCalendar::new(session)?,
    };

    let scheduling = if cfg.calendar.enabled {
        Some(Scheduling {
            calendar: &calendar,
            extractor: EventExtractor::new(
                Box::new(PhraseRecognizer),
                cfg.calendar.offset()?,
            ),
            builder: CalendarEventBuilder::new(
                cfg.calendar.calendar_id.as_str(),
                cfg.calendar.time_zone.as_str(),
            ),
        })
    } else {
        None
    };

    let backend = CommandBackend::new(
        cfg.generation.program.as_str(),
        cfg.generation.args.clone(),
        cfg.generation.prompt_via,
    );

    let report = Triage::new(
        &gmail,
        PromptBuilder::new(cfg.owner_name.as_str()),
        GenerationClient::new(Box::new(backend), cfg.fallbacks()),
        scheduling,
    )
    .with_fallback_address(cfg.user_email.clone())
    .with_signature(cfg.generation.signature.clone())
    .run_once();

    println!("Found {} unread emails.", report.found);
    if !report.skipped.is_empty() {
        println!("Skipped {} that could not be fetched.", report.skipped.len());
    }
    Ok(())
}
