use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod auth;
pub mod calendars;
pub mod chat;

use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Start a planning session
    Chat {},
    /// Authorize access to Google Calendar and save the credential
    Auth {
        /// Run the consent flow even if a credential is already saved
        #[arg(long, action, default_value = "false")]
        force: bool,
    },
    /// List the calendars the saved credential can see
    Calendars {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

fn init_tracing() {
    // Logs go to stderr so they don't interleave with the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=warn", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    init_tracing();

    let config = AppConfig::from_env()?;

    // Handle each sub command
    match args.command {
        Some(Command::Chat {}) | None => {
            chat::run(&config).await?;
        }
        Some(Command::Auth { force }) => {
            auth::run(&config, force).await?;
        }
        Some(Command::Calendars {}) => {
            calendars::run(&config).await?;
        }
    }

    Ok(())
}
