//! Terminal client for the Stockroom inventory dashboard.
//!
//! Logs in against the dashboard's authentication API, keeps the session on
//! disk between runs, and lets you move around the dashboard's routes.

use anyhow::{Context, Result};
use pico_args::Arguments;
use std::io::{self, Write};
use std::path::PathBuf;
use stockroom_client::{
    app::{self, ConsoleApp, Flow},
    commands::parse_command,
    config::{ClientConfig, Overrides},
    logging,
};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Terminal client for the Stockroom inventory dashboard

USAGE:
  stockroom_client [OPTIONS]

OPTIONS:
  --api-url URL         API root     [default: http://localhost:3000/api]
  --session-dir DIR     Session directory  [default: .stockroom]
  --catalog FILE        JSON search index to load

FLAGS:
  --ephemeral           Keep the session in memory only
  -h, --help            Print help information

ENVIRONMENT:
  STOCKROOM_API_URL, STOCKROOM_SESSION_DIR, STOCKROOM_HTTP_TIMEOUT_SECS,
  STOCKROOM_CATALOG, RUST_LOG
";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        api_url: pargs.opt_value_from_str("--api-url")?,
        session_dir: pargs.opt_value_from_os_str("--session-dir", |s| {
            Ok::<_, std::convert::Infallible>(PathBuf::from(s))
        })?,
        catalog: pargs.opt_value_from_os_str("--catalog", |s| {
            Ok::<_, std::convert::Infallible>(PathBuf::from(s))
        })?,
        ephemeral: pargs.contains("--ephemeral"),
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {remaining:?}");
    }

    logging::init();

    let config = ClientConfig::from_env(overrides).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    run(config).await
}

async fn run(config: ClientConfig) -> Result<()> {
    tracing::info!(api_url = %config.api_url, "Starting Stockroom client");

    let catalog = config
        .catalog
        .as_deref()
        .map(app::load_catalog)
        .transpose()?;
    let auth = app::build_controller(&config).context("Failed to create API client")?;
    let mut console = ConsoleApp::new(auth, catalog);

    let mut stdout = io::stdout();
    console.show_current(&mut stdout)?;
    println!("Type 'help' to see available commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", console.prompt());
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            // EOF
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        if console.execute(command, &mut stdout).await? == Flow::Quit {
            break;
        }
    }

    println!("Goodbye!");
    Ok(())
}
