use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod config;
mod dispatch;
mod error;
mod exec;
mod feed;
mod fetch;
mod sync;
mod telemetry;
mod template;

use config::ConfigStore;

#[derive(Parser)]
#[command(name = "rssd", about = "Run a command whenever a watched feed publishes a new entry")]
struct Cli {
    /// Path to the config file [default: $XDG_CONFIG_HOME/rssd/config.json]
    #[arg(global = true, long)]
    config: Option<PathBuf>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,
    /// Fetch and expand, but do not run commands or save watermarks
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a new feed
    AddFeed { url: String },
    /// List watched feeds and their last seen entry
    ListFeed,
    /// Set the command run for each new entry
    SetExec { command: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);
    telemetry::config::init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            let code = err.downcast_ref::<error::Error>().map_or(1, error::Error::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store = ConfigStore::new(config::path::resolve(cli.config)?);
    if store.bootstrap()? {
        tracing::info!(path = %store.path().display(), "created empty config");
    }

    match cli.command {
        None => sync::run(&store, cli.dry_run).await?,
        Some(Commands::AddFeed { url }) => feed::add_feed(&store, url)?,
        Some(Commands::ListFeed) => feed::ls_feeds(&store)?,
        Some(Commands::SetExec { command }) => exec::set_exec(&store, command)?,
    }
    Ok(())
}
