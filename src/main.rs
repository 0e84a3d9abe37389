use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use trainbot::agent::{BotConfig, Dispatcher};
use trainbot::api::ApiClient;
use trainbot::channels::blaze::BlazeChannel;
use trainbot::config::Config;

#[derive(Debug, Parser)]
#[command(name = "trainbot", version, about = "Mixin Messenger bot")]
struct Cli {
    /// Path to the credential bundle.
    #[arg(default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trainbot=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            error!(path = %cli.config.display(), %err, "cannot load credentials");
            return ExitCode::FAILURE;
        }
    };

    let api = match ApiClient::new(&config) {
        Ok(api) => Arc::new(api),
        Err(err) => {
            error!(%err, "cannot build api client");
            return ExitCode::FAILURE;
        }
    };

    let dispatcher = Dispatcher::new(api.clone(), BotConfig::new(config.client_id.clone()));
    let channel = BlazeChannel::new(config.client_id.clone(), api, dispatcher);
    channel.run().await;

    ExitCode::SUCCESS
}
