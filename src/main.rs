mod api;
mod cli;
mod commands;
mod config;
mod error;
mod orchestrator;
mod translation;
mod ui;

use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use api::DiagnosticClient;
use cli::Cli;
use commands::Context;
use config::Settings;
use error::{DiagError, codes};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load().map_err(config_error)?;

    let edgerc = match cli.config.clone() {
        Some(path) => path,
        None => config::default_edgerc_path()
            .context("could not determine the home directory; pass --config")
            .map_err(config_error)?,
    };
    let credentials = config::load_credentials(&edgerc, &cli.section).map_err(config_error)?;
    tracing::debug!(host = %credentials.host, section = %cli.section, "credentials loaded");

    let client = DiagnosticClient::new(credentials, settings.request_timeout())
        .map_err(DiagError::from)?;
    let ctx = Context {
        client: &client,
        settings: &settings,
        debug: cli.debug,
    };
    commands::dispatch(&ctx, cli.command).await?;
    Ok(())
}

fn config_error(err: anyhow::Error) -> DiagError {
    DiagError::Config(format!("{err:#}"))
}

fn report(err: &anyhow::Error) -> ExitCode {
    let diag = err.downcast_ref::<DiagError>();
    if let Some(body) = diag.and_then(DiagError::server_body) {
        let _ = ui::print_body(body);
    }
    ui::print_error(&err.to_string());
    ExitCode::from(diag.map_or(codes::FAILURE, DiagError::exit_code))
}
