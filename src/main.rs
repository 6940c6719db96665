use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use api_probe::cli::{Cli, Commands};
use api_probe::client::{ApiClient, FixtureClient, HttpApiClient};
use api_probe::config::loader::resolve_config;
use api_probe::probe::ProbeRunner;
use api_probe::report;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let mut config =
        resolve_config(cli.config.as_deref()).context("Failed to load probe configuration")?;
    cli.apply_overrides(&mut config)?;

    if cli.command == Some(Commands::List) {
        print!("{}", report::render_checks(&config.checks));
        return Ok(ExitCode::SUCCESS);
    }

    let client: Box<dyn ApiClient> = match &cli.fixtures {
        Some(dir) => {
            info!("Serving responses from fixtures in {}", dir.display());
            Box::new(FixtureClient::new(dir.clone()))
        }
        None => {
            info!("Calling API gateway at {}", config.api.base_url);
            Box::new(HttpApiClient::new(&config.api).context("Failed to build API client")?)
        }
    };

    let runner = ProbeRunner::with_dump_limit(client.as_ref(), config.api.dump_limit);
    let probe_report = runner.run(&config.checks).await;

    print!("{}", report::render_report(&probe_report));

    if cli.strict && !probe_report.all_passed() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
