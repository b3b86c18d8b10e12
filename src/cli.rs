//! Command-line entry points. Each subcommand prints its result as JSON on
//! stdout; diagnostics go to stderr through `tracing`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::{
    ProjectPayload, SimulatePayload, build_project_response, projection_params_from_payload,
    run_http_server, run_simulate_request, simulate_request_from_payload,
};
use crate::core::{MonteCarloSimulator, SimulationError};
use crate::history::{HistoryError, load_statistics};

#[derive(Parser, Debug)]
#[command(
    name = "planner",
    about = "Personal finance planner: yearly projections and Monte Carlo simulations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON HTTP API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(
            long,
            env = "PLANNER_PRICES",
            help = "Historical price CSV (newest first, price in the second column)"
        )]
        prices: Option<PathBuf>,
    },
    /// Run the deterministic yearly projection.
    Project {
        #[arg(long, help = "JSON projection payload; defaults when omitted")]
        input: Option<PathBuf>,
    },
    /// Run the Monte Carlo simulation against historical returns.
    Simulate {
        #[arg(long, env = "PLANNER_PRICES")]
        prices: PathBuf,
        #[arg(long, help = "JSON simulation payload; defaults when omitted")]
        input: Option<PathBuf>,
        #[arg(long, help = "Overrides the payload's simulation count")]
        simulations: Option<u32>,
        #[arg(long, help = "Overrides the payload's RNG seed")]
        seed: Option<u64>,
    },
    /// Print the daily return statistics of a price file.
    Stats {
        #[arg(long, env = "PLANNER_PRICES")]
        prices: PathBuf,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Input { path: String, source: io::Error },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid parameters: {0}")]
    Parameters(String),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),

    #[error("server error: {0}")]
    Server(#[source] io::Error),
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Serve { port, prices } => {
            let stats = match prices {
                Some(path) => match load_statistics(&path) {
                    Ok(stats) => Some(stats),
                    Err(err) => {
                        warn!(error = %err, "serving without return statistics");
                        None
                    }
                },
                None => None,
            };
            run_http_server(port, stats).await.map_err(CliError::Server)
        }
        Command::Project { input } => {
            let payload: ProjectPayload = read_payload(input.as_deref())?;
            let params = projection_params_from_payload(payload).map_err(CliError::Parameters)?;
            print_json(&build_project_response(&params))
        }
        Command::Simulate {
            prices,
            input,
            simulations,
            seed,
        } => {
            let mut payload: SimulatePayload = read_payload(input.as_deref())?;
            if simulations.is_some() {
                payload.simulations = simulations;
            }
            if seed.is_some() {
                payload.seed = seed;
            }
            let request = simulate_request_from_payload(payload).map_err(CliError::Parameters)?;
            let stats = load_statistics(&prices)?;

            info!(
                simulations = request.simulations,
                horizon_years = request.params.horizon_years(),
                "running monte carlo simulation"
            );
            let simulator = MonteCarloSimulator::new();
            let response =
                run_simulate_request(&simulator, &stats, &request, &CancellationToken::new())
                    .await?;
            print_json(&response)
        }
        Command::Stats { prices } => print_json(&load_statistics(&prices)?),
    }
}

fn read_payload<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T, CliError> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = fs::read_to_string(path).map_err(|source| CliError::Input {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.display().to_string(),
        source,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)
        .map_err(|err| CliError::Output(err.into()))?;
    writeln!(stdout).map_err(CliError::Output)
}
