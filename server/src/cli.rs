use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use explainer_core::{explain_deck, Config, JobRunner, OpenAiClient, ResultStore, Settings};

use crate::api::AppState;
use crate::client::ExplainerClient;

const API_KEY_VAR: &str = "OPENAI_API_KEY";
const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

#[derive(Parser, Debug)]
#[command(name = "slide-explainer")]
#[command(about = "Per-slide LLM explanations for PPTX and PDF decks")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the upload/status HTTP server
    Serve {
        #[arg(long, default_value_t = 5000)]
        port: u16,
        /// Data directory (defaults to the platform data dir)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Explain a deck locally and write the JSON artifact
    Explain {
        path: PathBuf,
        /// Write the artifact here instead of next to the deck
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Upload a deck to a running server and print its uid
    Upload {
        path: PathBuf,
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
    /// Show the status of an uploaded deck
    Status {
        uid: String,
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
        /// Poll until the job is done
        #[arg(long)]
        wait: bool,
    },
}

pub async fn run(command: Command) -> Result<()> {
    match command {
        Command::Serve { port, data_dir } => serve(port, data_dir).await,
        Command::Explain { path, output_dir } => explain(path, output_dir).await,
        Command::Upload { path, server } => {
            let uid = ExplainerClient::new(server).upload(&path).await?;
            println!("{uid}");
            Ok(())
        }
        Command::Status { uid, server, wait } => status(&uid, server, wait).await,
    }
}

fn api_key() -> Result<String> {
    std::env::var(API_KEY_VAR).with_context(|| format!("{API_KEY_VAR} is not set"))
}

fn build_runner(settings: &Settings) -> Result<JobRunner> {
    let client = OpenAiClient::new(settings.client_config(api_key()?));
    Ok(JobRunner::with_tokio_sleep(Arc::new(client), settings.job_policy()))
}

async fn serve(port: u16, data_dir: Option<PathBuf>) -> Result<()> {
    let config = match data_dir {
        Some(dir) => Config::with_data_dir(dir),
        None => Config::load_or_default(),
    };
    config
        .ensure_dirs()
        .context("Failed to create data directories")?;
    tracing::info!("Data directory: {:?}", config.data_dir);

    let settings = Settings::load(&config.settings_file);
    let runner = build_runner(&settings)?;
    let state = AppState::new(&config.uploads_dir, &config.outputs_dir, runner);

    crate::serve(state, SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await
}

async fn explain(path: PathBuf, output_dir: Option<PathBuf>) -> Result<()> {
    let settings = Settings::load(&Config::load_or_default().settings_file);
    let runner = build_runner(&settings)?;
    let store = match output_dir {
        Some(dir) => ResultStore::in_dir(dir),
        None => ResultStore::alongside(),
    };

    let (artifact, outcome) = explain_deck(&runner, &store, &path).await?;
    tracing::info!(
        "Explained {} slides ({} failed)",
        outcome.len(),
        outcome.failed_count()
    );
    println!("{}", artifact.display());
    Ok(())
}

async fn status(uid: &str, server: String, wait: bool) -> Result<()> {
    let client = ExplainerClient::new(server);
    let report = if wait {
        client
            .wait_until_done(uid, Duration::from_secs(5), Duration::from_secs(60 * 60))
            .await?
    } else {
        client.status(uid).await?
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
