//! # jet9-api
//!
//! `serve` runs the HTTP server over the compiled-in modules; `request`
//! sends one action call and prints the raw response.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use jet9_client::Jet9Client;
use jet9_rpc::{RouteTable, RouterBuilder};
use jet9_server::{Jet9Server, ServerConfig, RESERVED_PATHS};
use jet9_settings::Jet9Settings;
use serde_json::{Map, Value};

/// jet9 JSON-over-HTTP API.
#[derive(Parser, Debug)]
#[command(name = "jet9-api", version, about = "jet9 API server and client")]
struct Cli {
    /// Settings file (default `~/.jet9/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve every configured module.
    Serve {
        /// Host to bind (overrides settings).
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, 0 for auto-assign (overrides settings).
        #[arg(long)]
        port: Option<u16>,
    },

    /// Send one request and print the response.
    Request {
        /// Subsystem name, e.g. `dns`.
        subsystem: String,

        /// Action name, e.g. `list`.
        action: String,

        /// Parameters as a JSON object.
        #[arg(long, default_value = "{}")]
        params: String,

        /// Server base URL (overrides settings).
        #[arg(long)]
        host: Option<String>,

        /// Auth token (overrides settings).
        #[arg(long)]
        authtoken: Option<String>,
    },
}

fn load_settings(path: Option<&PathBuf>) -> Result<Jet9Settings> {
    let path = path.cloned().unwrap_or_else(jet9_settings::settings_path);
    jet9_settings::load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))
}

/// Build the route table from the shipped modules and the allow-list.
fn build_routes(settings: &Jet9Settings) -> Result<RouteTable> {
    let routes = RouterBuilder::with_allow_list(&jet9_mods::catalog(), settings.modules.as_deref())?
        .reserve(RESERVED_PATHS)
        .build()
        .context("Failed to build routes")?;
    Ok(routes)
}

fn parse_params(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(raw).context("--params is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("--params must be a JSON object, got {other}"),
    }
}

async fn serve(mut settings: Jet9Settings, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }

    let routes = build_routes(&settings)?;
    let metrics = jet9_server::metrics::install_recorder()
        .context("Failed to install metrics recorder")?;
    let config = ServerConfig::from(&settings.server);
    let shutdown_timeout = config.shutdown_timeout();

    let server = Jet9Server::new(config, routes).with_metrics(metrics);
    let (addr, handle) = server.listen().await.context("Failed to start server")?;
    tracing::info!(%addr, subsystems = ?server.routes().subsystems(), "jet9 api ready");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    if !server
        .shutdown()
        .graceful_shutdown(vec![handle], shutdown_timeout)
        .await
    {
        tracing::warn!("forced shutdown with requests still in flight");
    }
    Ok(())
}

async fn request(
    mut settings: Jet9Settings,
    subsystem: &str,
    action: &str,
    params: &str,
    host: Option<String>,
    authtoken: Option<String>,
) -> Result<ExitCode> {
    if let Some(host) = host {
        settings.client.host = host;
    }
    if authtoken.is_some() {
        settings.client.authtoken = authtoken;
    }

    let params = parse_params(params)?;
    let client = Jet9Client::from_settings(&settings.client)?;
    let response = client
        .request(subsystem, action, params)
        .await
        .with_context(|| format!("Request to {}/{subsystem} failed", client.host()))?;

    println!("{response}");
    Ok(if response.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Cli::parse();
    let settings = load_settings(args.settings.as_ref())?;
    jet9_logging::init_logging(&settings.logging).context("Failed to initialize logging")?;

    match args.command {
        Command::Serve { host, port } => {
            serve(settings, host, port).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Request {
            subsystem,
            action,
            params,
            host,
            authtoken,
        } => request(settings, &subsystem, &action, &params, host, authtoken).await,
    }
}
