#![deny(unsafe_code)]

//! Switchboard CLI: daemon launcher and client.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use switchboard_config::AppConfig;
use switchboard_core::routing::{Route, Router};
use switchboard_core::server::DaemonClient;
use switchboard_core::status::StatusLog;
use switchboard_core::{Daemon, LogCollector, build_info};

/// Switchboard: a JSON-RPC tool-routing agent.
#[derive(Parser)]
#[command(name = "switchboard", about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "switchboard.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Daemon address (`host:port`); defaults to the configured listener.
    #[arg(long)]
    addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Switchboard daemon.
    Start,

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },

    /// Dry-run tool selection offline with keyword scoring.
    Route {
        /// Message to route.
        message: String,
    },

    /// Send a chat message to a running daemon.
    Chat {
        message: String,
    },

    /// Call a JSON-RPC method on a running daemon.
    Call {
        /// Method name, e.g. `agent.list_capabilities`.
        method: String,

        /// Parameters as a JSON array or object.
        params: Option<String>,

        /// Send as a notification (no id, no response).
        #[arg(long)]
        notify: bool,
    },

    /// List the daemon's tools.
    Tools {
        /// Reload the registry first.
        #[arg(long)]
        reload: bool,
    },

    /// Check that the daemon is up.
    Health,

    /// Show the daemon's captured logs.
    Logs {
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: usize,
    },

    /// Show recent RPC traffic on the user engine.
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    // `--version` includes the git hash and build profile.
    let version: &'static str = Box::leak(build_info::version_string().into_boxed_str());
    let matches = Cli::command().version(version).get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let (config, found) = load_config(&cli.config).await?;
    let collector = matches!(cli.command, Commands::Start)
        .then(|| LogCollector::new(config.logging.buffer_capacity));

    tracing_subscriber::registry()
        .with(env_filter(cli.verbose, &config.logging.level))
        .with(tracing_subscriber::fmt::layer())
        .with(collector.clone())
        .init();

    if !found {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    let addr = cli
        .addr
        .clone()
        .unwrap_or_else(|| config.server.socket_addr());

    match cli.command {
        Commands::Start => cmd_start(config, collector).await?,
        Commands::Config { show } => cmd_config(&cli.config, &config, show)?,
        Commands::Route { message } => cmd_route(&config, &message).await,
        Commands::Chat { message } => cmd_chat(&addr, &message).await?,
        Commands::Call {
            method,
            params,
            notify,
        } => cmd_call(&addr, &method, params.as_deref(), notify).await?,
        Commands::Tools { reload } => cmd_tools(&addr, reload).await?,
        Commands::Health => cmd_health(&addr).await?,
        Commands::Logs { limit } => cmd_logs(&addr, limit).await?,
        Commands::History => cmd_history(&addr).await?,
    }

    Ok(())
}

/// `RUST_LOG` wins, then `-v`, then the configured level.
fn env_filter(verbose: u8, configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose, configured)))
}

fn filter_directive(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

async fn cmd_start(config: AppConfig, collector: Option<LogCollector>) -> Result<()> {
    info!("Starting Switchboard daemon");

    let mut daemon = Daemon::new(config);
    if let Some(collector) = collector {
        daemon = daemon.with_log_reader(collector.reader());
    }
    daemon.run().await?;

    Ok(())
}

fn cmd_config(config_path: &Path, config: &AppConfig, show: bool) -> Result<()> {
    if show {
        let toml_str = toml::to_string_pretty(config).context("failed to render config")?;
        println!("{toml_str}");
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}

async fn cmd_route(config: &AppConfig, message: &str) {
    let router = Router::new(config.routing.clone());
    let mut status = StatusLog::new();
    let route = router
        .route(message, &config.tools.enabled, &mut status)
        .await;

    for event in status.events() {
        println!("  · {}", event.message);
    }
    match route {
        Route::Conversational { kind, .. } => {
            println!("conversational ({}): {}", kind.label(), kind.reply());
        }
        Route::Tool(decision) => {
            println!(
                "{} ({}% via {}): {}",
                decision.tool, decision.confidence, decision.strategy, decision.reasoning
            );
        }
    }
}

async fn cmd_chat(addr: &str, message: &str) -> Result<()> {
    let request = rpc_request("agent.chat", Some(json!({ "message": message })), false);
    let reply = DaemonClient::new(addr)
        .rpc(&request.to_string())
        .await?
        .context("daemon sent no reply")?;
    let reply: Value = serde_json::from_str(&reply).context("malformed reply")?;

    if let Some(error) = reply.get("error") {
        anyhow::bail!("{}", error["message"].as_str().unwrap_or("unknown error"));
    }
    let result = &reply["result"];
    println!("{}", result["response"].as_str().unwrap_or_default());
    println!();
    println!("{}", serde_json::to_string_pretty(&result["metadata"])?);
    Ok(())
}

async fn cmd_call(addr: &str, method: &str, params: Option<&str>, notify: bool) -> Result<()> {
    let params = params
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("params must be valid JSON")?;
    let request = rpc_request(method, params, notify);

    match DaemonClient::new(addr).rpc(&request.to_string()).await? {
        Some(reply) => {
            let value: Value = serde_json::from_str(&reply).context("malformed reply")?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        None => println!("(no response)"),
    }
    Ok(())
}

fn rpc_request(method: &str, params: Option<Value>, notify: bool) -> Value {
    let mut request = json!({ "jsonrpc": "2.0", "method": method });
    if let Some(params) = params {
        request["params"] = params;
    }
    if !notify {
        request["id"] = json!(1);
    }
    request
}

async fn cmd_tools(addr: &str, reload: bool) -> Result<()> {
    let client = DaemonClient::new(addr);
    if reload {
        let reloaded = client.reload_tools().await?;
        println!("{} ({} tools)", reloaded.status, reloaded.tool_count);
    }
    for tool in client.tools().await?.tools {
        let params: Vec<&str> = tool.parameters.keys().map(String::as_str).collect();
        println!("{:<18} {} [{}]", tool.name, tool.description, params.join(", "));
    }
    Ok(())
}

async fn cmd_health(addr: &str) -> Result<()> {
    let health = DaemonClient::new(addr).health().await?;
    println!(
        "{} · switchboard {} ({}, {}) · {} tools · up {}s",
        health.status,
        health.version,
        health.git_hash,
        health.build_profile,
        health.tool_count,
        health.uptime_secs
    );
    Ok(())
}

async fn cmd_logs(addr: &str, limit: usize) -> Result<()> {
    let logs = DaemonClient::new(addr).logs(limit).await?;
    for entry in logs.entries {
        println!(
            "{:>6} {:<5} {}: {}",
            entry.seq,
            entry.level,
            entry.target,
            entry.render()
        );
    }
    Ok(())
}

async fn cmd_history(addr: &str) -> Result<()> {
    let history = DaemonClient::new(addr).history().await?;
    println!("{}", serde_json::to_string_pretty(&history.entries)?);
    Ok(())
}

/// Load the config file, or defaults when it does not exist.
///
/// The flag reports whether the file was found.
async fn load_config(path: &Path) -> Result<(AppConfig, bool)> {
    if path.exists() {
        let config = AppConfig::load(path)
            .await
            .with_context(|| format!("failed to load {}", path.display()))?;
        Ok((config, true))
    } else {
        Ok((AppConfig::default(), false))
    }
}
