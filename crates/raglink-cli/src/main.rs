//! The `raglink` binary: run the relay server, or stream a query from the
//! terminal.

use anyhow::Context;
use clap::{Parser, Subcommand};
use raglink_client::{BackendClient, ChatSession, QueryMode, StreamUpdate};
use raglink_core::Role;
use raglink_relay::{RelayConfig, RelayServer};
use serde::Deserialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "raglink", about = "Raglink — streaming relay for a RAG chat backend")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "raglink.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Ask the backend a question from the terminal
    Ask {
        /// The question to ask
        query: String,
        /// Dataset to answer over ("cross_query" fans out to all)
        #[arg(short, long, default_value = "price_index_statistics")]
        dataset: String,
        /// Query mode: basic or agentic
        #[arg(short, long, default_value = "agentic")]
        mode: QueryMode,
        /// Relay URL to talk to (overrides config)
        #[arg(long)]
        relay_url: Option<String>,
        /// Use the buffered endpoint instead of streaming
        #[arg(long)]
        no_stream: bool,
    },
    /// Print the backend service status
    Status {
        /// Relay URL to talk to (overrides config)
        #[arg(long)]
        relay_url: Option<String>,
    },
}

#[derive(Deserialize, Default)]
struct RaglinkFileConfig {
    #[serde(default)]
    backend: BackendSection,
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    client: ClientSection,
}

#[derive(Deserialize)]
struct BackendSection {
    #[serde(default = "default_backend_url")]
    base_url: String,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
        }
    }
}

#[derive(Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Deserialize)]
struct ClientSection {
    #[serde(default = "default_relay_url")]
    relay_url: String,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8787
}
fn default_relay_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

async fn load_config(path: &PathBuf) -> anyhow::Result<RaglinkFileConfig> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file '{}'", path.display())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Ok(RaglinkFileConfig::default())
        }
        Err(err) => Err(err).with_context(|| {
            format!("Failed to read config file '{}'", path.display())
        }),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config).await?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);

            let app = RelayServer::build(RelayConfig::new(config.backend.base_url.clone()));

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            info!(
                backend = %config.backend.base_url,
                "Raglink relay listening on {addr}"
            );
            axum::serve(listener, app).await?;
        }
        Commands::Ask {
            query,
            dataset,
            mode,
            relay_url,
            no_stream,
        } => {
            let relay_url = relay_url.unwrap_or(config.client.relay_url);
            let mut session = ChatSession::new(BackendClient::new(relay_url));

            if mode == QueryMode::Agentic && !no_stream {
                let result = session
                    .send_streaming(&query, &dataset, |update| match update {
                        StreamUpdate::Delta { text } => {
                            print!("{text}");
                            let _ = std::io::stdout().flush();
                        }
                        StreamUpdate::Completed { .. } => println!(),
                        StreamUpdate::Event { name, .. } => {
                            info!(event = %name, "Stream event");
                        }
                        StreamUpdate::Error { message } => {
                            eprintln!("\nstream error: {message}");
                        }
                    })
                    .await;

                if result.is_err() {
                    print_last_assistant(&session);
                }

                if let Some(terminal) = session.terminal() {
                    let sources = terminal
                        .source_nodes
                        .as_ref()
                        .map_or(0, std::vec::Vec::len);
                    info!(sources, "Answer complete");
                } else {
                    eprintln!("warning: stream ended without a terminal result");
                }
            } else {
                session.send(&query, mode, &dataset).await;
                print_last_assistant(&session);
            }
        }
        Commands::Status { relay_url } => {
            let relay_url = relay_url.unwrap_or(config.client.relay_url);
            let mut session = ChatSession::new(BackendClient::new(relay_url));
            let status = session.refresh_status().await;
            println!("{}", serde_json::to_string_pretty(status)?);
        }
    }

    Ok(())
}

fn print_last_assistant(session: &ChatSession) {
    if let Some(message) = session
        .messages()
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
    {
        println!("{}", message.content);
    }
}
