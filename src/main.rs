use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sms_verifier::config::{KeepAliveConfig, SmsConfig, StoreConfig, VerifierConfig};
use sms_verifier::node::VerifierNode;
use sms_verifier::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "sms-verifier")]
#[command(version)]
#[command(about = "Verifier node that claims and delivers SMS jobs from a shared pool")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start a verifier node
    Serve(ServeArgs),

    /// Verifier service switch
    Service {
        #[command(flatten)]
        client: ClientArgs,

        #[command(subcommand)]
        command: ServiceCommands,
    },

    /// Show the SMS send log of a running node
    Logs {
        #[command(flatten)]
        client: ClientArgs,
    },

    /// Show the push registration token of a running node
    Token {
        #[command(flatten)]
        client: ClientArgs,
    },
}

// =============================================================================
// Server Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Identity written into claimed jobs
    #[arg(long, env = "VERIFIER_ID")]
    verifier_id: String,

    /// Network identifier prefixing every job path
    #[arg(long, env = "VERIFIER_NETWORK_ID", default_value = "alfajores")]
    network_id: String,

    /// Port for the control API
    #[arg(long, default_value = "8645")]
    port: u16,

    /// Base URL of the shared job store (in-process store when omitted)
    #[arg(long, env = "VERIFIER_STORE_URL")]
    store_url: Option<String>,

    /// Credential for the shared job store
    #[arg(long, env = "VERIFIER_STORE_AUTH", hide_env_values = true)]
    store_auth: Option<String>,

    /// Opaque push registration token reported to the UI
    #[arg(long, env = "VERIFIER_DEVICE_TOKEN")]
    device_token: Option<String>,

    /// File holding local state (service switch and send log)
    #[arg(long, env = "VERIFIER_STATE_PATH")]
    state_path: Option<PathBuf>,

    /// Program that sends an SMS, invoked as `<program> <args...> <phone> <body>`
    #[arg(long, env = "VERIFIER_SMS_PROGRAM")]
    sms_program: Option<String>,

    /// Extra leading arguments for the SMS program
    #[arg(long = "sms-arg", allow_hyphen_values = true)]
    sms_args: Vec<String>,

    /// Maximum SMS body length
    #[arg(long, default_value = "160")]
    sms_length_limit: usize,

    // === Keep-alive Options ===
    /// Host probed to keep the network path warm
    #[arg(long, default_value = "google.com")]
    keepalive_host: String,

    /// Port probed to keep the network path warm
    #[arg(long, default_value = "80")]
    keepalive_port: u16,

    /// Seconds between keep-alive probes
    #[arg(long, default_value = "900")]
    keepalive_interval_secs: u64,
}

// =============================================================================
// Client Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct ClientArgs {
    /// Control API address
    #[arg(long, short = 'a', default_value = "http://127.0.0.1:8645")]
    addr: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(clap::Subcommand, Debug)]
enum ServiceCommands {
    /// Show whether the service is on
    Status,
    /// Turn the service on
    Enable,
    /// Turn the service off
    Disable,
}

// =============================================================================
// Control API Types
// =============================================================================

#[derive(Serialize, Deserialize)]
struct StatusOutput {
    status: String,
}

#[derive(Serialize, Deserialize)]
struct TokenOutput {
    token: String,
}

#[derive(Serialize, Deserialize)]
struct LogOutput {
    #[serde(rename = "PhoneNumber")]
    phone_number: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "messageId")]
    message_id: String,
    #[serde(rename = "SMSSent")]
    sms_sent: bool,
}

#[derive(Serialize)]
struct ToggleRequest {
    enabled: bool,
}

// =============================================================================
// Server Implementation
// =============================================================================

async fn run_server(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let listen_addr: SocketAddr = format!("0.0.0.0:{}", args.port).parse()?;

    let config = VerifierConfig {
        verifier_id: args.verifier_id,
        network_id: args.network_id,
        sms_length_limit: args.sms_length_limit,
        device_token: args.device_token,
        listen_addr,
        state_path: args.state_path,
        keepalive: KeepAliveConfig {
            host: args.keepalive_host,
            port: args.keepalive_port,
            interval_ms: args.keepalive_interval_secs.saturating_mul(1000),
            ..KeepAliveConfig::default()
        },
        store: StoreConfig {
            base_url: args.store_url,
            auth_token: args.store_auth,
            ..StoreConfig::default()
        },
        sms: SmsConfig {
            program: args.sms_program,
            args: args.sms_args,
        },
    };

    if config.sms.program.is_none() {
        tracing::warn!("No SMS program configured, this node will skip every job");
    }

    tracing::info!(
        verifier_id = %config.verifier_id,
        network_id = %config.network_id,
        listen_addr = %config.listen_addr,
        store_url = ?config.store.base_url,
        "Starting sms-verifier node"
    );

    let shutdown = install_shutdown_handler();
    let node = Arc::new(VerifierNode::from_config(config).await?);
    node.run(shutdown).await?;

    Ok(())
}

// =============================================================================
// Client Command Handlers
// =============================================================================

fn endpoint(client: &ClientArgs, path: &str) -> String {
    format!("{}{}", client.addr.trim_end_matches('/'), path)
}

async fn handle_service(
    client: &ClientArgs,
    command: ServiceCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    let http = reqwest::Client::new();
    let url = endpoint(client, "/api/service");

    let request = match command {
        ServiceCommands::Status => http.get(&url),
        ServiceCommands::Enable => http.post(&url).json(&ToggleRequest { enabled: true }),
        ServiceCommands::Disable => http.post(&url).json(&ToggleRequest { enabled: false }),
    };

    let response = request.send().await?;
    if !response.status().is_success() {
        eprintln!("Error: service request failed: {}", response.text().await?);
        std::process::exit(1);
    }
    let output: StatusOutput = response.json().await?;

    match client.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Table => println!("Verifier service: {}", output.status),
    }
    Ok(())
}

async fn handle_logs(client: &ClientArgs) -> Result<(), Box<dyn std::error::Error>> {
    let response = reqwest::get(endpoint(client, "/api/logs")).await?;
    if !response.status().is_success() {
        eprintln!("Error: could not read logs: {}", response.text().await?);
        std::process::exit(1);
    }
    let logs: Vec<LogOutput> = response.json().await?;

    match client.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&logs)?),
        OutputFormat::Table => {
            if logs.is_empty() {
                println!("No SMS sent yet.");
                return Ok(());
            }
            println!(
                "{:<38} {:<18} {:<28} {:<5}",
                "MESSAGE ID", "PHONE", "DATE", "SENT"
            );
            for log in &logs {
                println!(
                    "{:<38} {:<18} {:<28} {:<5}",
                    log.message_id, log.phone_number, log.date, log.sms_sent
                );
            }
            println!();
            println!("Total: {} message(s)", logs.len());
        }
    }
    Ok(())
}

async fn handle_token(client: &ClientArgs) -> Result<(), Box<dyn std::error::Error>> {
    let response = reqwest::get(endpoint(client, "/api/token")).await?;
    if !response.status().is_success() {
        eprintln!("Error: no device token registered on this node");
        std::process::exit(1);
    }
    let output: TokenOutput = response.json().await?;

    match client.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Table => println!("Device token: {}", output.token),
    }
    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Commands::Serve(serve_args) => {
            run_server(serve_args).await?;
        }
        Commands::Service { client, command } => {
            handle_service(&client, command).await?;
        }
        Commands::Logs { client } => {
            handle_logs(&client).await?;
        }
        Commands::Token { client } => {
            handle_token(&client).await?;
        }
    }

    Ok(())
}
