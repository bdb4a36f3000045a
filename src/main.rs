use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::anyhow;
use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use voxchat_gateway::{
    ServerConfig, build_router,
    client::GatewayClient,
    init,
    state::AppState,
    tls::{self, ServeMode},
    utils::local_ip_address,
};

/// VoxChat Gateway - speech transcription and chat relay server
#[derive(Parser, Debug)]
#[command(name = "voxchat-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the Whisper model files into the local cache
    Init,

    /// Transcribe a file on a running gateway and print the chat reply
    Ask {
        /// Audio file to upload
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Gateway base URL
        #[arg(short = 'u', long = "url", default_value = "https://localhost:5000")]
        url: String,

        /// Accept the gateway's self-signed certificate
        #[arg(short = 'k', long = "insecure")]
        insecure: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    if let Some(Commands::Ask {
        file,
        url,
        insecure,
    }) = &cli.command
    {
        let client = GatewayClient::new(url, *insecure)?;
        let exchange = client.transcribe_and_reply(file).await?;
        println!("Transcription:\n{}\n", exchange.transcript);
        println!("AI Response:\n{}", exchange.reply);
        return Ok(());
    }

    // Load configuration from file or environment
    let config = if let Some(config_path) = &cli.config {
        info!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    if let Some(Commands::Init) = cli.command {
        init::run(&config).await?;
        return Ok(());
    }

    serve(config).await
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let address = config.address();
    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;

    // Certificates are settled before the model load so TLS problems fail fast
    let mode = tls::resolve_serve_mode(&config)?;

    info!("Loading Whisper model...");
    let app_state = AppState::new(config).await?;
    let app = build_router(app_state);

    match mode {
        ServeMode::Https(tls) => {
            let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .map_err(|e| {
                    anyhow!(
                        "Failed to load TLS certificates from {} and {}: {}",
                        tls.cert_path.display(),
                        tls.key_path.display(),
                        e
                    )
                })?;

            let local_ip = local_ip_address();
            let port = socket_addr.port();
            info!("Server listening on https://{} (TLS enabled)", socket_addr);
            info!("Local IP: https://{local_ip}:{port}");
            info!("Accept self-signed certificate at https://{local_ip}:{port}/health");

            axum_server::bind_rustls(socket_addr, rustls_config)
                .serve(app.into_make_service())
                .await
                .map_err(|e| anyhow!("TLS server error: {}", e))?;
        }
        ServeMode::Http => {
            if socket_addr.ip().is_unspecified() {
                warn!("Serving plain HTTP on all interfaces; traffic is unencrypted");
            }
            info!("Server listening on http://{}", socket_addr);

            let listener = TcpListener::bind(&socket_addr).await?;
            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}
