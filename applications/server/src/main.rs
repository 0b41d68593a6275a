/// Radio Server - manifest proxy and tooling
use clap::{Parser, Subcommand};
use radio_catalog::CatalogClient;
use radio_server::{api, config::ServerConfig, manifest_cli, state::AppState};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "radio-server")]
#[command(about = "Radio player catalog proxy and manifest tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Manifest tooling
    Manifest {
        #[command(subcommand)]
        command: ManifestCommands,
    },
}

#[derive(Subcommand)]
enum ManifestCommands {
    /// Build manifest.json from <audio-dir>/<language>/*.<ext>
    Generate {
        /// Directory holding one sub-directory per language
        #[arg(long)]
        audio_dir: PathBuf,
        /// Where to write the manifest
        #[arg(long, default_value = "manifest.json")]
        output: PathBuf,
        /// Audio file extension to collect
        #[arg(long, default_value = "mp3")]
        ext: String,
    },
    /// Check a manifest file
    Validate {
        /// Manifest file to check
        file: PathBuf,
        /// Extension titles must not carry
        #[arg(long, default_value = "mp3")]
        ext: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "radio_server=info,radio_catalog=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            serve(config).await?;
        }
        Commands::Manifest { command } => match command {
            ManifestCommands::Generate {
                audio_dir,
                output,
                ext,
            } => {
                let summary = manifest_cli::generate(&audio_dir, &output, &ext)?;
                println!(
                    "Wrote {} ({} languages, {} songs)",
                    output.display(),
                    summary.languages,
                    summary.tracks
                );
            }
            ManifestCommands::Validate { file, ext } => {
                let report = manifest_cli::validate(&file, &ext)?;
                for warning in &report.warnings {
                    println!("warning: {warning}");
                }
                for error in &report.errors {
                    println!("error: {error}");
                }
                if !report.is_valid() {
                    anyhow::bail!("{} is not a valid manifest", file.display());
                }
                println!("{} is valid", file.display());
            }
        },
    }

    Ok(())
}

async fn serve(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load(config_path.as_deref())?;
    config.validate()?;

    tracing::info!("Starting Radio Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    // Missing base URL is reported per request, not at startup
    let catalog = CatalogClient::new(config.catalog_config())?;
    if let Ok(base_url) = catalog.base_url() {
        tracing::info!(base_url = %base_url, "Music server configured");
    }

    let app = api::create_router(AppState::new(Arc::new(catalog)));

    // Create server address
    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
