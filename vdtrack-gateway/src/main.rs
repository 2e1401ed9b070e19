use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use vdtrack_gateway::config::{Config, PublisherConfig, RegistryConfig, ServerConfig};
use vdtrack_gateway::publish::LocationPublisher;
use vdtrack_gateway::publish::memory::InMemoryPublisher;
use vdtrack_gateway::publish::mqtt::MqttPublisher;
use vdtrack_gateway::registry::ThingRegistry;
use vdtrack_gateway::registry::memory::InMemoryThingRegistry;
use vdtrack_gateway::registry::sqlite::SqliteThingRegistry;
use vdtrack_gateway::{AppState, api};

#[derive(Parser)]
#[command(name = "vdtrack-gateway")]
#[command(about = "VD GPS tracker telemetry gateway")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "vdtrack-gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tracing=info,vdtrack_gateway=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        info!(path = ?cli.config, "Loading configuration");
        Config::load(&cli.config)?
    } else {
        info!("No configuration file found, using defaults");
        Config::default()
    };

    info!(http_addr = %config.server.http_addr, "Starting gateway");

    match &config.registry {
        RegistryConfig::Memory => {
            info!("Using in-memory thing registry");
            let registry = InMemoryThingRegistry::new();
            run_with_registry(&config, registry).await?;
        }
        RegistryConfig::Sqlite { path } => {
            info!(path = ?path, "Using SQLite thing registry");
            let registry = SqliteThingRegistry::open(path)?;
            run_with_registry(&config, registry).await?;
        }
    }

    Ok(())
}

async fn run_with_registry<R>(config: &Config, registry: R) -> color_eyre::Result<()>
where
    R: ThingRegistry,
{
    let cancel = CancellationToken::new();

    match &config.publisher {
        PublisherConfig::Memory => {
            info!("Using in-memory publisher");
            let publisher = InMemoryPublisher::new();
            run_server(&config.server, registry, publisher, cancel).await
        }
        PublisherConfig::Mqtt(mqtt) => {
            info!(host = %mqtt.host, port = mqtt.port, "Using MQTT publisher");
            let (publisher, event_loop) = MqttPublisher::connect(mqtt);
            tokio::spawn(MqttPublisher::run_event_loop(event_loop, cancel.clone()));
            run_server(&config.server, registry, publisher, cancel).await
        }
    }
}

async fn run_server<R, P>(
    server: &ServerConfig,
    registry: R,
    publisher: P,
    cancel: CancellationToken,
) -> color_eyre::Result<()>
where
    R: ThingRegistry,
    P: LocationPublisher,
{
    let state = AppState::new(registry, publisher);
    let app = api::router(state, server.max_body_bytes);

    let listener = TcpListener::bind(server.http_addr).await?;
    info!(http_addr = %server.http_addr, "HTTP server listening");

    let cancel_clone = cancel.clone();
    tokio::select! {
        result = axum::serve(listener, app).with_graceful_shutdown(async move {
            cancel_clone.cancelled().await;
        }) => {
            if let Err(e) = result {
                tracing::error!(error = ?e, "HTTP server error");
            }
            info!("HTTP server shut down");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            cancel.cancel();
        }
    }

    Ok(())
}
