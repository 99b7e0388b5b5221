use antiplag_server::{ServerConfig, create_app};
use tokio::net::TcpListener;
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;
    info!(
        "Inference endpoint: {} (model {}, timeout {:?})",
        config.inference_url, config.model, config.inference_timeout
    );

    let app = create_app(config);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    let addr = listener.local_addr()?;

    info!("AntiPlag service starting on {}", addr);
    info!("Analysis endpoint: POST http://{}/check", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
