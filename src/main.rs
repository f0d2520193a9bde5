use stowage_planner::api;
use stowage_planner::config::AppConfig;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let engine = app_config.engine.clone();
    info!(
        "🚀 Stowage planner starting ({} mode, {} containers max)",
        engine.planning().mode.as_str(),
        engine.planning().max_containers
    );

    if let Err(err) = api::start_api_server(app_config.api, engine).await {
        error!("❌ API server terminated with an error: {err}");
        std::process::exit(1);
    }
}
