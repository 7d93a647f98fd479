use anyhow::Result;
use bgd_manager::{build_api_server, config::AppConfig};
use bgd_observability::{TracingConfig, setup_tracing};
use clap::Command;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let _matches = Command::new("bgd-manager")
        .about("Blue/green deployment manager")
        .version(env!("CARGO_PKG_VERSION"))
        .get_matches();

    let config = AppConfig::load_from_env()?;

    setup_tracing(TracingConfig::new(
        "bgd-manager",
        &config.log_level,
        &config.log_format,
    ))?;

    info!("Starting deployment manager with environment-based config");
    let server = build_api_server(config).await?;

    if let Err(e) = server.serve().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
