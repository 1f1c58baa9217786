//! `admuse serve` — Start the WebSocket gateway.

use admuse_config::AppConfig;

pub async fn run(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load()?;

    if let Some(port) = port {
        config.gateway.port = port;
    }

    println!(
        "Starting {} gateway on {}:{} ...",
        config.agent_name, config.gateway.host, config.gateway.port
    );

    admuse_gateway::start(config).await
}
