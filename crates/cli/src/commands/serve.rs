//! `plume serve` — Start the HTTP gateway.

use plume_config::AppConfig;

use super::runtime;

pub async fn run(port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let state = runtime::build_state(&config)?;

    println!("Plume gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.provider.chat_model);

    plume_gateway::serve(state, &config.gateway.host, config.gateway.port).await?;

    Ok(())
}
