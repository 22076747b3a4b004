//! `plume tools` — List the registered tools.

use plume_config::AppConfig;

use super::runtime;

pub fn run() -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    // Listing tools never talks to a provider.
    config.api_key.get_or_insert_with(|| "unused".to_string());

    let state = runtime::build_state(&config)?;

    println!("Registered tools:\n");
    let mut definitions = state.tools.definitions();
    definitions.sort_by(|a, b| a.name.cmp(&b.name));
    for def in definitions {
        println!("  {:<16} {}", def.name, def.description);
    }

    Ok(())
}
