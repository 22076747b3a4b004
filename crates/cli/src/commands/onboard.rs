//! `plume onboard` — Write a starter config file.

use plume_config::AppConfig;

pub fn run() -> anyhow::Result<()> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;

    println!("Wrote starter config to {}", config_path.display());
    println!("Next: set api_key in the config file or export PLUME_API_KEY.");
    Ok(())
}
