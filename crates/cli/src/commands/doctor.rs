//! `plume doctor` — Diagnose configuration problems.

use plume_config::AppConfig;

pub fn run() -> anyhow::Result<()> {
    println!("Plume Doctor — configuration diagnostics\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        match AppConfig::load() {
            Ok(config) => {
                println!("  ok   Config file valid");

                if config.has_api_key() {
                    println!("  ok   API key configured");
                } else {
                    println!("  warn No API key — set api_key in config.toml or export PLUME_API_KEY");
                    issues += 1;
                }

                if config.profiles.is_empty() {
                    println!("  ok   No owner profiles (baseline persona only)");
                } else {
                    println!("  ok   {} owner profile(s) configured", config.profiles.len());
                }
            }
            Err(e) => {
                println!("  fail Config file invalid: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  fail No config file — run `plume onboard`");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("All checks passed.");
    } else {
        println!("{issues} issue(s) found. See above for details.");
    }

    Ok(())
}
