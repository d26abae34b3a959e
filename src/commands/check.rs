use std::path::Path;

use anyhow::{Context, Result};

use crate::config;

/// Validate configuration and show the effective non-secret settings.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let cfg = config::load(config_path)?;
    cfg.validate()?;

    let rendered = toml::to_string_pretty(&cfg).context("Failed to render configuration")?;
    println!("{rendered}");

    let secrets = cfg.secrets();
    let labels: Vec<&str> = secrets.labels().collect();
    println!("# secrets present: {}", labels.join(", "));
    println!("✓ Configuration OK");

    Ok(())
}
