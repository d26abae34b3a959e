use std::path::Path;

use anyhow::Result;

use crate::config;

pub fn run(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => config::default_config_path()?,
    };

    config::write_default(&path)?;

    println!("Wrote {}", path.display());
    println!("\nSet MS_CLIENT_ID and MS_REFRESH_TOKEN in the environment, then run `worklog check`.");

    Ok(())
}
