use super::config::{default_config_path, GovdashConfig};
use std::path::PathBuf;

/// Write the commented default configuration file
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn execute(path: Option<String>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.map(PathBuf::from).unwrap_or_else(default_config_path);

    if path.exists() && !force {
        return Err(format!(
            "Config file '{}' already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    GovdashConfig::create_default(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
