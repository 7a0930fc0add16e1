use std::path::PathBuf;

use crate::config::{default_config_path, CliConfig};
use crate::error::CliError;

/// Apply updates to a configuration; returns whether anything changed
pub fn update_config(
    config: &mut CliConfig,
    set_collection: Option<PathBuf>,
    auto_confirm: Option<bool>,
) -> bool {
    let mut changed = false;
    if let Some(path) = set_collection {
        config.collection_path = Some(path);
        changed = true;
    }
    if let Some(auto_confirm) = auto_confirm {
        config.auto_confirm_schema_change = auto_confirm;
        changed = true;
    }
    changed
}

pub fn run_config(set_collection: Option<PathBuf>, auto_confirm: Option<bool>) -> Result<(), CliError> {
    let mut config = CliConfig::load().map_err(CliError::Config)?;

    let path = if update_config(&mut config, set_collection, auto_confirm) {
        let path = config.save().map_err(CliError::Config)?;
        tracing::info!("Saved config to {}", path.display());
        path
    } else {
        default_config_path().map_err(CliError::Config)?
    };

    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
