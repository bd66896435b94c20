use std::path::PathBuf;

use serde_json::json;
use unikron_core::domain::catalog::InventoryCatalog;

use crate::commands::{load_config, CommandResult, EXIT_CATALOG, EXIT_CONFIG};

const COMMAND: &str = "catalog";

pub fn run(catalog_path: Option<PathBuf>) -> CommandResult {
    let config = match load_config(catalog_path) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure(COMMAND, "config_validation", error, EXIT_CONFIG),
    };

    let path = config.catalog.path;
    let catalog = match InventoryCatalog::load(&path) {
        Ok(catalog) => catalog,
        Err(error) => {
            return CommandResult::failure(COMMAND, "catalog", error.to_string(), EXIT_CATALOG);
        }
    };

    let tiers = catalog.tier_keys().map(|tier| tier.as_str().to_string()).collect::<Vec<_>>();
    let message = format!(
        "catalog `{}` is valid: {} styles, {} addons, {} complexity tiers ({})",
        path.display(),
        catalog.styles().len(),
        catalog.addons().len(),
        tiers.len(),
        tiers.join(", ")
    );
    let data = json!({
        "path": path.display().to_string(),
        "styles": catalog.styles(),
        "addons": catalog.addons(),
        "tiers": tiers,
    });

    CommandResult::success_with_data(COMMAND, message, Some(data))
}
