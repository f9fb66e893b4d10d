//! Module for searching for bearing publisher config files

use std::path::PathBuf;

/// Name of the config file in each search directory
const CONFIG_FILE: &str = "config.yaml";
/// System config path used if one cannot be found with XDG
const FALLBACK_CONFIG_PATH: &str = "/etc/bearing-publisher/config.yaml";

/// Returns a list of config files in load order.
/// E.g. ["~/.config/bearing-publisher/config.yaml", "/etc/bearing-publisher/config.yaml"]
pub fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    match xdg::BaseDirectories::with_prefix("bearing-publisher") {
        Ok(base_dirs) => {
            if let Some(path) = base_dirs.find_config_file(CONFIG_FILE) {
                paths.push(path);
            }
        }
        Err(e) => {
            log::warn!("Unable to determine config base path: {e}");
        }
    }
    paths.push(PathBuf::from(FALLBACK_CONFIG_PATH));

    paths
}
