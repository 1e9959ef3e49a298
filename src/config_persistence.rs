use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::{CatalogConfig, Config, DiscoveryConfig};

const APP_DIR_NAME: &str = "drown";
const CONFIG_FILE_NAME: &str = "config.toml";
const DATABASE_FILE_NAME: &str = "local_storage.db";
const PAGE_FILE_NAME: &str = "index.html";

/// Directory holding `config.toml`.
pub fn config_root() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| "Could not find config directory".to_string())
}

/// Directory holding the local store and the generated page.
pub fn data_root() -> Result<PathBuf, String> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| "Could not find data directory".to_string())
}

pub fn config_file_path(config_root: &Path) -> PathBuf {
    config_root.join(CONFIG_FILE_NAME)
}

pub fn resolve_database_path(config: &Config, data_root: &Path) -> PathBuf {
    let configured = config.storage.database_path.trim();
    if configured.is_empty() {
        data_root.join(DATABASE_FILE_NAME)
    } else {
        PathBuf::from(configured)
    }
}

pub fn resolve_page_path(config: &Config, data_root: &Path) -> PathBuf {
    let configured = config.display.page_path.trim();
    if configured.is_empty() {
        data_root.join(PAGE_FILE_NAME)
    } else {
        PathBuf::from(configured)
    }
}

/// Clamps loaded values into ranges the runtime can work with.
pub fn sanitize_config(config: Config) -> Config {
    let catalog = CatalogConfig {
        musicbrainz_base_url: config
            .catalog
            .musicbrainz_base_url
            .trim()
            .trim_end_matches('/')
            .to_string(),
        audiodb_base_url: config
            .catalog
            .audiodb_base_url
            .trim()
            .trim_end_matches('/')
            .to_string(),
        connect_timeout_ms: config.catalog.connect_timeout_ms.clamp(500, 60_000),
        read_timeout_ms: config.catalog.read_timeout_ms.clamp(500, 120_000),
        random_offset_bound: config.catalog.random_offset_bound.max(1),
        ..config.catalog
    };
    let discovery = DiscoveryConfig {
        max_attempts: config.discovery.max_attempts.clamp(1, 100),
        haptic_pulse_ms: config.discovery.haptic_pulse_ms.min(1_000),
    };

    Config {
        catalog,
        discovery,
        ..config
    }
}

pub fn persist_config_file(config: &Config, path: &Path) {
    let Ok(config_text) = toml::to_string(config) else {
        log::error!("Failed to serialize config for {}", path.display());
        return;
    };

    if let Err(err) = std::fs::write(path, config_text) {
        log::error!("Failed to persist config to {}: {}", path.display(), err);
    }
}

/// Reads the config file, writing defaults first when it does not exist yet.
///
/// Unreadable or unparsable files fall back to defaults and are left untouched.
pub fn load_or_create_config(path: &Path) -> Config {
    if !path.exists() {
        info!(
            "Config file not found. Creating default config. path={}",
            path.display()
        );
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    err
                );
            }
        }
        let default_config = sanitize_config(Config::default());
        persist_config_file(&default_config, path);
        return default_config;
    }

    let config_content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!(
                "Failed to read config file {}. Using defaults. error={}",
                path.display(),
                err
            );
            return sanitize_config(Config::default());
        }
    };

    match toml::from_str::<Config>(&config_content) {
        Ok(config) => sanitize_config(config),
        Err(err) => {
            warn!(
                "Failed to parse config file {}. Using defaults. error={}",
                path.display(),
                err
            );
            sanitize_config(Config::default())
        }
    }
}
