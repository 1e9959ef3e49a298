//! Persistent application configuration model and defaults.

/// Root configuration persisted to `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    #[serde(default)]
    /// Remote catalog endpoints and HTTP behavior.
    pub catalog: CatalogConfig,
    #[serde(default)]
    /// Discovery retry loop and device feedback.
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    /// Generated page preferences.
    pub display: DisplayConfig,
    #[serde(default)]
    /// Local key-value store location.
    pub storage: StorageConfig,
}

/// Catalog endpoints and request limits.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_musicbrainz_base_url")]
    pub musicbrainz_base_url: String,
    #[serde(default = "default_audiodb_base_url")]
    pub audiodb_base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Minimum spacing between MusicBrainz requests. Zero disables the limiter.
    #[serde(default = "default_musicbrainz_min_interval_ms")]
    pub musicbrainz_min_interval_ms: u64,
    /// Exclusive upper bound of the random offset into the artist index.
    #[serde(default = "default_random_offset_bound")]
    pub random_offset_bound: u32,
}

/// Discovery loop preferences.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_haptic_pulse_ms")]
    pub haptic_pulse_ms: u64,
}

/// Generated page preferences.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DisplayConfig {
    /// Page path. Empty means `index.html` in the data directory.
    #[serde(default)]
    pub page_path: String,
    #[serde(default = "default_true")]
    pub open_in_browser: bool,
}

/// Local storage preferences.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct StorageConfig {
    /// SQLite file path. Empty means `local_storage.db` in the data directory.
    #[serde(default)]
    pub database_path: String,
}

fn default_true() -> bool {
    true
}

fn default_musicbrainz_base_url() -> String {
    "https://musicbrainz.org/ws/2".to_string()
}

fn default_audiodb_base_url() -> String {
    "https://www.theaudiodb.com/api/v1/json/2".to_string()
}

fn default_user_agent() -> String {
    format!(
        "drown/{} (random artist discovery)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_read_timeout_ms() -> u64 {
    10_000
}

fn default_musicbrainz_min_interval_ms() -> u64 {
    1_000
}

fn default_random_offset_bound() -> u32 {
    120_000
}

fn default_max_attempts() -> u32 {
    10
}

fn default_haptic_pulse_ms() -> u64 {
    50
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            musicbrainz_base_url: default_musicbrainz_base_url(),
            audiodb_base_url: default_audiodb_base_url(),
            user_agent: default_user_agent(),
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            musicbrainz_min_interval_ms: default_musicbrainz_min_interval_ms(),
            random_offset_bound: default_random_offset_bound(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            haptic_pulse_ms: default_haptic_pulse_ms(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_path: String::new(),
            open_in_browser: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").expect("empty config should parse");
        assert_eq!(config, Config::default());
        assert_eq!(config.discovery.max_attempts, 10);
        assert_eq!(config.catalog.random_offset_bound, 120_000);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [discovery]
            max_attempts = 3
            "#,
        )
        .expect("partial config should parse");
        assert_eq!(config.discovery.max_attempts, 3);
        assert_eq!(config.discovery.haptic_pulse_ms, 50);
        assert_eq!(
            config.catalog.audiodb_base_url,
            "https://www.theaudiodb.com/api/v1/json/2"
        );
        assert!(config.display.open_in_browser);
    }
}
