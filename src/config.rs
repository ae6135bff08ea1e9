//! Importer configuration model and defaults.

use std::path::Path;

use log::{info, warn};

/// File looked up next to the database.
pub const CONFIG_FILE_NAME: &str = "get_image_info.toml";

/// Root configuration read from `get_image_info.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    #[serde(default)]
    /// Wiki database location.
    pub database: DatabaseConfig,
    #[serde(default)]
    /// MediaWiki API access and URL rewriting.
    pub wiki: WikiConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_file_name")]
    pub file_name: String,
}

/// MediaWiki endpoint and the hosts involved in thumbnail rewriting.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct WikiConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Unset means the HTTP client default applies.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub read_timeout_secs: Option<u64>,
    /// Image path the wiki wrongly reports for files mirrored from Commons.
    #[serde(default = "default_local_image_base")]
    pub local_image_base: String,
    #[serde(default = "default_commons_image_base")]
    pub commons_image_base: String,
}

fn default_database_file_name() -> String {
    "taginfo-wiki.db".to_string()
}

fn default_api_url() -> String {
    "https://wiki.openstreetmap.org/w/api.php".to_string()
}

fn default_user_agent() -> String {
    "taginfo-wiki-images/0.1.0 (get-image-info)".to_string()
}

fn default_local_image_base() -> String {
    "https://wiki.openstreetmap.org/w/images".to_string()
}

fn default_commons_image_base() -> String {
    "https://upload.wikimedia.org/wikipedia/commons".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file_name: default_database_file_name(),
        }
    }
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            connect_timeout_secs: None,
            read_timeout_secs: None,
            local_image_base: default_local_image_base(),
            commons_image_base: default_commons_image_base(),
        }
    }
}

fn non_empty_or(value: &str, fallback: fn() -> String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        trimmed.to_string()
    }
}

/// Trims string settings and restores defaults for blank ones.
pub fn sanitize_config(config: Config) -> Config {
    Config {
        database: DatabaseConfig {
            file_name: non_empty_or(&config.database.file_name, default_database_file_name),
        },
        wiki: WikiConfig {
            api_url: non_empty_or(&config.wiki.api_url, default_api_url),
            user_agent: non_empty_or(&config.wiki.user_agent, default_user_agent),
            connect_timeout_secs: config.wiki.connect_timeout_secs.filter(|secs| *secs > 0),
            read_timeout_secs: config.wiki.read_timeout_secs.filter(|secs| *secs > 0),
            local_image_base: non_empty_or(
                config.wiki.local_image_base.trim_end_matches('/'),
                default_local_image_base,
            ),
            commons_image_base: non_empty_or(
                config.wiki.commons_image_base.trim_end_matches('/'),
                default_commons_image_base,
            ),
        },
    }
}

/// Reads `DIR/get_image_info.toml`, falling back to defaults when the file is
/// missing or unreadable.
pub fn load_config(dir: &Path) -> Config {
    let config_file = dir.join(CONFIG_FILE_NAME);
    if !config_file.exists() {
        return Config::default();
    }

    let content = match std::fs::read_to_string(&config_file) {
        Ok(content) => content,
        Err(err) => {
            warn!(
                "Failed to read config, using defaults. path={} error={}",
                config_file.display(),
                err
            );
            return Config::default();
        }
    };

    match toml::from_str::<Config>(&content) {
        Ok(config) => {
            info!("Loaded config from {}", config_file.display());
            sanitize_config(config)
        }
        Err(err) => {
            warn!(
                "Failed to parse config, using defaults. path={} error={}",
                config_file.display(),
                err
            );
            Config::default()
        }
    }
}
