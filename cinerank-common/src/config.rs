//! Configuration loading and root folder resolution

use crate::Result;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default HTTP listen port for the cinerank service
pub const DEFAULT_PORT: u16 = 5730;

/// Environment variable naming the root data folder
pub const ROOT_ENV_VAR: &str = "CINERANK_ROOT";

/// Environment variable naming the HTTP listen port
pub const PORT_ENV_VAR: &str = "CINERANK_PORT";

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. `CINERANK_ROOT` environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(value) = read_config_string("root_folder") {
        return PathBuf::from(value);
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Listen port resolution: CLI argument, then `CINERANK_PORT`, then default
pub fn resolve_port(cli_arg: Option<u16>) -> u16 {
    if let Some(port) = cli_arg {
        return port;
    }

    if let Ok(raw) = std::env::var(PORT_ENV_VAR) {
        match raw.parse::<u16>() {
            Ok(port) => return port,
            Err(_) => warn!("Ignoring invalid {}={:?}", PORT_ENV_VAR, raw),
        }
    }

    DEFAULT_PORT
}

/// Path of the SQLite database inside the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join("cinerank.db")
}

/// Path of the seed title list inside the root folder
pub fn seed_path(root: &Path) -> PathBuf {
    root.join("seed.toml")
}

/// Credentials for the poster artwork pipeline (OMDB search + TMDB images)
#[derive(Debug, Clone)]
pub struct ArtworkCredentials {
    pub omdb_api_key: String,
    pub tmdb_api_token: String,
}

/// Load artwork credentials from the environment
/// (`CINERANK_OMDB_API_KEY` / `CINERANK_TMDB_TOKEN`), falling back to the
/// `[artwork]` table of the config file.
///
/// Returns `None` when either credential is missing; artwork lookups are
/// disabled in that case and items are ranked without posters.
pub fn load_artwork_credentials() -> Option<ArtworkCredentials> {
    let omdb_api_key = std::env::var("CINERANK_OMDB_API_KEY")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| read_config_table_string("artwork", "omdb_api_key"));
    let tmdb_api_token = std::env::var("CINERANK_TMDB_TOKEN")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| read_config_table_string("artwork", "tmdb_api_token"));

    match (omdb_api_key, tmdb_api_token) {
        (Some(omdb_api_key), Some(tmdb_api_token)) => Some(ArtworkCredentials {
            omdb_api_key,
            tmdb_api_token,
        }),
        _ => {
            warn!("Artwork credentials not configured; poster lookups disabled");
            None
        }
    }
}

/// Get the configuration file path for the platform, if one exists
fn config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("cinerank").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/cinerank/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Read a top-level string value from the config file
fn read_config_string(key: &str) -> Option<String> {
    let path = config_file()?;
    let content = std::fs::read_to_string(&path).ok()?;
    let config = toml::from_str::<toml::Value>(&content).ok()?;
    config.get(key).and_then(|v| v.as_str()).map(String::from)
}

/// Read a string value from a named table of the config file
fn read_config_table_string(table: &str, key: &str) -> Option<String> {
    let path = config_file()?;
    let content = std::fs::read_to_string(&path).ok()?;
    let config = toml::from_str::<toml::Value>(&content).ok()?;
    config
        .get(table)
        .and_then(|t| t.get(key))
        .and_then(|v| v.as_str())
        .map(String::from)
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("cinerank"))
        .unwrap_or_else(|| PathBuf::from("./cinerank_data"))
}

/// Create the root folder if it does not exist yet
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root)?;
    Ok(())
}
