//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Read environment variables (`TETHER_PRIMARY_URL` is required)
//! 2. If it is missing, fall back to the first config file found
//! 3. Validate whichever configuration was produced
//!
//! ## Environment Variables
//! - `TETHER_PRIMARY_URL`: Primary backend base URL
//! - `TETHER_BACKUP_URLS`: Comma-separated backup base URLs
//! - `TETHER_HEALTH_PATH`: Health probe path
//! - `TETHER_REQUEST_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `TETHER_MAX_RETRIES`: Retries after the first attempt
//!
//! ## File Locations
//! `./tether.toml`, `./tether.json`, then `./config/tether.toml`, relative
//! to the working directory.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tether_common::{CommonError, CommonResult};
use tether_domain::{ClientConfig, TetherError};

/// Load configuration, environment first, then file
///
/// # Errors
/// Returns the file loader's error if the environment does not yield a
/// valid configuration either.
pub fn load() -> CommonResult<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from `TETHER_*` environment variables
///
/// Unset optional variables keep their defaults.
///
/// # Errors
/// Returns `CommonError::Config` if `TETHER_PRIMARY_URL` is missing, a
/// numeric variable does not parse, or validation fails.
pub fn load_from_env() -> CommonResult<ClientConfig> {
    let mut config = ClientConfig::with_primary(env_var("TETHER_PRIMARY_URL")?);

    if let Ok(backups) = std::env::var("TETHER_BACKUP_URLS") {
        config.endpoints.backup_urls = split_list(&backups);
    }
    if let Ok(path) = std::env::var("TETHER_HEALTH_PATH") {
        config.endpoints.health_path = path;
    }
    if let Some(timeout) = env_parse::<u64>("TETHER_REQUEST_TIMEOUT_SECS")? {
        config.http.request_timeout_secs = timeout;
    }
    if let Some(retries) = env_parse::<u32>("TETHER_MAX_RETRIES")? {
        config.retry.max_retries = retries;
    }

    config.validate().map_err(invalid)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Format is chosen by
/// extension.
///
/// # Errors
/// - `CommonError::Config` if no file is found or the contents fail
///   validation
/// - `CommonError::Io` if the file cannot be read
/// - `CommonError::Serialization` if the contents do not parse
pub fn load_from_file(path: Option<PathBuf>) -> CommonResult<ClientConfig> {
    let config_path = match path {
        Some(p) => p,
        None => probe_config_paths().ok_or_else(|| {
            CommonError::config("No config file found in any of the standard locations")
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CommonError::io(config_path.display().to_string(), e))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate().map_err(invalid)?;
    Ok(config)
}

/// Parse configuration text, TOML or JSON by extension
fn parse_config(contents: &str, path: &Path) -> CommonResult<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => Ok(toml::from_str(contents)?),
        "json" => Ok(serde_json::from_str(contents)?),
        _ => Err(CommonError::config(format!("Unsupported config format: {}", extension))),
    }
}

fn invalid(err: TetherError) -> CommonError {
    match err {
        TetherError::Config(msg) | TetherError::InvalidInput(msg) => CommonError::config(msg),
        other => CommonError::internal(other.to_string()),
    }
}

/// First existing config file in the standard locations
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    config_candidates(&cwd).into_iter().find(|path| path.exists())
}

fn config_candidates(dir: &Path) -> Vec<PathBuf> {
    vec![dir.join("tether.toml"), dir.join("tether.json"), dir.join("config").join("tether.toml")]
}

fn env_var(key: &str) -> CommonResult<String> {
    std::env::var(key)
        .map_err(|_| CommonError::config_field(key, "missing required environment variable"))
}

fn env_parse<T>(key: &str) -> CommonResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| CommonError::config_field(key, e.to_string())),
        Err(_) => Ok(None),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use parking_lot::{const_mutex, Mutex};
    use tempfile::TempDir;

    use super::*;

    static ENV_LOCK: Mutex<()> = const_mutex(());

    const VARS: &[&str] = &[
        "TETHER_PRIMARY_URL",
        "TETHER_BACKUP_URLS",
        "TETHER_HEALTH_PATH",
        "TETHER_REQUEST_TIMEOUT_SECS",
        "TETHER_MAX_RETRIES",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn env_overrides_defaults() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        std::env::set_var("TETHER_PRIMARY_URL", "https://api.example.com");
        std::env::set_var("TETHER_BACKUP_URLS", "https://b1.example.com, ,https://b2.example.com");
        std::env::set_var("TETHER_HEALTH_PATH", "/status");
        std::env::set_var("TETHER_REQUEST_TIMEOUT_SECS", "30");
        std::env::set_var("TETHER_MAX_RETRIES", "4");

        let config = load_from_env().unwrap();
        assert_eq!(config.endpoints.primary_url, "https://api.example.com");
        assert_eq!(
            config.endpoints.backup_urls,
            vec!["https://b1.example.com".to_string(), "https://b2.example.com".to_string()]
        );
        assert_eq!(config.endpoints.health_path, "/status");
        assert_eq!(config.http.request_timeout_secs, 30);
        assert_eq!(config.retry.max_retries, 4);
        assert_eq!(config.queue.batch_size, 5);

        clear_env();
    }

    #[test]
    fn env_requires_primary_url() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(
            matches!(err, CommonError::Config { field: Some(ref f), .. } if f == "TETHER_PRIMARY_URL")
        );
    }

    #[test]
    fn env_rejects_bad_numbers() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        std::env::set_var("TETHER_PRIMARY_URL", "https://api.example.com");
        std::env::set_var("TETHER_MAX_RETRIES", "lots");

        let err = load_from_env().unwrap_err();
        assert!(
            matches!(err, CommonError::Config { field: Some(ref f), .. } if f == "TETHER_MAX_RETRIES")
        );

        clear_env();
    }

    #[test]
    fn loads_partial_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tether.toml");
        std::fs::write(
            &path,
            r#"
[endpoints]
primary_url = "https://api.example.com"
backup_urls = ["https://backup.example.com"]

[retry]
max_retries = 1
"#,
        )
        .unwrap();

        let config = load_from_file(Some(path)).unwrap();
        assert_eq!(config.endpoints.backup_urls.len(), 1);
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.polling.healthy_interval_secs, 30);
    }

    #[test]
    fn loads_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tether.json");
        std::fs::write(
            &path,
            r#"{"endpoints": {"primary_url": "https://api.example.com"}, "logging": {"json": true}}"#,
        )
        .unwrap();

        let config = load_from_file(Some(path)).unwrap();
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn file_without_primary_fails_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tether.toml");
        std::fs::write(&path, "[queue]\nbatch_size = 2\n").unwrap();

        let err = load_from_file(Some(path)).unwrap_err();
        assert!(matches!(err, CommonError::Config { ref message, .. } if message.contains("primary_url")));
    }

    #[test]
    fn missing_file_reports_the_path() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/tether.toml")));
        assert!(
            matches!(result, Err(CommonError::Io { ref path, .. }) if path == "/nonexistent/tether.toml")
        );
    }

    #[test]
    fn malformed_files_name_their_format() {
        let err = parse_config("[endpoints", Path::new("tether.toml")).unwrap_err();
        assert!(matches!(err, CommonError::Serialization { format: Some(ref f), .. } if f == "TOML"));

        let err = parse_config("{", Path::new("tether.json")).unwrap_err();
        assert!(matches!(err, CommonError::Serialization { format: Some(ref f), .. } if f == "JSON"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let result = parse_config("primary_url: x", Path::new("tether.yaml"));
        assert!(matches!(result, Err(CommonError::Config { message, .. }) if message.contains("yaml")));
    }

    #[test]
    fn candidates_are_probed_in_order() {
        let dir = TempDir::new().unwrap();
        let candidates = config_candidates(dir.path());
        assert_eq!(candidates[0], dir.path().join("tether.toml"));
        assert_eq!(candidates[2], dir.path().join("config/tether.toml"));

        std::fs::create_dir(dir.path().join("config")).unwrap();
        std::fs::write(&candidates[2], "").unwrap();
        std::fs::write(&candidates[1], "{}").unwrap();
        let found = candidates.into_iter().find(|p| p.exists()).unwrap();
        assert_eq!(found, dir.path().join("tether.json"));
    }
}
