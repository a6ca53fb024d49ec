//! Effective configuration with provenance
//!
//! Captures the merged intake configuration together with the sources that
//! contributed to it, so an operator can see which file set which value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use super::policy::{IntakePolicy, MAX_UPLOAD_CEILING};

pub const SCHEMA_VERSION: u32 = 1;

pub const SCHEMA_ID: &str = "emailflow/intake_config@1";

/// Host config location relative to `$HOME`.
pub const HOST_CONFIG_PATH: &str = ".config/emailflow/intake.toml";

/// Repo config location relative to the project root.
pub const REPO_CONFIG_PATH: &str = ".emailflow/intake.toml";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Host,
    Repo,
    Cli,
}

/// A contributing config source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub schema_version: u32,

    pub schema_id: String,

    pub created_at: DateTime<Utc>,

    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

/// Default host config path, if `$HOME` is set.
pub fn default_host_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(HOST_CONFIG_PATH))
}

/// Default repo config path under `root`.
pub fn default_repo_path(root: &Path) -> PathBuf {
    root.join(REPO_CONFIG_PATH)
}

impl EffectiveConfig {
    /// Build effective config from layers.
    ///
    /// Missing files are skipped; files that exist but do not parse are errors.
    pub fn build(
        host_config_path: Option<&Path>,
        repo_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        for (origin, path) in [
            (ConfigOrigin::Host, host_config_path),
            (ConfigOrigin::Repo, repo_config_path),
        ] {
            let Some(path) = path else { continue };
            if !path.exists() {
                tracing::debug!(?origin, path = %path.display(), "config file not present");
                continue;
            }
            let (value, digest) = load_toml_file(path)?;
            tracing::debug!(?origin, path = %path.display(), %digest, "config layer loaded");
            layers.push(value);
            sources.push(ConfigSource {
                origin,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            if !cli.is_object() {
                return Err(ConfigError::ParseError(
                    "CLI overrides must be a JSON object".to_string(),
                ));
            }
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        validate_config(&merged)?;

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config: merged,
            sources,
        })
    }

    /// Typed policy for the page controller.
    pub fn policy(&self) -> Result<IntakePolicy, ConfigError> {
        IntakePolicy::from_value(&self.config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a config value by dot-separated path
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(|v| v.as_u64())
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }
}

/// Load and parse a TOML file, returning the value and digest
fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

    let digest = hex::encode(Sha256::digest(&bytes));

    let contents = String::from_utf8(bytes)
        .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

    let toml_value: toml::Value = toml::from_str(&contents)
        .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

    Ok((toml_to_json(toml_value), digest))
}

fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn lookup<'a>(config: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(config, |v, part| v.get(part))
}

fn require_u64(config: &Value, path: &str) -> Result<u64, ConfigError> {
    lookup(config, path)
        .and_then(Value::as_u64)
        .ok_or_else(|| ConfigError::ValidationError(format!("{} must be a non-negative integer", path)))
}

fn require_range(config: &Value, path: &str, max: u64) -> Result<u64, ConfigError> {
    let value = require_u64(config, path)?;
    if value == 0 || value > max {
        return Err(ConfigError::ValidationError(format!(
            "{} must be in (0, {}]",
            path, max
        )));
    }
    Ok(value)
}

fn require_one_of(config: &Value, path: &str, allowed: &[&str]) -> Result<(), ConfigError> {
    match lookup(config, path).and_then(Value::as_str) {
        Some(v) if allowed.contains(&v) => Ok(()),
        _ => Err(ConfigError::ValidationError(format!(
            "{} must be one of: {}",
            path,
            allowed.join(", ")
        ))),
    }
}

/// Validate bounds and enumerations on the merged config.
fn validate_config(config: &Value) -> Result<(), ConfigError> {
    require_range(config, "upload.max_bytes", MAX_UPLOAD_CEILING)?;

    let extension = lookup(config, "upload.extension")
        .and_then(Value::as_str)
        .map(|e| e.trim_start_matches('.'))
        .unwrap_or_default();
    if extension.is_empty() {
        return Err(ConfigError::ValidationError(
            "upload.extension must not be empty".to_string(),
        ));
    }

    require_one_of(config, "submit.mode", &["navigation", "in_page"])?;
    require_range(config, "submit.timeout_seconds", 300)?;

    let interval = require_range(config, "poll.interval_seconds", 3600)?;
    let jitter = require_u64(config, "poll.jitter_ms")?;
    if jitter > interval * 1000 {
        return Err(ConfigError::ValidationError(format!(
            "poll.jitter_ms must not exceed the poll interval ({} ms)",
            interval * 1000
        )));
    }
    require_one_of(config, "poll.refresh", &["partial", "reload"])?;
    let routes_ok = lookup(config, "poll.routes")
        .and_then(Value::as_array)
        .map(|routes| !routes.is_empty() && routes.iter().all(|r| r.as_str().is_some_and(|s| s.starts_with('/'))))
        .unwrap_or(false);
    if !routes_ok {
        return Err(ConfigError::ValidationError(
            "poll.routes must be a non-empty list of absolute paths".to_string(),
        ));
    }

    require_range(config, "notify.duration_ms", 600_000)?;
    require_u64(config, "notify.fade_ms")?;
    require_range(config, "hint.debounce_ms", 10_000)?;

    Ok(())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_build_with_defaults_only() {
        let config = EffectiveConfig::build(None, None, None).unwrap();

        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.get_u64("upload.max_bytes"), Some(50 * 1024 * 1024));
        assert_eq!(config.get_str("submit.mode"), Some("navigation"));
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].origin, ConfigOrigin::Builtin);
    }

    #[test]
    fn test_build_with_cli_override() {
        let cli = json!({"poll": {"interval_seconds": 10}});
        let config = EffectiveConfig::build(None, None, Some(cli)).unwrap();

        assert_eq!(config.get_u64("poll.interval_seconds"), Some(10));
        assert_eq!(config.get_str("poll.refresh"), Some("partial"));
        assert_eq!(config.sources.last().unwrap().origin, ConfigOrigin::Cli);
    }

    #[test]
    fn test_validation_max_bytes() {
        for bad in [0u64, MAX_UPLOAD_CEILING + 1] {
            let cli = json!({"upload": {"max_bytes": bad}});
            let err = EffectiveConfig::build(None, None, Some(cli)).unwrap_err();
            assert!(err.to_string().contains("upload.max_bytes"));
        }
    }

    #[test]
    fn test_validation_jitter_bounded_by_interval() {
        let cli = json!({"poll": {"interval_seconds": 2, "jitter_ms": 2001}});
        let err = EffectiveConfig::build(None, None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("poll.jitter_ms"));

        let cli = json!({"poll": {"interval_seconds": 2, "jitter_ms": 2000}});
        assert!(EffectiveConfig::build(None, None, Some(cli)).is_ok());
    }

    #[test]
    fn test_validation_submit_mode() {
        let cli = json!({"submit": {"mode": "ajax"}});
        let err = EffectiveConfig::build(None, None, Some(cli)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("submit.mode"));
    }

    #[test]
    fn test_validation_empty_routes() {
        let cli = json!({"poll": {"routes": []}});
        let err = EffectiveConfig::build(None, None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("poll.routes"));
    }

    #[test]
    fn test_cli_must_be_object() {
        let err = EffectiveConfig::build(None, None, Some(json!(5))).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_toml_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "[submit]").unwrap();
        writeln!(temp, "mode = \"in_page\"").unwrap();
        writeln!(temp, "timeout_seconds = 45").unwrap();

        let config = EffectiveConfig::build(Some(temp.path()), None, None).unwrap();

        assert_eq!(config.get_str("submit.mode"), Some("in_page"));
        assert_eq!(config.get_u64("submit.timeout_seconds"), Some(45));
        let host = &config.sources[1];
        assert_eq!(host.origin, ConfigOrigin::Host);
        assert_eq!(host.digest.as_deref().map(str::len), Some(64));
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let config = EffectiveConfig::build(Some(&missing), None, None).unwrap();
        assert_eq!(config.sources.len(), 1);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "[poll").unwrap();
        let err = EffectiveConfig::build(None, Some(temp.path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_policy_from_effective() {
        let cli = json!({"poll": {"refresh": "reload", "jitter_ms": 500}});
        let policy = EffectiveConfig::build(None, None, Some(cli))
            .unwrap()
            .policy()
            .unwrap();
        let poller = policy.poller_config();
        assert_eq!(poller.refresh, crate::poller::RefreshStrategy::Reload);
        assert_eq!(poller.jitter, std::time::Duration::from_millis(500));
    }

    #[test]
    fn test_default_repo_path() {
        let path = default_repo_path(Path::new("/srv/app"));
        assert_eq!(path, PathBuf::from("/srv/app/.emailflow/intake.toml"));
    }
}
