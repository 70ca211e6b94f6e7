use std::path::{Path, PathBuf};
use std::time::Duration;

use ocmtf_client::ClientConfig;
use serde::{Deserialize, Serialize};

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

/// Points at a config file other than the default one.
pub const CONFIG_ENV: &str = "OCMTF_CONFIG";
pub const URL_ENV: &str = "OCM_URL";
pub const TOKEN_ENV: &str = "OCM_TOKEN";

const DEFAULT_URL: &str = "https://api.openshift.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcmtfConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// How often cluster readiness is polled.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Where resource state lives. Defaults to `state.json` next to the config.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_poll_interval() -> u64 {
    30
}

impl Default for OcmtfConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            url: default_url(),
            token: None,
            request_timeout_secs: default_request_timeout(),
            poll_interval_secs: default_poll_interval(),
            state_path: None,
        }
    }
}

impl OcmtfConfig {
    /// Apply `OCM_URL` / `OCM_TOKEN` style overrides from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(URL_ENV).filter(|v| !v.is_empty()) {
            self.url = url;
        }
        if let Some(token) = lookup(TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            url: self.url.clone(),
            token: self.token.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            ..Default::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn state_path(&self) -> eyre::Result<PathBuf> {
        match &self.state_path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join("state.json")),
        }
    }
}

fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("ocmtf"))
}

/// `$OCMTF_CONFIG`, or `config.json` in the platform config directory.
pub fn config_path() -> eyre::Result<PathBuf> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Ok(config_dir()?.join("config.json")),
    }
}

/// Load the config with environment overrides applied. A missing file
/// yields the defaults.
pub fn load_config() -> eyre::Result<OcmtfConfig> {
    let path = config_path()?;
    let mut config = if path.exists() {
        load_from(&path)?
    } else {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        OcmtfConfig::default()
    };
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

pub fn load_from(path: &Path) -> eyre::Result<OcmtfConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: OcmtfConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update ocmtf."
        ));
    }

    // v0 -> v1: `api_url` became `url`
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        if let Some(url) = obj.remove("api_url") {
            obj.entry("url").or_insert(url);
        }
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 -> v1 (renamed api_url to url)");
    }

    Ok(json)
}

pub fn save_to(config: &OcmtfConfig, path: &Path) -> eyre::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;
    let json = serde_json::to_string_pretty(&stamped)?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    // The token is a credential.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}
