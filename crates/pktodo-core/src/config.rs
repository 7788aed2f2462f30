use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Deserialize;
use tracing::{debug, info, warn};

pub const DEFAULT_PIN: &str = "2548";
pub const DEFAULT_FORM_THRESHOLD: f64 = 30.0;

const URL_VARS: [&str; 2] = ["PKTODO_STORE_URL", "SUPABASE_URL"];
const KEY_VARS: [&str; 2] = ["PKTODO_STORE_KEY", "SUPABASE_ANON_KEY"];
const PIN_VAR: &str = "PKTODO_PIN";
const CONFIG_VAR: &str = "PKTODO_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub gate: GateConfig,
    pub view: ViewConfig,
    pub form: FormConfig,
    #[serde(skip)]
    pub loaded_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub table: String,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            access_key: None,
            table: "todos".to_string(),
            timeout_secs: 30,
        }
    }
}

impl StoreConfig {
    /// Endpoint and access key, both required to reach the remote store.
    pub fn connection(&self) -> anyhow::Result<(&str, &str)> {
        let endpoint = non_blank(self.endpoint.as_deref()).ok_or_else(|| {
            anyhow!("store endpoint is not configured (set PKTODO_STORE_URL or [store].endpoint)")
        })?;
        let access_key = non_blank(self.access_key.as_deref()).ok_or_else(|| {
            anyhow!("store access key is not configured (set PKTODO_STORE_KEY or [store].access_key)")
        })?;
        Ok((endpoint, access_key))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub pin: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            pin: DEFAULT_PIN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub form_threshold: f64,
    pub form_hysteresis: f64,
    pub color: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            form_threshold: DEFAULT_FORM_THRESHOLD,
            form_hysteresis: 0.0,
            color: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub keep_draft_on_failure: bool,
}

impl Config {
    /// Defaults, then the config file if one is found, then the process
    /// environment.
    #[tracing::instrument(skip(config_override))]
    pub fn load(config_override: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = match resolve_config_path(config_override) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) if config_override.is_some() => {
                return Err(anyhow!("config file {} does not exist", path.display()));
            }
            Some(path) => {
                debug!(path = %path.display(), "no config file; using defaults");
                Self::default()
            }
            None => {
                warn!("cannot determine config directory; using defaults");
                Self::default()
            }
        };

        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    #[tracing::instrument]
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut cfg: Config =
            toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
        cfg.loaded_file = Some(path.to_path_buf());
        info!(path = %path.display(), "loaded config file");
        Ok(cfg)
    }

    /// Environment wins over the file. `lookup` is `std::env::var` outside
    /// of tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| lookup(key).filter(|value| !value.trim().is_empty()))
        };

        if let Some(url) = first(&URL_VARS) {
            debug!("store endpoint taken from environment");
            self.store.endpoint = Some(url);
        }
        if let Some(key) = first(&KEY_VARS) {
            debug!("store access key taken from environment");
            self.store.access_key = Some(key);
        }
        if let Some(pin) = lookup(PIN_VAR) {
            self.gate.pin = pin;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.view.form_threshold.is_finite() || self.view.form_threshold < 0.0 {
            return Err(anyhow!(
                "view.form_threshold must be a non-negative number, got {}",
                self.view.form_threshold
            ));
        }
        if !self.view.form_hysteresis.is_finite() || self.view.form_hysteresis < 0.0 {
            return Err(anyhow!(
                "view.form_hysteresis must be a non-negative number, got {}",
                self.view.form_hysteresis
            ));
        }
        if self.gate.pin.is_empty() {
            return Err(anyhow!("gate.pin cannot be empty"));
        }
        Ok(())
    }
}

fn resolve_config_path(config_override: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = config_override {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_VAR)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("pktodo").join("config.toml"))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
