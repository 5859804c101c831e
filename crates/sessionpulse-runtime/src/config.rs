use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sessionpulse_engine::mtba::{DEFAULT_THRESHOLD_SECONDS, DEFAULT_WINDOW_SIZE};
use sessionpulse_engine::resolver::DEFAULT_TIMEOUT_SECONDS;
use sessionpulse_engine::timing::{DEFAULT_E2E_THRESHOLD_SECONDS, DEFAULT_TTFT_THRESHOLD_SECONDS};
use sessionpulse_engine::{
    LatencyThresholds, MtbaPolicy, ResolverPolicy, DEFAULT_SESSION_DATA_KEYS,
};
use std::path::{Path, PathBuf};

/// Resolve the config file path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. SESSIONPULSE_CONFIG environment variable (with tilde expansion)
/// 3. XDG config directory
pub fn resolve_config_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("SESSIONPULSE_CONFIG") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(config_dir) = dirs::config_dir() {
        return Ok(config_dir.join("sessionpulse").join("config.toml"));
    }

    Err(Error::Config(
        "Could not determine config path: no XDG config directory found".to_string(),
    ))
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Step limit used when a session is started with `max_steps == 0`.
    pub max_steps: u32,
    pub timeout_seconds: f64,
    /// Finalized sessions retained for windowed queries.
    pub history_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_steps: 50,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            history_capacity: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MtbaConfig {
    pub window_size: usize,
    pub history_capacity: usize,
    pub threshold_seconds: f64,
}

impl Default for MtbaConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            history_capacity: 100,
            threshold_seconds: DEFAULT_THRESHOLD_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    pub ttft_threshold_seconds: f64,
    pub e2e_threshold_seconds: f64,
    pub operation_history_capacity: usize,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            ttft_threshold_seconds: DEFAULT_TTFT_THRESHOLD_SECONDS,
            e2e_threshold_seconds: DEFAULT_E2E_THRESHOLD_SECONDS,
            operation_history_capacity: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Top-level response keys captured as session data.
    pub session_data_keys: Vec<String>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            session_data_keys: DEFAULT_SESSION_DATA_KEYS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub sessions: SessionConfig,
    pub mtba: MtbaConfig,
    pub latency: LatencyConfig,
    pub indicators: IndicatorConfig,
}

impl MetricsConfig {
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path(None)?;
        Self::load_from(&config_path)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MetricsConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.mtba.window_size < 2 {
            return Err(Error::Config(format!(
                "mtba.window_size must be at least 2, got {}",
                self.mtba.window_size
            )));
        }
        let positive = [
            ("sessions.timeout_seconds", self.sessions.timeout_seconds),
            ("mtba.threshold_seconds", self.mtba.threshold_seconds),
            (
                "latency.ttft_threshold_seconds",
                self.latency.ttft_threshold_seconds,
            ),
            (
                "latency.e2e_threshold_seconds",
                self.latency.e2e_threshold_seconds,
            ),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn resolver_policy(&self) -> ResolverPolicy {
        ResolverPolicy {
            timeout_seconds: self.sessions.timeout_seconds,
        }
    }

    pub fn mtba_policy(&self) -> MtbaPolicy {
        MtbaPolicy {
            window_size: self.mtba.window_size,
            threshold_seconds: self.mtba.threshold_seconds,
        }
    }

    pub fn latency_thresholds(&self) -> LatencyThresholds {
        LatencyThresholds {
            ttft_seconds: self.latency.ttft_threshold_seconds,
            e2e_seconds: self.latency.e2e_threshold_seconds,
        }
    }
}
