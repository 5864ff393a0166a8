//! Discovery configuration — the options table from the spec's external
//! interfaces section. Loaded programmatically (via [`ExplorerConfig`]
//! directly) or from a `graphscout.json` file with environment-variable
//! fallbacks, following the same `resolve_*` pattern the teacher codebase
//! uses for its own JSON-config-plus-env-fallback loader.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppType {
    ComponentRoot,
    DataframeDashboard,
    Generic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    pub app_name: String,
    pub entry_points: Vec<String>,
    #[serde(default)]
    pub app_type: Option<AppType>,
    #[serde(default)]
    pub login_credentials: Option<LoginCredentials>,
    #[serde(default = "defaults::max_depth")]
    pub max_depth: usize,
    #[serde(default = "defaults::max_nodes")]
    pub max_nodes: usize,
    #[serde(default = "defaults::max_elements_per_page")]
    pub max_elements_per_page: usize,
    #[serde(default = "defaults::headless")]
    pub headless: bool,
    #[serde(default)]
    pub slow_mo_ms: u64,
    #[serde(default = "defaults::timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub domain_whitelist: Vec<String>,
}

mod defaults {
    pub fn max_depth() -> usize {
        4
    }
    pub fn max_nodes() -> usize {
        50
    }
    pub fn max_elements_per_page() -> usize {
        30
    }
    pub fn headless() -> bool {
        true
    }
    pub fn timeout_ms() -> u64 {
        300_000
    }
}

impl ExplorerConfig {
    /// Minimal config with a single entry point and every other field at
    /// its documented default.
    pub fn new(app_name: impl Into<String>, entry_point: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            entry_points: vec![entry_point.into()],
            app_type: None,
            login_credentials: None,
            max_depth: defaults::max_depth(),
            max_nodes: defaults::max_nodes(),
            max_elements_per_page: defaults::max_elements_per_page(),
            headless: defaults::headless(),
            slow_mo_ms: 0,
            timeout_ms: defaults::timeout_ms(),
            domain_whitelist: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), crate::error::DiscoveryError> {
        if self.entry_points.is_empty() {
            return Err(crate::error::DiscoveryError::NoEntryPoints);
        }
        Ok(())
    }
}

/// Load a `graphscout.json` from the current directory, falling back to
/// `GRAPHSCOUT_CONFIG` env var path. Missing file or parse error both yield
/// `None` (callers should already have a programmatic default to fall back
/// on — unlike the teacher's `ShadowConfig`, there is no sensible
/// all-defaults `ExplorerConfig` since `entry_points` is mandatory).
pub fn load_config_file() -> Option<ExplorerConfig> {
    let candidates: Vec<std::path::PathBuf> = {
        let mut v = vec![std::path::PathBuf::from("graphscout.json")];
        if let Ok(env_path) = std::env::var("GRAPHSCOUT_CONFIG") {
            v.insert(0, std::path::PathBuf::from(env_path));
        }
        v
    };

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            match serde_json::from_str::<ExplorerConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("graphscout: loaded config from {}", path.display());
                    return Some(cfg);
                }
                Err(e) => {
                    tracing::warn!(
                        "graphscout: failed to parse {}: {} (ignoring)",
                        path.display(),
                        e
                    );
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = ExplorerConfig::new("app", "https://example.test/");
        assert_eq!(cfg.max_depth, 4);
        assert_eq!(cfg.max_nodes, 50);
        assert_eq!(cfg.max_elements_per_page, 30);
        assert_eq!(cfg.timeout_ms, 300_000);
        assert!(cfg.headless);
    }

    #[test]
    fn validate_rejects_empty_entry_points() {
        let mut cfg = ExplorerConfig::new("app", "https://example.test/");
        cfg.entry_points.clear();
        assert!(cfg.validate().is_err());
    }
}
