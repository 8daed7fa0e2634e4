//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid configuration:
//!
//! ```toml
//! baseline_year = 2020
//! fetch_timeout_seconds = 30.0
//! tile_url_template = "/tiles/{scenario_id}/{z}/{x}/{y}.png"
//!
//! [cache]
//! max_size = 100
//! ttl_hours = 24.0
//!
//! [provider]
//! type = "ArchiveProvider"
//! root = "/srv/baselines"
//! ```

use crate::baseline::{BaselineProvider, SyntheticProvider};
use crate::cache::{DEFAULT_MAX_SIZE, DEFAULT_TTL};
use crate::errors::{AltEarthError, AltEarthResult};
use crate::FloatValue;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Reference year that every scenario's deltas are applied against
pub const DEFAULT_BASELINE_YEAR: i32 = 2020;
/// Placeholder replaced by the scenario id in tile URLs
pub const SCENARIO_ID_PLACEHOLDER: &str = "{scenario_id}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached scenarios
    /// default: 100
    pub max_size: usize,
    /// Lifetime of a cached scenario
    /// unit: hours
    /// default: 24
    pub ttl_hours: FloatValue,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            ttl_hours: DEFAULT_TTL.as_secs_f64() / 3600.0,
        }
    }
}

impl CacheConfig {
    /// Entry lifetime, saturating for values `validate` would reject
    pub fn ttl(&self) -> Duration {
        Duration::try_from_secs_f64(self.ttl_hours * 3600.0).unwrap_or(Duration::MAX)
    }
}

/// Convert a positive number of seconds, rejecting values no `Duration` can hold
fn positive_duration(field: &str, seconds: FloatValue) -> AltEarthResult<Duration> {
    if !(seconds.is_finite() && seconds > 0.0) {
        return Err(AltEarthError::Config(format!(
            "{field} must be positive, got {seconds}"
        )));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| AltEarthError::Config(format!("{field} is out of range: {e}")))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// default: 2020
    pub baseline_year: i32,
    /// Upper bound on a baseline fetch before falling back to synthetic data.
    /// `None` waits for the provider indefinitely.
    /// unit: seconds
    /// default: 30
    pub fetch_timeout_seconds: Option<FloatValue>,
    /// Map tile URL, with `{scenario_id}` substituted per scenario
    pub tile_url_template: String,
    pub cache: CacheConfig,
    /// Source of baseline data
    /// default: synthetic
    pub provider: Arc<dyn BaselineProvider>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            baseline_year: DEFAULT_BASELINE_YEAR,
            fetch_timeout_seconds: Some(30.0),
            tile_url_template: "/tiles/{scenario_id}/{z}/{x}/{y}.png".to_string(),
            cache: CacheConfig::default(),
            provider: Arc::new(SyntheticProvider::new()),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> AltEarthResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| AltEarthError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> AltEarthResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AltEarthError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> AltEarthResult<()> {
        if self.cache.max_size == 0 {
            return Err(AltEarthError::Config(
                "cache.max_size must be at least 1".to_string(),
            ));
        }
        if !(self.cache.ttl_hours.is_finite() && self.cache.ttl_hours > 0.0) {
            return Err(AltEarthError::Config(format!(
                "cache.ttl_hours must be positive, got {}",
                self.cache.ttl_hours
            )));
        }
        positive_duration("cache.ttl_hours", self.cache.ttl_hours * 3600.0)?;
        if let Some(timeout) = self.fetch_timeout_seconds {
            positive_duration("fetch_timeout_seconds", timeout)?;
        }
        if !self.tile_url_template.contains(SCENARIO_ID_PLACEHOLDER) {
            return Err(AltEarthError::Config(format!(
                "tile_url_template must contain {SCENARIO_ID_PLACEHOLDER}"
            )));
        }
        Ok(())
    }

    /// Fetch bound, saturating for values `validate` would reject
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_seconds
            .map(|seconds| Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX))
    }

    pub fn tile_url(&self, scenario_id: &str) -> String {
        self.tile_url_template
            .replace(SCENARIO_ID_PLACEHOLDER, scenario_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.baseline_year, 2020);
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.cache.max_size, 100);
        assert_eq!(config.cache.ttl(), Duration::from_secs(24 * 3600));
        assert_eq!(config.fetch_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.provider.name(), "synthetic");
    }

    #[test]
    fn test_full_document() {
        let config = EngineConfig::from_toml_str(
            r#"
            baseline_year = 2021
            fetch_timeout_seconds = 2.5
            tile_url_template = "https://tiles.example.org/{scenario_id}/{z}/{x}/{y}.png"

            [cache]
            max_size = 10
            ttl_hours = 0.5

            [provider]
            type = "ArchiveProvider"
            root = "/srv/baselines"
            "#,
        )
        .unwrap();

        assert_eq!(config.baseline_year, 2021);
        assert_eq!(config.fetch_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.cache.max_size, 10);
        assert_eq!(config.cache.ttl(), Duration::from_secs(1800));
        assert_eq!(config.provider.name(), "archive");
        assert_eq!(
            config.tile_url("abc"),
            "https://tiles.example.org/abc/{z}/{x}/{y}.png"
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for document in [
            "[cache]\nmax_size = 0",
            "[cache]\nttl_hours = -1.0",
            "fetch_timeout_seconds = 0.0",
            "fetch_timeout_seconds = 1e20",
            "[cache]\nttl_hours = 1e17",
            "tile_url_template = \"/tiles/{z}/{x}/{y}.png\"",
            "[provider]\ntype = \"NoSuchProvider\"",
            "baseline_year = \"soon\"",
        ] {
            let result = EngineConfig::from_toml_str(document);
            assert!(
                matches!(result, Err(AltEarthError::Config(_))),
                "expected config error for {document:?}"
            );
        }
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "[cache]\nmax_size = 3\n").unwrap();
        let config = EngineConfig::from_path(&path).unwrap();
        assert_eq!(config.cache.max_size, 3);

        assert!(EngineConfig::from_path(dir.path().join("missing.toml")).is_err());
    }
}
