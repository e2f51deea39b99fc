//! Configuration for a reprojection run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReprojectError;
use crate::resampler::Resampler;

/// How the output raster is cut into work units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartitionStrategy {
    /// Horizontal bands, a fixed number of them.
    Count,
    /// Quad subdivision until every partition is small enough.
    #[default]
    Size,
    /// Cut on a tile grid, then quad-split oversized tiles.
    Tile,
    /// Workload-balanced quadtree grown to a leaf budget.
    Quadtree,
}

impl PartitionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Size => "size",
            Self::Tile => "tile",
            Self::Quadtree => "quadtree",
        }
    }
}

impl FromStr for PartitionStrategy {
    type Err = ReprojectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "size" => Ok(Self::Size),
            "tile" => Ok(Self::Tile),
            "quadtree" => Ok(Self::Quadtree),
            other => Err(ReprojectError::config(format!(
                "unknown partition strategy '{other}' (expected count, size, tile or quadtree)"
            ))),
        }
    }
}

impl fmt::Display for PartitionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settings shared by every rank of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReprojectConfig {
    pub partition_strategy: PartitionStrategy,

    /// Number of bands for [`PartitionStrategy::Count`], or the leaf budget
    /// for [`PartitionStrategy::Quadtree`]. Zero means one per process.
    pub partition_count: usize,

    /// Maximum pixels per partition for the size and tile strategies.
    pub partition_size: u64,

    /// Tile edge in pixels for [`PartitionStrategy::Tile`].
    pub tile_size: u64,

    pub resampler: Resampler,

    /// Written where a destination pixel has no valid source.
    pub fill_value: f64,

    /// Number of ranks to run.
    pub processes: usize,

    /// Output pixel size in output units. `None` reuses the input pixel size.
    pub pixel_size: Option<f64>,
}

impl Default for ReprojectConfig {
    fn default() -> Self {
        Self {
            partition_strategy: PartitionStrategy::Size,
            partition_count: 0,
            partition_size: 1_000_000,
            tile_size: 256,
            resampler: Resampler::Nearest,
            fill_value: 0.0,
            processes: 1,
            pixel_size: None,
        }
    }
}

impl ReprojectConfig {
    /// Load configuration from `PRB_*` environment variables on top of the
    /// defaults. A set but unparseable variable is a configuration error.
    pub fn from_env() -> Result<Self, ReprojectError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`ReprojectConfig::from_env`] with `var` standing in for the
    /// environment.
    pub fn from_vars<F>(var: F) -> Result<Self, ReprojectError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(strategy) = parse_var(&var, "PRB_PARTITION_STRATEGY")? {
            config.partition_strategy = strategy;
        }
        if let Some(count) = parse_var(&var, "PRB_PARTITION_COUNT")? {
            config.partition_count = count;
        }
        if let Some(size) = parse_var(&var, "PRB_PARTITION_SIZE")? {
            config.partition_size = size;
        }
        if let Some(size) = parse_var(&var, "PRB_TILE_SIZE")? {
            config.tile_size = size;
        }
        if let Some(resampler) = parse_var(&var, "PRB_RESAMPLER")? {
            config.resampler = resampler;
        }
        if let Some(fill) = parse_var(&var, "PRB_FILL_VALUE")? {
            config.fill_value = fill;
        }
        if let Some(processes) = parse_var(&var, "PRB_PROCESSES")? {
            config.processes = processes;
        }
        if let Some(size) = parse_var(&var, "PRB_PIXEL_SIZE")? {
            config.pixel_size = Some(size);
        }

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.processes == 0 {
            return Err("processes must be > 0".to_string());
        }

        if self.partition_size == 0 {
            return Err("partition_size must be > 0".to_string());
        }

        if self.partition_strategy == PartitionStrategy::Tile && self.tile_size == 0 {
            return Err("tile_size must be > 0".to_string());
        }

        if !self.fill_value.is_finite() {
            return Err("fill_value must be finite".to_string());
        }

        if let Some(size) = self.pixel_size {
            if !(size.is_finite() && size > 0.0) {
                return Err("pixel_size must be a positive number".to_string());
            }
        }

        Ok(())
    }

    /// Number of count-strategy bands for a run of `processes` ranks.
    pub fn band_count(&self) -> usize {
        if self.partition_count == 0 {
            self.processes
        } else {
            self.partition_count
        }
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>, ReprojectError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|val| {
            val.trim()
                .parse()
                .map_err(|e| ReprojectError::config(format!("{key}={val}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReprojectConfig::default();
        assert_eq!(config.partition_strategy, PartitionStrategy::Size);
        assert_eq!(config.resampler, Resampler::Nearest);
        assert_eq!(config.processes, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ReprojectConfig::default();
        config.processes = 0;
        assert!(config.validate().is_err());

        config = ReprojectConfig::default();
        config.partition_size = 0;
        assert!(config.validate().is_err());

        config = ReprojectConfig::default();
        config.partition_strategy = PartitionStrategy::Tile;
        config.tile_size = 0;
        assert!(config.validate().is_err());

        config = ReprojectConfig::default();
        config.pixel_size = Some(-1.0);
        assert!(config.validate().is_err());

        config = ReprojectConfig::default();
        config.fill_value = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partition_strategy_from_str() {
        assert_eq!("count".parse::<PartitionStrategy>().unwrap(), PartitionStrategy::Count);
        assert_eq!("SIZE".parse::<PartitionStrategy>().unwrap(), PartitionStrategy::Size);
        assert_eq!("tile".parse::<PartitionStrategy>().unwrap(), PartitionStrategy::Tile);
        assert_eq!(
            "quadtree".parse::<PartitionStrategy>().unwrap(),
            PartitionStrategy::Quadtree
        );
        assert!("bogus".parse::<PartitionStrategy>().is_err());
    }

    #[test]
    fn test_band_count_defaults_to_processes() {
        let mut config = ReprojectConfig {
            processes: 4,
            ..Default::default()
        };
        assert_eq!(config.band_count(), 4);
        config.partition_count = 7;
        assert_eq!(config.band_count(), 7);
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn test_from_vars_applies_overrides() {
        let config = ReprojectConfig::from_vars(vars(&[
            ("PRB_PARTITION_STRATEGY", "tile"),
            ("PRB_TILE_SIZE", "64"),
            ("PRB_RESAMPLER", "mean"),
            ("PRB_PROCESSES", "3"),
            ("PRB_PIXEL_SIZE", "250.5"),
        ]))
        .unwrap();
        assert_eq!(config.partition_strategy, PartitionStrategy::Tile);
        assert_eq!(config.tile_size, 64);
        assert_eq!(config.resampler, Resampler::Mean);
        assert_eq!(config.processes, 3);
        assert_eq!(config.pixel_size, Some(250.5));
        assert_eq!(config.partition_size, ReprojectConfig::default().partition_size);
    }

    #[test]
    fn test_from_vars_rejects_unknown_names() {
        let err = ReprojectConfig::from_vars(vars(&[("PRB_RESAMPLER", "bilinear")])).unwrap_err();
        assert!(err.to_string().contains("PRB_RESAMPLER"), "{err}");

        let err =
            ReprojectConfig::from_vars(vars(&[("PRB_PARTITION_STRATEGY", "bogus")])).unwrap_err();
        assert!(err.to_string().contains("bogus"), "{err}");

        assert!(ReprojectConfig::from_vars(vars(&[("PRB_PROCESSES", "many")])).is_err());
    }

    #[test]
    fn test_from_vars_without_variables_is_default() {
        let config = ReprojectConfig::from_vars(|_| None).unwrap();
        assert_eq!(config, ReprojectConfig::default());
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ReprojectConfig::default()).unwrap();
        assert!(json.contains("\"partition_strategy\":\"size\""));
        assert!(json.contains("\"resampler\":\"nearest\""));
        let back: ReprojectConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ReprojectConfig::default());
    }
}
