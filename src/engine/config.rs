//! Search configuration types and YAML loading

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::engine::constants::*;

/// Parameters that steer spinning and spread estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfParams {
    /// Minimal yarn size ratio per unit of spread for an edge to be spun.
    pub yarn_ratio: f64,
    /// Nodes sampled from the left yarn when estimating a spread.
    pub try_limit_from: usize,
    /// Nodes sampled from the right yarn for test relations.
    pub try_limit_to: usize,
    /// Above `|F| * spread` the bulk filter of a relation is not used.
    pub spin_limit: usize,
    pub seed: u64,
}

impl Default for PerfParams {
    fn default() -> Self {
        Self {
            yarn_ratio: DEFAULT_YARN_RATIO,
            try_limit_from: DEFAULT_TRY_LIMIT_FROM,
            try_limit_to: DEFAULT_TRY_LIMIT_TO,
            spin_limit: DEFAULT_SPIN_LIMIT,
            seed: DEFAULT_SEED,
        }
    }
}

/// Order in which atoms are stitched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Start with the smallest yarn, prefer low spreads.
    #[default]
    SmallChoiceFirst,
    /// Start with the largest yarn, prefer high spreads.
    BigChoiceFirst,
    /// Grow the largest subgraph over edges of spread at most 1 first.
    Spread1First,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::SmallChoiceFirst, Strategy::Spread1First, Strategy::BigChoiceFirst];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::SmallChoiceFirst => "small_choice_first",
            Strategy::BigChoiceFirst => "big_choice_first",
            Strategy::Spread1First => "spread_1_first",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<String> = Strategy::ALL.iter().map(|s| format!("    {}", s)).collect();
                format!("Strategy not defined: \"{}\"\nAllowed strategies:\n{}", s, allowed.join("\n"))
            })
    }
}

/// Everything a search run can be tuned with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub perf: PerfParams,
    pub strategy: Strategy,
    /// Log a progress line every this many results while counting.
    pub progress: usize,
    /// Maximum number of results counted or fetched by the CLI.
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            perf: PerfParams::default(),
            strategy: Strategy::default(),
            progress: DEFAULT_PROGRESS,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a YAML file. Missing keys take defaults.
    pub fn from_yaml<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref();

        if !path.exists() {
            return Err(anyhow!("Config file not found: {}", path.display()));
        }

        let yaml_str = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;

        let config = Self::from_yaml_str(&yaml_str)
            .map_err(|e| anyhow!("Invalid YAML config in {}: {}", path.display(), e))?;

        log::info!(
            "Search config loaded: strategy {}, yarn ratio {}, seed {}",
            config.strategy,
            config.perf.yarn_ratio,
            config.perf.seed
        );
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: SearchConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::new();
        assert_eq!(config.perf.yarn_ratio, 1.25);
        assert_eq!(config.perf.try_limit_from, 10);
        assert_eq!(config.perf.spin_limit, 1_000_000);
        assert_eq!(config.strategy, Strategy::SmallChoiceFirst);
        assert_eq!(config.progress, 100);
        assert_eq!(config.limit, 1000);
    }

    #[test]
    fn test_partial_yaml_takes_defaults() {
        let config = SearchConfig::from_yaml_str("strategy: spread_1_first\nperf:\n  seed: 7\n").unwrap();
        assert_eq!(config.strategy, Strategy::Spread1First);
        assert_eq!(config.perf.seed, 7);
        assert_eq!(config.perf.yarn_ratio, 1.25);
        assert_eq!(config.limit, 1000);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "limit: 5\nperf:\n  try_limit_to: 3").unwrap();
        let config = SearchConfig::from_yaml(file.path()).unwrap();
        assert_eq!(config.limit, 5);
        assert_eq!(config.perf.try_limit_to, 3);

        assert!(SearchConfig::from_yaml("no/such/config.yaml").is_err());
        assert!(SearchConfig::from_yaml_str("strategy: fastest").is_err());
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/search.yaml");
        let config = SearchConfig::from_yaml(path).unwrap();
        assert_eq!(config, SearchConfig::default());
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!("big_choice_first".parse::<Strategy>(), Ok(Strategy::BigChoiceFirst));
        match "fastest".parse::<Strategy>() {
            Err(message) => assert!(message.starts_with("Strategy not defined: \"fastest\"")),
            Ok(s) => panic!("Unexpected strategy {}", s),
        }
    }
}
