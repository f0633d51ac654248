//! FrameSched configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scheduler::SchedulerConfig;

/// Main FrameSched configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scheduler pool and pacing settings
    pub scheduler: SchedulerConfig,

    /// Synthetic workload settings for the soak command
    pub workload: WorkloadConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate()
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .framesched.yml
        let local_config = PathBuf::from(".framesched.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/framesched/framesched.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("framesched").join("framesched.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Synthetic workload settings for the soak command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Number of one-shot tasks to submit
    pub tasks: u32,

    /// Number of chains to submit
    pub chains: u32,

    /// Maximum random submission delay in milliseconds
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// How long to let the pool run in seconds
    #[serde(rename = "run-secs")]
    pub run_secs: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            tasks: 200,
            chains: 50,
            max_delay_ms: 250,
            run_secs: 3,
        }
    }
}

impl WorkloadConfig {
    /// Maximum submission delay as a Duration
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Run window as a Duration
    pub fn run_duration(&self) -> Duration {
        Duration::from_secs(self.run_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.scheduler.workers, 4);
        assert_eq!(config.scheduler.max_running, 4);
        assert_eq!(config.workload.tasks, 200);
        assert_eq!(config.workload.chains, 50);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
scheduler:
  workers: 8
  max-running: 2
  frame-hz: 30
  retry-delay-ms: 10

workload:
  tasks: 1000
  chains: 100
  max-delay-ms: 500
  run-secs: 10
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.scheduler.workers, 8);
        assert_eq!(config.scheduler.max_running, 2);
        assert_eq!(config.scheduler.frame_hz, 30);
        assert_eq!(config.scheduler.retry_delay_ms, 10);
        assert_eq!(config.workload.tasks, 1000);
        assert_eq!(config.workload.run_secs, 10);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
scheduler:
  workers: 2
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.scheduler.workers, 2);

        // Defaults for unspecified
        assert_eq!(config.scheduler.max_running, 4);
        assert_eq!(config.workload.tasks, 200);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("framesched.yml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "scheduler:").unwrap();
        writeln!(file, "  workers: 3").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.scheduler.workers, 3);
        assert_eq!(config.scheduler.max_running, 4);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let path = PathBuf::from("/nonexistent/framesched.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_validate_surfaces_scheduler_errors() {
        let config = Config {
            scheduler: SchedulerConfig {
                max_running: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
