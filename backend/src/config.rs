use std::path::PathBuf;
use std::str::FromStr;

use crate::scanner::ExecutionStrategy;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Runtime settings, read from the environment with a default for each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub static_dir: PathBuf,
    pub strategy: ExecutionStrategy,
    pub simulate_latency: bool,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            static_dir: PathBuf::from("dist"),
            strategy: ExecutionStrategy::Sequential,
            simulate_latency: true,
            seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't have to
    /// touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            strategy: parse_var(&lookup, "SCAN_STRATEGY")?.unwrap_or(defaults.strategy),
            simulate_latency: parse_var(&lookup, "SCAN_SIMULATE_LATENCY")?
                .unwrap_or(defaults.simulate_latency),
            seed: parse_var(&lookup, "SCAN_SEED")?,
        })
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| ConfigError {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
