// Copyright 2026 xfercore contributors.

//! Runtime configuration: retry policy, per-backend parallelism
//! multipliers, job-part size, and `StatsMonitor` sampling parameters.
//! All overridable via environment variables, following the ambient
//! credential env-var convention described alongside this crate's
//! external interfaces.

use std::time::Duration;

/// Exponential backoff applied by each backend SDK's own client; the
/// core does not impose an additional timeout on top of it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

/// CPU-count multiplier used to size a backend's traversal thread pool.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParallelismMultipliers {
    pub local: usize,
    pub s3: usize,
    pub other: usize,
}

impl Default for ParallelismMultipliers {
    fn default() -> Self {
        ParallelismMultipliers {
            local: 4,
            s3: 8,
            other: 2,
        }
    }
}

/// Parameters for the background [`crate::stats_monitor::StatsMonitor`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatsMonitorConfig {
    pub sample_interval: Duration,
    pub window_size: usize,
    pub cooldown: Duration,
    pub reduce_only: bool,
}

impl Default for StatsMonitorConfig {
    fn default() -> Self {
        StatsMonitorConfig {
            sample_interval: Duration::from_secs(20),
            window_size: 50,
            cooldown: Duration::from_secs(120),
            reduce_only: false,
        }
    }
}

/// Top-level configuration, assembled once at process start and passed
/// explicitly into the enumerator and traversers rather than read from
/// globals.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub retry_policy: RetryPolicy,
    pub parallelism: ParallelismMultipliers,
    pub job_part_size: usize,
    pub stats_monitor: StatsMonitorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            retry_policy: RetryPolicy::default(),
            parallelism: ParallelismMultipliers::default(),
            job_part_size: 10_000,
            stats_monitor: StatsMonitorConfig::default(),
        }
    }
}

impl Config {
    /// Apply environment-variable overrides on top of the defaults.
    /// Unset or unparsable variables are silently ignored, falling back
    /// to the default.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Some(v) = env_usize("XFERCORE_JOB_PART_SIZE") {
            config.job_part_size = v;
        }
        if let Some(v) = env_u32("XFERCORE_MAX_RETRIES") {
            config.retry_policy.max_retries = v;
        }
        if let Some(v) = env_usize("XFERCORE_PARALLELISM_LOCAL") {
            config.parallelism.local = v;
        }
        if let Some(v) = env_usize("XFERCORE_PARALLELISM_S3") {
            config.parallelism.s3 = v;
        }
        if let Some(v) = env_usize("XFERCORE_PARALLELISM_OTHER") {
            config.parallelism.other = v;
        }
        if std::env::var("XFERCORE_REDUCE_ONLY").is_ok() {
            config.stats_monitor.reduce_only = true;
        }
        config
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.retry_policy.max_retries, 5);
        assert_eq!(config.parallelism.s3, 8);
        assert_eq!(config.job_part_size, 10_000);
    }
}
