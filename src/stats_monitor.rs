// Copyright 2026 xfercore contributors.

//! Background worker that samples resource counters and adjusts a
//! dynamic "active-files limit" with feedback control, so a job under
//! memory/fd pressure backs off rather than falling over.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::StatsMonitorConfig;

/// The feedback-controller's classification of the current sample
/// relative to the configured target.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PressureState {
    /// > 120% of target.
    Critical,
    /// 100-120% of target.
    AboveOptimal,
    /// 60-100% of target.
    Optimal,
    /// < 60% of target, but above zero.
    BelowOptimal,
    /// Near zero: plenty of headroom.
    Underutilized,
}

impl PressureState {
    fn classify(ratio: f64) -> Self {
        if ratio > 1.20 {
            PressureState::Critical
        } else if ratio > 1.0 {
            PressureState::AboveOptimal
        } else if ratio >= 0.60 {
            PressureState::Optimal
        } else if ratio >= 0.20 {
            PressureState::BelowOptimal
        } else {
            PressureState::Underutilized
        }
    }

    fn adjustment_factor(self) -> f64 {
        match self {
            PressureState::Critical => 0.80,
            PressureState::AboveOptimal => 0.90,
            PressureState::Optimal => 1.0,
            PressureState::BelowOptimal => 1.10,
            PressureState::Underutilized => 1.30,
        }
    }
}

/// Something the monitor can sample: files currently tracked by the
/// in-flight indexer, active directory listings, process memory.
pub trait Sampler: Send + Sync {
    fn sample(&self) -> usize;
    fn target(&self) -> usize;
}

/// Tracks a rolling window of samples and the current adjusted limit.
pub struct StatsMonitor {
    config: StatsMonitorConfig,
    sampler: Arc<dyn Sampler>,
    window: std::sync::Mutex<VecDeque<usize>>,
    active_files_limit: AtomicUsize,
    last_adjustment: std::sync::Mutex<Option<Instant>>,
    last_state: AtomicI64,
}

impl StatsMonitor {
    pub fn new(config: StatsMonitorConfig, sampler: Arc<dyn Sampler>, initial_limit: usize) -> Arc<Self> {
        Arc::new(StatsMonitor {
            config,
            sampler,
            window: std::sync::Mutex::new(VecDeque::with_capacity(config.window_size)),
            active_files_limit: AtomicUsize::new(initial_limit),
            last_adjustment: std::sync::Mutex::new(None),
            last_state: AtomicI64::new(-1),
        })
    }

    pub fn active_files_limit(&self) -> usize {
        self.active_files_limit.load(Ordering::Relaxed)
    }

    pub fn last_state(&self) -> Option<PressureState> {
        match self.last_state.load(Ordering::Relaxed) {
            0 => Some(PressureState::Critical),
            1 => Some(PressureState::AboveOptimal),
            2 => Some(PressureState::Optimal),
            3 => Some(PressureState::BelowOptimal),
            4 => Some(PressureState::Underutilized),
            _ => None,
        }
    }

    fn store_state(&self, state: PressureState) {
        let code = match state {
            PressureState::Critical => 0,
            PressureState::AboveOptimal => 1,
            PressureState::Optimal => 2,
            PressureState::BelowOptimal => 3,
            PressureState::Underutilized => 4,
        };
        self.last_state.store(code, Ordering::Relaxed);
    }

    /// Take one sample and, if the cooldown has elapsed, adjust the
    /// active-files limit. Returns the state the sample fell into.
    pub fn tick(&self, now: Instant) -> PressureState {
        let sample = self.sampler.sample();
        let target = self.sampler.target().max(1);

        {
            let mut window = self.window.lock().unwrap();
            if window.len() == self.config.window_size {
                window.pop_front();
            }
            window.push_back(sample);
        }

        let ratio = sample as f64 / target as f64;
        let state = PressureState::classify(ratio);
        self.store_state(state);
        debug!(sample, target, ratio, ?state, "stats monitor sample");

        let mut last = self.last_adjustment.lock().unwrap();
        let cooldown_elapsed = last.map(|t| now.duration_since(t) >= self.config.cooldown).unwrap_or(true);
        if !cooldown_elapsed {
            return state;
        }

        let factor = state.adjustment_factor();
        if factor > 1.0 && self.config.reduce_only {
            return state;
        }
        if factor != 1.0 {
            let current = self.active_files_limit.load(Ordering::Relaxed);
            let proposed = ((current as f64) * factor).round().max(1.0) as usize;
            self.active_files_limit.store(proposed, Ordering::Relaxed);
            *last = Some(now);
            info!(from = current, to = proposed, ?state, "adjusted active-files limit");
        }
        state
    }

    pub fn sample_interval(&self) -> Duration {
        self.config.sample_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSampler {
        sample: AtomicUsize,
        target: usize,
    }

    impl Sampler for FixedSampler {
        fn sample(&self) -> usize {
            self.sample.load(Ordering::Relaxed)
        }
        fn target(&self) -> usize {
            self.target
        }
    }

    fn config() -> StatsMonitorConfig {
        StatsMonitorConfig {
            sample_interval: Duration::from_secs(20),
            window_size: 4,
            cooldown: Duration::from_secs(0),
            reduce_only: false,
        }
    }

    #[test]
    fn critical_pressure_reduces_limit() {
        let sampler = Arc::new(FixedSampler {
            sample: AtomicUsize::new(130),
            target: 100,
        });
        let monitor = StatsMonitor::new(config(), sampler, 1000);
        let state = monitor.tick(Instant::now());
        assert_eq!(state, PressureState::Critical);
        assert_eq!(monitor.active_files_limit(), 800);
    }

    #[test]
    fn underutilized_increases_limit() {
        let sampler = Arc::new(FixedSampler {
            sample: AtomicUsize::new(5),
            target: 100,
        });
        let monitor = StatsMonitor::new(config(), sampler, 1000);
        monitor.tick(Instant::now());
        assert_eq!(monitor.active_files_limit(), 1300);
    }

    #[test]
    fn optimal_holds_limit() {
        let sampler = Arc::new(FixedSampler {
            sample: AtomicUsize::new(80),
            target: 100,
        });
        let monitor = StatsMonitor::new(config(), sampler, 1000);
        monitor.tick(Instant::now());
        assert_eq!(monitor.active_files_limit(), 1000);
    }

    #[test]
    fn reduce_only_skips_increases() {
        let mut cfg = config();
        cfg.reduce_only = true;
        let sampler = Arc::new(FixedSampler {
            sample: AtomicUsize::new(5),
            target: 100,
        });
        let monitor = StatsMonitor::new(cfg, sampler, 1000);
        monitor.tick(Instant::now());
        assert_eq!(monitor.active_files_limit(), 1000);
    }

    #[test]
    fn cooldown_blocks_a_second_adjustment() {
        let cfg = StatsMonitorConfig {
            cooldown: Duration::from_secs(120),
            ..config()
        };
        let sampler = Arc::new(FixedSampler {
            sample: AtomicUsize::new(130),
            target: 100,
        });
        let monitor = StatsMonitor::new(cfg, sampler, 1000);
        let t0 = Instant::now();
        monitor.tick(t0);
        assert_eq!(monitor.active_files_limit(), 800);
        monitor.tick(t0 + Duration::from_secs(1));
        assert_eq!(monitor.active_files_limit(), 800);
    }
}
