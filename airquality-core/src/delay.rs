//! Artificial latency injected before each source call.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Range used by demo builds to make latency dashboards interesting.
pub const DEMO_MIN: Duration = Duration::from_millis(100);
pub const DEMO_MAX: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayPolicy {
    #[default]
    Disabled,
    /// Uniform in `[min, max)`.
    Uniform { min: Duration, max: Duration },
}

impl DelayPolicy {
    pub fn demo() -> Self {
        DelayPolicy::Uniform {
            min: DEMO_MIN,
            max: DEMO_MAX,
        }
    }

    pub fn sample(&self) -> Duration {
        match *self {
            DelayPolicy::Disabled => Duration::ZERO,
            DelayPolicy::Uniform { min, max } if max <= min => min,
            DelayPolicy::Uniform { min, max } => rand::thread_rng().gen_range(min..max),
        }
    }

    /// Sleeps without blocking the worker thread.
    pub async fn wait(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tracing::debug!(delay_ms = delay.as_millis() as u64, "simulating latency");
            tokio::time::sleep(delay).await;
        }
    }
}

/// `[latency]` table of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl From<LatencyConfig> for DelayPolicy {
    fn from(cfg: LatencyConfig) -> Self {
        DelayPolicy::Uniform {
            min: Duration::from_millis(cfg.min_ms),
            max: Duration::from_millis(cfg.max_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_is_zero() {
        assert_eq!(DelayPolicy::Disabled.sample(), Duration::ZERO);
    }

    #[test]
    fn uniform_stays_in_range() {
        let policy = DelayPolicy::demo();
        for _ in 0..200 {
            let d = policy.sample();
            assert!(d >= DEMO_MIN && d < DEMO_MAX, "{d:?}");
        }
    }

    #[test]
    fn degenerate_range_returns_min() {
        let policy = DelayPolicy::Uniform {
            min: Duration::from_millis(7),
            max: Duration::from_millis(7),
        };
        assert_eq!(policy.sample(), Duration::from_millis(7));
    }

    #[test]
    fn config_converts_to_uniform() {
        let policy: DelayPolicy = LatencyConfig { min_ms: 10, max_ms: 20 }.into();
        assert_eq!(
            policy,
            DelayPolicy::Uniform {
                min: Duration::from_millis(10),
                max: Duration::from_millis(20),
            }
        );
    }

    #[tokio::test]
    async fn wait_returns_for_short_delay() {
        let policy = DelayPolicy::Uniform {
            min: Duration::from_millis(1),
            max: Duration::from_millis(3),
        };
        policy.wait().await;
    }
}
