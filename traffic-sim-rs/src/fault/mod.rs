//! Fault injection for the vector search capability
//!
//! `FaultInjectingSearch` decorates any `VectorSearch` and, per call, draws one
//! roll in `[0, 1)` that either fails the call with a simulated timeout, delays
//! it, or lets it through untouched.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, SimError};
use crate::search::{ScoredDocument, SearchOptions, VectorSearch};

/// Message carried by every injected timeout
pub const SIMULATED_TIMEOUT_MESSAGE: &str = "simulated vector-store timeout: unreachable";

/// Outcome of one fault roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultDecision {
    /// Fail without calling the wrapped store
    Error,
    /// Sleep for the slow delay, then call the wrapped store
    Slow,
    /// Call the wrapped store directly
    Normal,
}

/// Probabilities and delay of the injected faults
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultPolicy {
    pub error_rate: f64,
    pub slow_rate: f64,
    pub slow_delay: Duration,
}

impl FaultPolicy {
    /// A policy that never injects anything
    pub fn disabled() -> Self {
        Self {
            error_rate: 0.0,
            slow_rate: 0.0,
            slow_delay: Duration::ZERO,
        }
    }

    /// Map a roll in `[0, 1)` onto a decision
    pub fn decide(&self, roll: f64) -> FaultDecision {
        if roll < self.error_rate {
            FaultDecision::Error
        } else if roll < self.error_rate + self.slow_rate {
            FaultDecision::Slow
        } else {
            FaultDecision::Normal
        }
    }
}

/// Source of uniform rolls in `[0, 1)`
pub trait RollSource: Send + Sync {
    fn roll(&self) -> f64;
}

impl<F> RollSource for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn roll(&self) -> f64 {
        self()
    }
}

/// Rolls drawn from a seedable `StdRng`
#[derive(Debug)]
pub struct RandomRoll {
    rng: Mutex<StdRng>,
}

impl RandomRoll {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl RollSource for RandomRoll {
    fn roll(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen::<f64>(),
            Err(poisoned) => poisoned.into_inner().gen::<f64>(),
        }
    }
}

#[derive(Debug, Default)]
struct FaultStats {
    injected_errors: AtomicU64,
    injected_slow: AtomicU64,
    passthrough: AtomicU64,
}

/// Point-in-time copy of the fault counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultStatsSnapshot {
    pub injected_errors: u64,
    pub injected_slow: u64,
    pub passthrough: u64,
}

impl FaultStatsSnapshot {
    pub fn total(&self) -> u64 {
        self.injected_errors + self.injected_slow + self.passthrough
    }
}

impl fmt::Display for FaultStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} searches: {} injected timeouts, {} slow, {} clean",
            self.total(),
            self.injected_errors,
            self.injected_slow,
            self.passthrough
        )
    }
}

/// `VectorSearch` decorator that injects timeouts and latency
pub struct FaultInjectingSearch {
    inner: Arc<dyn VectorSearch>,
    policy: FaultPolicy,
    roller: Box<dyn RollSource>,
    stats: FaultStats,
}

impl FaultInjectingSearch {
    pub fn new(inner: Arc<dyn VectorSearch>, policy: FaultPolicy, roller: Box<dyn RollSource>) -> Self {
        log::info!(
            "Installing fault injection: error_rate={}, slow_rate={}, slow_delay={:?}",
            policy.error_rate,
            policy.slow_rate,
            policy.slow_delay
        );

        Self {
            inner,
            policy,
            roller,
            stats: FaultStats::default(),
        }
    }

    /// Decorator driven by a seedable random source
    pub fn with_random_rolls(inner: Arc<dyn VectorSearch>, policy: FaultPolicy, seed: Option<u64>) -> Self {
        Self::new(inner, policy, Box::new(RandomRoll::new(seed)))
    }

    pub fn stats(&self) -> FaultStatsSnapshot {
        FaultStatsSnapshot {
            injected_errors: self.stats.injected_errors.load(Ordering::Relaxed),
            injected_slow: self.stats.injected_slow.load(Ordering::Relaxed),
            passthrough: self.stats.passthrough.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for FaultInjectingSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultInjectingSearch")
            .field("policy", &self.policy)
            .field("stats", &self.stats())
            .finish()
    }
}

#[async_trait]
impl VectorSearch for FaultInjectingSearch {
    async fn similarity_search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ScoredDocument>> {
        let roll = self.roller.roll();

        match self.policy.decide(roll) {
            FaultDecision::Error => {
                self.stats.injected_errors.fetch_add(1, Ordering::Relaxed);
                log::warn!("Injecting vector-store timeout (roll={:.3})", roll);
                return Err(SimError::timeout(SIMULATED_TIMEOUT_MESSAGE));
            }
            FaultDecision::Slow => {
                self.stats.injected_slow.fetch_add(1, Ordering::Relaxed);
                log::info!(
                    "Injecting slow vector search: +{:?} (roll={:.3})",
                    self.policy.slow_delay,
                    roll
                );
                tokio::time::sleep(self.policy.slow_delay).await;
            }
            FaultDecision::Normal => {
                self.stats.passthrough.fetch_add(1, Ordering::Relaxed);
                log::debug!("Vector search passes through (roll={:.3})", roll);
            }
        }

        self.inner.similarity_search(query, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> FaultPolicy {
        FaultPolicy {
            error_rate: 0.2,
            slow_rate: 0.2,
            slow_delay: Duration::from_secs(3),
        }
    }

    #[test]
    fn test_decide_bands() {
        let policy = policy();
        assert_eq!(policy.decide(0.0), FaultDecision::Error);
        assert_eq!(policy.decide(0.199), FaultDecision::Error);
        assert_eq!(policy.decide(0.2), FaultDecision::Slow);
        assert_eq!(policy.decide(0.399), FaultDecision::Slow);
        assert_eq!(policy.decide(0.4), FaultDecision::Normal);
        assert_eq!(policy.decide(0.999), FaultDecision::Normal);
    }

    #[test]
    fn test_disabled_policy_never_faults() {
        let policy = FaultPolicy::disabled();
        assert_eq!(policy.decide(0.0), FaultDecision::Normal);
        assert_eq!(policy.decide(0.5), FaultDecision::Normal);
    }

    #[test]
    fn test_full_error_rate_always_fails() {
        let policy = FaultPolicy {
            error_rate: 1.0,
            ..policy()
        };
        assert_eq!(policy.decide(0.0), FaultDecision::Error);
        assert_eq!(policy.decide(0.999_999), FaultDecision::Error);
    }

    #[test]
    fn test_random_roll_range_and_seeding() {
        let a = RandomRoll::new(Some(42));
        let b = RandomRoll::new(Some(42));
        for _ in 0..100 {
            let roll = a.roll();
            assert!((0.0..1.0).contains(&roll));
            assert_eq!(roll, b.roll());
        }
    }

    #[test]
    fn test_stats_display() {
        let snapshot = FaultStatsSnapshot {
            injected_errors: 2,
            injected_slow: 1,
            passthrough: 7,
        };
        assert_eq!(snapshot.total(), 10);
        assert_eq!(
            snapshot.to_string(),
            "10 searches: 2 injected timeouts, 1 slow, 7 clean"
        );
    }
}
