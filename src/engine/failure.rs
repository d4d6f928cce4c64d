use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_FAILURE_RATE: f64 = 0.2;

/// Decides whether an otherwise valid request should be rejected as a
/// simulated transient failure.
pub trait FailureInjector: Send + Sync {
    fn should_fail(&self) -> bool;
}

/// Fails with a fixed probability.
pub struct RandomFailure {
    rate: f64,
    rng: Mutex<StdRng>,
}

impl RandomFailure {
    pub fn new(rate: f64) -> Self {
        Self::with_rng(rate, StdRng::from_os_rng())
    }

    pub fn seeded(rate: f64, seed: u64) -> Self {
        Self::with_rng(rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(rate: f64, rng: StdRng) -> Self {
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        Self {
            rate,
            rng: Mutex::new(rng),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Default for RandomFailure {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_RATE)
    }
}

impl FailureInjector for RandomFailure {
    fn should_fail(&self) -> bool {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.random_bool(self.rate)
    }
}

pub struct NeverFail;

impl FailureInjector for NeverFail {
    fn should_fail(&self) -> bool {
        false
    }
}

pub struct AlwaysFail;

impl FailureInjector for AlwaysFail {
    fn should_fail(&self) -> bool {
        true
    }
}
