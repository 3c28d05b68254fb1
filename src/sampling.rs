//! Sampling decision sources.

use rand::random;

/// A pluggable oracle deciding whether a transaction with no upstream
/// sampling intent should be sampled.
///
/// A source may be shared by any number of simultaneous transactions and
/// must therefore be safe for concurrent consultation. Each individual
/// [`TraceContext`] consults it at most once and caches the answer for the
/// remainder of the transaction's life.
///
/// [`TraceContext`]: crate::TraceContext
pub trait SamplingSource: Send + Sync {
    /// Decides whether the next undecided transaction should be sampled.
    fn decide(&self) -> bool;
}

/// Samples a fixed fraction of transactions.
#[derive(Debug, Copy, Clone)]
pub struct RateSampler {
    rate: f32,
}

impl RateSampler {
    /// Creates a sampler keeping `rate` of all transactions
    /// (`0.0` to `1.0`).
    pub fn new(rate: f32) -> Self {
        Self { rate }
    }
}

impl SamplingSource for RateSampler {
    fn decide(&self) -> bool {
        if self.rate >= 1.0 {
            true
        } else if self.rate <= 0.0 {
            false
        } else {
            random::<f32>() < self.rate
        }
    }
}

/// Always returns the same decision.
///
/// Useful in tests and for forcing sampling on or off globally.
#[derive(Debug, Copy, Clone)]
pub struct FixedSampler(pub bool);

impl SamplingSource for FixedSampler {
    fn decide(&self) -> bool {
        self.0
    }
}
