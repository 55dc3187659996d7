//! The single injection point for compile-time uniqueness.
//!
//! Generated test subjects (user names, device labels) carry a short suffix
//! so repeated imports of the same collection do not collide on the target
//! tenant. Everything else the compiler emits is a pure function of its
//! input; keeping the suffix behind this trait is what lets tests pin the
//! output byte-for-byte.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Supplies the uniqueness suffix woven into generated test-subject names.
pub trait UniquenessSource: Send + Sync {
    fn suffix(&self) -> String;
}

/// Default source: a short random alphanumeric tag, sampled once per
/// compiler run.
pub struct RandomUniqueness {
    tag: String,
}

impl RandomUniqueness {
    pub fn new() -> Self {
        let tag: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();
        Self {
            tag: tag.to_lowercase(),
        }
    }
}

impl Default for RandomUniqueness {
    fn default() -> Self {
        Self::new()
    }
}

impl UniquenessSource for RandomUniqueness {
    fn suffix(&self) -> String {
        self.tag.clone()
    }
}

/// Fixed source for deterministic output (tests, reproducible CLI runs).
pub struct FixedUniqueness {
    tag: String,
}

impl FixedUniqueness {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl UniquenessSource for FixedUniqueness {
    fn suffix(&self) -> String {
        self.tag.clone()
    }
}
