//! Random password generator.
//!
//! A password is `length` characters drawn independently and uniformly
//! (with replacement) from a character set. Characters that appear more
//! than once in the set are proportionally more likely.
//!
//! The default source, [`Generator::clock_seeded`], is a small
//! non-cryptographic PRNG seeded from the wall clock. It is predictable to
//! anyone who can guess the invocation time. [`Generator::from_os`] draws
//! its seed from the operating system instead and is selected with
//! `rng = "os"` in `spwd.toml`.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{SmallRng, StdRng};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::mode::Mode;
use crate::errors::{Result, SpwdError};

/// Which randomness source to build a [`Generator`] from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RngKind {
    /// `SmallRng` seeded from the current time in nanoseconds.
    #[default]
    ClockSeeded,
    /// `StdRng` seeded from the operating system.
    Os,
}

/// Draws passwords from a character set using any `rand` generator.
#[derive(Debug)]
pub struct Generator<R> {
    rng: R,
}

impl Generator<SmallRng> {
    /// Non-cryptographic generator seeded from the wall clock.
    pub fn clock_seeded() -> Self {
        // Low 64 bits of the nanosecond timestamp; a clock before the epoch seeds 0.
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }
}

impl Generator<StdRng> {
    /// Generator seeded from the operating system's entropy source.
    pub fn from_os() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl<R: Rng> Generator<R> {
    /// Wrap an existing generator (e.g. a fixed-seed one in tests).
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Build a password of exactly `length` characters from `charset`.
    ///
    /// A `length` of zero yields an empty string. An empty `charset`
    /// fails with [`SpwdError::EmptyCharset`].
    pub fn generate(&mut self, length: usize, charset: &str) -> Result<String> {
        let alphabet: Vec<char> = charset.chars().collect();
        if alphabet.is_empty() {
            return Err(SpwdError::EmptyCharset);
        }

        let password = (0..length)
            .map(|_| alphabet[self.rng.random_range(0..alphabet.len())])
            .collect();
        Ok(password)
    }

    /// Validate `length` against `mode`, then generate from its charset.
    pub fn generate_for(&mut self, mode: Mode, length: usize) -> Result<String> {
        mode.validate_length(length)?;
        self.generate(length, mode.charset())
    }
}
