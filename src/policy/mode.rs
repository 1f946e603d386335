//! Strength modes.
//!
//! Each mode maps to a fixed character set and a closed length interval.
//! Stronger modes use a superset of the weaker mode's characters and
//! longer passwords:
//!
//! | mode          | alias | length  | adds                        |
//! |---------------|-------|---------|-----------------------------|
//! | `very-weak`   | `vw`  | 4..=6   | digits                      |
//! | `weak`        | `w`   | 6..=8   | lowercase                   |
//! | `medium`      | `m`   | 8..=12  | uppercase                   |
//! | `strong`      | `s`   | 12..=16 | common punctuation          |
//! | `very-strong` | `vs`  | 16..=20 | brackets and separators     |
//! | `unbreakable` | `xb`  | 20..=30 | tilde, backtick, pipe       |

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::errors::{Result, SpwdError};

const VERY_WEAK_CHARSET: &str = "0123456789";
const WEAK_CHARSET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";
const MEDIUM_CHARSET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const STRONG_CHARSET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()_-+=<>?";
const VERY_STRONG_CHARSET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()_-+=<>?{}[]:;,.<>";
const UNBREAKABLE_CHARSET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()_-+=<>?{}[]:;,.<>~`|";

/// A password strength tier.
///
/// Variants are declared weakest first, so `Ord` follows strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mode {
    VeryWeak,
    Weak,
    Medium,
    Strong,
    VeryStrong,
    Unbreakable,
}

impl Mode {
    /// Every mode, weakest first.
    pub const ALL: [Mode; 6] = [
        Mode::VeryWeak,
        Mode::Weak,
        Mode::Medium,
        Mode::Strong,
        Mode::VeryStrong,
        Mode::Unbreakable,
    ];

    /// Parse a mode token.
    ///
    /// Accepts the canonical names (`very-weak` .. `unbreakable`) and the
    /// short aliases (`vw`, `w`, `m`, `s`, `vs`, `xb`). Matching is exact
    /// and case-sensitive.
    pub fn parse(text: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| text == mode.name() || text == mode.alias())
            .ok_or_else(|| SpwdError::InvalidMode(text.to_string()))
    }

    /// Canonical token, e.g. `"very-strong"`.
    pub fn name(self) -> &'static str {
        match self {
            Mode::VeryWeak => "very-weak",
            Mode::Weak => "weak",
            Mode::Medium => "medium",
            Mode::Strong => "strong",
            Mode::VeryStrong => "very-strong",
            Mode::Unbreakable => "unbreakable",
        }
    }

    /// Short alias, e.g. `"vs"`.
    pub fn alias(self) -> &'static str {
        match self {
            Mode::VeryWeak => "vw",
            Mode::Weak => "w",
            Mode::Medium => "m",
            Mode::Strong => "s",
            Mode::VeryStrong => "vs",
            Mode::Unbreakable => "xb",
        }
    }

    /// The characters a password of this mode is drawn from.
    pub fn charset(self) -> &'static str {
        match self {
            Mode::VeryWeak => VERY_WEAK_CHARSET,
            Mode::Weak => WEAK_CHARSET,
            Mode::Medium => MEDIUM_CHARSET,
            Mode::Strong => STRONG_CHARSET,
            Mode::VeryStrong => VERY_STRONG_CHARSET,
            Mode::Unbreakable => UNBREAKABLE_CHARSET,
        }
    }

    /// The allowed password lengths (inclusive on both ends).
    pub fn length_range(self) -> RangeInclusive<usize> {
        match self {
            Mode::VeryWeak => 4..=6,
            Mode::Weak => 6..=8,
            Mode::Medium => 8..=12,
            Mode::Strong => 12..=16,
            Mode::VeryStrong => 16..=20,
            Mode::Unbreakable => 20..=30,
        }
    }

    /// Check that `length` lies inside this mode's interval.
    pub fn validate_length(self, length: usize) -> Result<()> {
        let range = self.length_range();
        if range.contains(&length) {
            Ok(())
        } else {
            Err(SpwdError::InvalidLength {
                mode: self.name(),
                length,
                min: *range.start(),
                max: *range.end(),
            })
        }
    }
}

impl FromStr for Mode {
    type Err = SpwdError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
