//! Password strength policy and generation.
//!
//! This module provides:
//! - Strength modes with their character sets and length bounds (`mode`)
//! - The random password generator (`generator`)

pub mod generator;
pub mod mode;

pub use generator::{Generator, RngKind};
pub use mode::Mode;
