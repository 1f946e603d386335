//! Configuration loaded from `spwd.toml`.

pub mod settings;

pub use settings::Settings;
