//! FLARE Configuration Module
//!
//! Calibration constants (FRI weights, stage thresholds, waste fractions,
//! recommendation triggers) loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. Explicit path (CLI `--config`)
//! 2. `FLARE_CONFIG` environment variable
//! 3. `flare_config.toml` in the current working directory
//! 4. Built-in defaults from [`defaults`]
//!
//! The config is request-scoped: build one, hand it to `FlareEngine::new`.
//!
//! ```ignore
//! let config = FlareConfig::load(None)?;
//! let engine = FlareEngine::new(config);
//! ```

mod flare_config;
pub mod defaults;
pub mod validation;

pub use flare_config::*;
