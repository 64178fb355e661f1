//! Configuration module for the admin console
//!
//! Provides the CLI arguments and the runtime settings derived from them.

mod settings;

pub use settings::*;
