//! Configuration management for the pgstack services.
//!
//! Provides environment detection, hierarchical configuration loading from
//! YAML files with environment-variable overrides, secret handling, and the
//! shared configuration types used by the provisioning API.

mod environment;
mod load;
mod secret;
pub mod shared;

pub use environment::*;
pub use load::*;
pub use secret::*;
