//! Telemetry bootstrap for the pgstack services.
//!
//! Environment-aware tracing initialization: pretty console output in
//! development, rolling JSON files in production, with panics routed through
//! the tracing system.

pub mod tracing;
