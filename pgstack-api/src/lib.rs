//! HTTP surface for the pgstack provisioning core.
//!
//! Exposes provisioning, teardown, status projection, database health
//! queries, and Prometheus metrics over a small actix-web application, with
//! OpenAPI documentation for every route.

pub mod config;
pub mod db;
pub mod metrics;
pub mod routes;
pub mod span_builder;
pub mod startup;
