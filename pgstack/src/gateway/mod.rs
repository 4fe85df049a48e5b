//! Cluster integration for the provisioning core.
//!
//! This module contains the abstraction and implementations used to read and
//! write the platform resources a plan describes (secrets, config maps,
//! volumes, claims, stateful workloads, and services). Consumers should
//! depend on the trait [`ClusterGateway`] and avoid relying on a specific
//! transport.
//!
//! The default gateway, [`kube::KubeGateway`], is backed by the [`::kube`]
//! crate and talks to the cluster using the ambient configuration
//! (in-cluster or local `~/.kube/config`). [`memory::InMemoryGateway`] backs
//! the test suites with the same contract and supports failure injection.
//!
//! See [`base`] for the error split that drives retries and for the live
//! status types.

mod base;
pub mod kube;
pub mod memory;

pub use base::*;
