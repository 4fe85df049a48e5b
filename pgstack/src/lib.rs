//! Declarative provisioning core for Postgres application stacks on
//! Kubernetes.
//!
//! A [`request::ProvisioningRequest`] is expanded into an ordered
//! [`plan::Plan`] of resource descriptors which the
//! [`reconcile::Reconciler`] converges against the live cluster through a
//! [`gateway::ClusterGateway`]. The [`provisioner::Provisioner`] ties the
//! pieces together and serializes runs per application.

pub mod credentials;
pub mod descriptor;
pub mod gateway;
pub mod locks;
pub mod outcome;
pub mod plan;
pub mod provisioner;
pub mod quantity;
pub mod reconcile;
pub mod request;
pub mod shutdown;
pub mod status;
