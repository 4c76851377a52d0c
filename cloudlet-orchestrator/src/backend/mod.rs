//! The compute backend seam.
//!
//! The orchestrator never talks to a hypervisor directly. Every VM-level
//! effect goes through a [`ComputeBackend`], injected at construction time so
//! tests can substitute a scripted implementation.

mod http;

pub use http::{HttpBackendConfig, HttpComputeBackend};

use async_trait::async_trait;
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::BackendError;
use crate::model::{BaseImage, ComputeNode, HandoffDescriptor, Instance};

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[async_trait]
pub trait ComputeBackend: Send + Sync {
    /// Fetch the live instance record. Unknown ids yield
    /// [`BackendError::InstanceNotFound`].
    async fn get_instance(&self, ctx: &RequestContext, instance_id: &str)
        -> BackendResult<Instance>;

    /// Enumerate the hypervisor inventory.
    async fn list_compute_nodes(&self, ctx: &RequestContext) -> BackendResult<Vec<ComputeNode>>;

    /// Ordinary instance creation. The body and the returned representation
    /// are opaque to this layer apart from `server.metadata` and `server.id`.
    async fn create_instance(&self, ctx: &RequestContext, body: &Value) -> BackendResult<Value>;

    async fn create_base(
        &self,
        ctx: &RequestContext,
        instance: &Instance,
        name: &str,
    ) -> BackendResult<BaseImage>;

    async fn create_overlay(
        &self,
        ctx: &RequestContext,
        instance: &Instance,
        name: &str,
    ) -> BackendResult<String>;

    /// Start transferring `instance` to the destination. Returns the residue
    /// id, or `None` when nothing is left behind locally.
    async fn initiate_handoff(
        &self,
        ctx: &RequestContext,
        instance: &Instance,
        destination: &HandoffDescriptor,
    ) -> BackendResult<Option<String>>;

    /// Allocate a forwarding port towards `dest_ip:dest_port` and return the
    /// source-side port.
    async fn negotiate_port_forward(&self, dest_ip: &str, dest_port: u16) -> BackendResult<u16>;
}
