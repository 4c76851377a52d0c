use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::backend::ComputeBackend;
use crate::context::RequestContext;
use crate::error::Result;
use crate::model::ComputeNode;

/// Port the handoff receiver listens on inside each compute node.
pub const HANDOFF_PORT: u16 = 8022;

pub const FORWARDING_UNAVAILABLE: &str = "cannot setup port forwarding";

/// A forwarding path negotiated for one create request. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortForwardMapping {
    pub dest_host: String,
    pub dest_port: u16,
    pub source_port: u16,
}

/// The `handoff` object attached to a create response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForwardingOutcome {
    Forwarded { server_ip: String, server_port: u16 },
    Unavailable { error: String },
}

impl ForwardingOutcome {
    pub fn unavailable() -> Self {
        ForwardingOutcome::Unavailable {
            error: FORWARDING_UNAVAILABLE.to_string(),
        }
    }
}

/// Address of the node whose hostname matches, ignoring ASCII case.
pub fn find_node_address(nodes: &[ComputeNode], hostname: &str) -> Option<String> {
    nodes
        .iter()
        .find(|node| node.hostname.eq_ignore_ascii_case(hostname))
        .and_then(|node| node.host_ip.clone())
        .filter(|ip| !ip.is_empty())
}

#[derive(Clone)]
pub struct PortForwardNegotiator {
    backend: Arc<dyn ComputeBackend>,
    dest_port: u16,
}

impl PortForwardNegotiator {
    pub fn new(backend: Arc<dyn ComputeBackend>) -> Self {
        Self {
            backend,
            dest_port: HANDOFF_PORT,
        }
    }

    pub fn with_dest_port(mut self, dest_port: u16) -> Self {
        self.dest_port = dest_port;
        self
    }

    /// Look the node up in inventory and allocate a mapping towards it.
    ///
    /// Returns `Ok(None)` without contacting the forwarder when the node is
    /// unknown or has no address.
    #[instrument(skip(self, ctx))]
    pub async fn negotiate(
        &self,
        ctx: &RequestContext,
        hostname: &str,
    ) -> Result<Option<PortForwardMapping>> {
        let nodes = self.backend.list_compute_nodes(ctx).await?;
        let Some(dest_host) = find_node_address(&nodes, hostname) else {
            return Ok(None);
        };

        let source_port = self
            .backend
            .negotiate_port_forward(&dest_host, self.dest_port)
            .await?;

        info!(
            "port forwarding {} -> {}:{} negotiated",
            source_port, dest_host, self.dest_port
        );

        Ok(Some(PortForwardMapping {
            dest_host,
            dest_port: self.dest_port,
            source_port,
        }))
    }

    /// Negotiate and fold every failure into [`ForwardingOutcome::Unavailable`].
    ///
    /// `advertised_ip` is the address clients should dial; the node address is
    /// used when none is known.
    pub async fn forward(
        &self,
        ctx: &RequestContext,
        hostname: &str,
        advertised_ip: Option<&str>,
    ) -> ForwardingOutcome {
        match self.negotiate(ctx, hostname).await {
            Ok(Some(mapping)) => ForwardingOutcome::Forwarded {
                server_ip: advertised_ip
                    .map(str::to_string)
                    .unwrap_or(mapping.dest_host),
                server_port: mapping.source_port,
            },
            Ok(None) => {
                warn!("no address known for compute node {}", hostname);
                ForwardingOutcome::unavailable()
            }
            Err(e) => {
                warn!("port forwarding towards {} failed: {}", hostname, e);
                ForwardingOutcome::unavailable()
            }
        }
    }
}
