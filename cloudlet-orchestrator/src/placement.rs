//! Bounded wait for the scheduler to place a freshly created instance.
//!
//! Placement is decided out of band, so the only signal available here is
//! the instance record itself. The wait re-fetches it at a fixed interval and
//! gives up after a fixed number of attempts. Every sleep is a cooperative
//! suspension raced against the request's cancellation token.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::context::RequestContext;
use crate::error::{OrchestratorError, Result};
use crate::resolver::InstanceResolver;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Terminal state of a placement wait. `Unresolved` is an ordinary outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Assigned { node: String, attempts: u32 },
    Unresolved { attempts: u32 },
}

#[derive(Clone)]
pub struct PlacementWaiter {
    resolver: InstanceResolver,
    policy: PlacementPolicy,
}

impl PlacementWaiter {
    pub fn new(resolver: InstanceResolver, policy: PlacementPolicy) -> Self {
        Self { resolver, policy }
    }

    pub fn policy(&self) -> PlacementPolicy {
        self.policy
    }

    /// Poll until the instance reports a node or the attempt budget runs out.
    ///
    /// Backend faults during a poll abort the wait and are returned as-is;
    /// cancellation yields [`OrchestratorError::Cancelled`].
    #[instrument(skip(self, ctx, cancel))]
    pub async fn wait(
        &self,
        ctx: &RequestContext,
        instance_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Placement> {
        let max = self.policy.max_attempts;

        for attempt in 1..=max {
            let instance = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(OrchestratorError::Cancelled),
                found = self.resolver.resolve(ctx, instance_id) => found?,
            };

            if let Some(node) = instance.node {
                debug!("instance {} scheduled to {} after {} polls", instance_id, node, attempt);
                return Ok(Placement::Assigned {
                    node,
                    attempts: attempt,
                });
            }

            debug!("waiting for VM scheduling {}/{}...", attempt, max);

            if attempt < max {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(OrchestratorError::Cancelled),
                    _ = tokio::time::sleep(self.policy.interval) => {}
                }
            }
        }

        Ok(Placement::Unresolved { attempts: max })
    }
}
