//! Cloudlet orchestration logic
//!
//! Validates cloudlet action requests (base capture, overlay finish, handoff),
//! resolves the target instance and delegates the VM-level work to a
//! [`ComputeBackend`]. Also hosts the post-create augmentation that waits for
//! placement and negotiates a port forward for handoff-created instances.
//! It is consumed by the cloudlet-api HTTP service.

pub mod action;
pub mod augment;
pub mod backend;
pub mod cloudlet;
pub mod context;
pub mod error;
pub mod model;
pub mod placement;
pub mod port_forward;
pub mod resolver;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use action::{ActionOutcome, CloudletAction, HandoffRequest};
pub use augment::{CreationIntent, ResponseAugmenter};
pub use backend::{ComputeBackend, HttpBackendConfig, HttpComputeBackend};
pub use cloudlet::CloudletOrchestrator;
pub use context::RequestContext;
pub use error::{BackendError, OrchestratorError, Result};
pub use model::{BaseImage, ComputeNode, HandoffDescriptor, HandoffStarted, Instance, OverlayCreated};
pub use placement::{Placement, PlacementPolicy, PlacementWaiter};
pub use port_forward::{ForwardingOutcome, PortForwardNegotiator};
pub use resolver::InstanceResolver;
