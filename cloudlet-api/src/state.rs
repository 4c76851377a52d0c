use cloudlet_orchestrator::{
    CloudletOrchestrator, ComputeBackend, InstanceResolver, PlacementPolicy, PlacementWaiter,
    PortForwardNegotiator, ResponseAugmenter,
};
use std::sync::Arc;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: CloudletOrchestrator,
    pub augmenter: ResponseAugmenter,
}

impl AppState {
    pub fn new(backend: Arc<dyn ComputeBackend>, config: &Config) -> Self {
        Self::with_settings(backend, config.placement_policy(), config.handoff_port)
    }

    pub fn with_settings(
        backend: Arc<dyn ComputeBackend>,
        policy: PlacementPolicy,
        handoff_port: u16,
    ) -> Self {
        let waiter = PlacementWaiter::new(InstanceResolver::new(backend.clone()), policy);
        let negotiator = PortForwardNegotiator::new(backend.clone()).with_dest_port(handoff_port);

        Self {
            orchestrator: CloudletOrchestrator::new(backend),
            augmenter: ResponseAugmenter::new(waiter, negotiator),
        }
    }

    pub fn backend(&self) -> &Arc<dyn ComputeBackend> {
        self.orchestrator.backend()
    }
}
