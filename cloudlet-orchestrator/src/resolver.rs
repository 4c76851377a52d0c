use std::sync::Arc;
use tracing::instrument;

use crate::backend::ComputeBackend;
use crate::context::RequestContext;
use crate::error::{BackendError, OrchestratorError, Result};
use crate::model::Instance;

/// Looks up live instance records. Every call hits the backend.
#[derive(Clone)]
pub struct InstanceResolver {
    backend: Arc<dyn ComputeBackend>,
}

impl InstanceResolver {
    pub fn new(backend: Arc<dyn ComputeBackend>) -> Self {
        Self { backend }
    }

    #[instrument(skip(self, ctx))]
    pub async fn resolve(&self, ctx: &RequestContext, instance_id: &str) -> Result<Instance> {
        self.backend
            .get_instance(ctx, instance_id)
            .await
            .map_err(|err| match err {
                BackendError::InstanceNotFound(id) => OrchestratorError::NotFound(id),
                other => OrchestratorError::Backend(other),
            })
    }
}
