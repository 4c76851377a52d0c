use std::sync::Arc;
use tracing::{info, instrument};

use crate::action::{ActionOutcome, CloudletAction, HandoffRequest};
use crate::backend::ComputeBackend;
use crate::context::RequestContext;
use crate::error::Result;
use crate::model::{BaseImage, HandoffStarted, OverlayCreated};
use crate::resolver::InstanceResolver;
use crate::validation::{require_name, validate_handoff};

/// Entry point for the three cloudlet actions on an existing instance.
///
/// Input is validated and the instance resolved before the backend is asked
/// to do anything, so rejected requests have no side effects. Backend faults
/// are returned unchanged.
#[derive(Clone)]
pub struct CloudletOrchestrator {
    backend: Arc<dyn ComputeBackend>,
    resolver: InstanceResolver,
}

impl CloudletOrchestrator {
    pub fn new(backend: Arc<dyn ComputeBackend>) -> Self {
        let resolver = InstanceResolver::new(backend.clone());
        Self { backend, resolver }
    }

    pub fn backend(&self) -> &Arc<dyn ComputeBackend> {
        &self.backend
    }

    pub fn resolver(&self) -> &InstanceResolver {
        &self.resolver
    }

    /// Dispatch a decoded action body.
    pub async fn perform(
        &self,
        ctx: &RequestContext,
        instance_id: &str,
        action: CloudletAction,
    ) -> Result<ActionOutcome> {
        match action {
            CloudletAction::CaptureBase(req) => {
                let name = req.and_then(|r| r.name).unwrap_or_default();
                self.capture_base(ctx, instance_id, &name)
                    .await
                    .map(ActionOutcome::BaseCaptured)
            }
            CloudletAction::FinishOverlay(req) => {
                let name = req.and_then(|r| r.overlay_name).unwrap_or_default();
                self.finish_overlay(ctx, instance_id, &name)
                    .await
                    .map(ActionOutcome::OverlayFinished)
            }
            CloudletAction::Handoff(req) => self
                .initiate_handoff(ctx, instance_id, &req)
                .await
                .map(ActionOutcome::HandoffStarted),
        }
    }

    /// Capture the instance's disk and memory as a base image.
    #[instrument(skip(self, ctx))]
    pub async fn capture_base(
        &self,
        ctx: &RequestContext,
        instance_id: &str,
        name: &str,
    ) -> Result<BaseImage> {
        let name = require_name(Some(name), "Name required for base VM.")?;

        info!("Importing base VM {}...", instance_id);
        let instance = self.resolver.resolve(ctx, instance_id).await?;
        let image = self.backend.create_base(ctx, &instance, name).await?;
        Ok(image)
    }

    /// Finalize the overlay accumulated on top of the instance's base.
    #[instrument(skip(self, ctx))]
    pub async fn finish_overlay(
        &self,
        ctx: &RequestContext,
        instance_id: &str,
        overlay_name: &str,
    ) -> Result<OverlayCreated> {
        let overlay_name = require_name(Some(overlay_name), "Overlay name required.")?;

        info!("Generating overlay VM {}...", instance_id);
        let instance = self.resolver.resolve(ctx, instance_id).await?;
        let overlay_id = self
            .backend
            .create_overlay(ctx, &instance, overlay_name)
            .await?;
        Ok(OverlayCreated { overlay_id })
    }

    /// Start a live handoff of the instance to a validated destination.
    #[instrument(skip(self, ctx, request))]
    pub async fn initiate_handoff(
        &self,
        ctx: &RequestContext,
        instance_id: &str,
        request: &HandoffRequest,
    ) -> Result<HandoffStarted> {
        let descriptor = validate_handoff(request)?;

        info!(
            "Handoff initiated for {} (destination URL:{})...",
            instance_id,
            descriptor.url()
        );
        let instance = self.resolver.resolve(ctx, instance_id).await?;
        let residue = self
            .backend
            .initiate_handoff(ctx, &instance, &descriptor)
            .await?;

        Ok(HandoffStarted {
            handoff: residue.unwrap_or_else(|| descriptor.url().to_string()),
        })
    }
}
