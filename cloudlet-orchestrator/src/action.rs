//! Payloads of the `POST /instances/{id}/action` endpoint.
//!
//! Each action is a single-key JSON object, e.g.
//! `{"cloudlet-base": {"name": "golden-v1"}}`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::{BaseImage, HandoffStarted, OverlayCreated};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub enum CloudletAction {
    #[serde(rename = "cloudlet-base")]
    CaptureBase(Option<CaptureBaseRequest>),

    #[serde(rename = "cloudlet-overlay-finish")]
    FinishOverlay(Option<FinishOverlayRequest>),

    #[serde(rename = "cloudlet-handoff")]
    Handoff(HandoffRequest),
}

impl CloudletAction {
    pub fn name(&self) -> &'static str {
        match self {
            CloudletAction::CaptureBase(_) => "cloudlet-base",
            CloudletAction::FinishOverlay(_) => "cloudlet-overlay-finish",
            CloudletAction::Handoff(_) => "cloudlet-handoff",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CaptureBaseRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FinishOverlayRequest {
    #[serde(rename = "overlay-name", default)]
    pub overlay_name: Option<String>,
}

/// Unvalidated handoff destination as sent by the client.
#[derive(Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct HandoffRequest {
    #[serde(default)]
    pub handoff_url: Option<String>,

    #[serde(default)]
    pub dest_token: Option<String>,

    #[serde(default)]
    pub dest_vmname: Option<String>,
}

impl std::fmt::Debug for HandoffRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffRequest")
            .field("handoff_url", &self.handoff_url)
            .field("dest_token", &self.dest_token.as_ref().map(|_| "<redacted>"))
            .field("dest_vmname", &self.dest_vmname)
            .finish()
    }
}

/// What a completed action produced.
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    BaseCaptured(BaseImage),
    OverlayFinished(OverlayCreated),
    HandoffStarted(HandoffStarted),
}
