use cloudlet_orchestrator::{
    action::{CaptureBaseRequest, FinishOverlayRequest},
    BaseImage, CloudletAction, HandoffRequest, HandoffStarted, OverlayCreated,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::health::readiness_check,
        crate::routes::instances::create_instance,
        crate::routes::instances::instance_action,
    ),
    components(
        schemas(
            CloudletAction,
            CaptureBaseRequest,
            FinishOverlayRequest,
            HandoffRequest,
            BaseImage,
            OverlayCreated,
            HandoffStarted
        )
    ),
    tags(
        (name = "cloudlet-api", description = "Cloudlet VM synthesis and handoff API")
    )
)]
pub struct ApiDoc;
