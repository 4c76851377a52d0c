//! Decoration of the ordinary instance-creation response.
//!
//! Runs after the backend has created the instance. It only ever adds keys
//! to the representation; creation itself has already succeeded.

use serde_json::{json, Value};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::context::RequestContext;
use crate::model::{HANDOFF_INFO_KEY, OVERLAY_URL_KEY};
use crate::placement::{Placement, PlacementWaiter};
use crate::port_forward::{ForwardingOutcome, PortForwardNegotiator};

/// What the caller asked for when creating the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationIntent {
    Plain,
    SynthesisRequested,
    /// Takes precedence over synthesis when both markers are present.
    HandoffRequested,
}

impl CreationIntent {
    pub fn from_metadata(metadata: &HashMap<String, String>) -> Self {
        Self::from_keys(|key| metadata.contains_key(key))
    }

    /// Derive the intent from a create body of the form
    /// `{"server": {"metadata": {...}}}`.
    pub fn from_create_body(body: &Value) -> Self {
        match body.pointer("/server/metadata").and_then(Value::as_object) {
            Some(metadata) => Self::from_keys(|key| metadata.contains_key(key)),
            None => CreationIntent::Plain,
        }
    }

    fn from_keys(has: impl Fn(&str) -> bool) -> Self {
        if has(HANDOFF_INFO_KEY) {
            CreationIntent::HandoffRequested
        } else if has(OVERLAY_URL_KEY) {
            CreationIntent::SynthesisRequested
        } else {
            CreationIntent::Plain
        }
    }
}

#[derive(Clone)]
pub struct ResponseAugmenter {
    waiter: PlacementWaiter,
    negotiator: PortForwardNegotiator,
}

impl ResponseAugmenter {
    pub fn new(waiter: PlacementWaiter, negotiator: PortForwardNegotiator) -> Self {
        Self { waiter, negotiator }
    }

    /// Attach `synthesis` or `handoff` information to `representation`
    /// according to the intent expressed in `request`. Never fails.
    #[instrument(skip_all)]
    pub async fn augment(
        &self,
        ctx: &RequestContext,
        request: &Value,
        representation: &mut Value,
        cancel: &CancellationToken,
    ) {
        match CreationIntent::from_create_body(request) {
            CreationIntent::Plain => {}
            CreationIntent::SynthesisRequested => {
                debug!("return synthesis information");
                if let Some(obj) = representation.as_object_mut() {
                    obj.insert("synthesis".to_string(), json!({ "return": "success" }));
                }
            }
            CreationIntent::HandoffRequested => {
                debug!("return handoff information");
                let Some(server) = representation.get("server") else {
                    return;
                };
                let instance_id = server.get("id").and_then(Value::as_str).map(str::to_string);
                let advertised_ip = advertised_host(server);

                let outcome = match instance_id {
                    Some(id) => {
                        self.forwarding_for(ctx, &id, advertised_ip.as_deref(), cancel)
                            .await
                    }
                    None => {
                        warn!("created server has no id, cannot wait for placement");
                        ForwardingOutcome::unavailable()
                    }
                };

                if let Some(obj) = representation.as_object_mut() {
                    obj.insert("handoff".to_string(), json!(outcome));
                }
            }
        }
    }

    async fn forwarding_for(
        &self,
        ctx: &RequestContext,
        instance_id: &str,
        advertised_ip: Option<&str>,
        cancel: &CancellationToken,
    ) -> ForwardingOutcome {
        match self.waiter.wait(ctx, instance_id, cancel).await {
            Ok(Placement::Assigned { node, .. }) => {
                self.negotiator.forward(ctx, &node, advertised_ip).await
            }
            Ok(Placement::Unresolved { attempts }) => {
                warn!(
                    "instance {} still unscheduled after {} polls",
                    instance_id, attempts
                );
                ForwardingOutcome::unavailable()
            }
            Err(e) => {
                warn!("placement wait for {} aborted: {}", instance_id, e);
                ForwardingOutcome::unavailable()
            }
        }
    }
}

/// Host part of the server's first link, i.e. the public API endpoint.
fn advertised_host(server: &Value) -> Option<String> {
    let href = server.pointer("/links/0/href")?.as_str()?;
    let url = Url::parse(href).ok()?;
    url.host_str().map(|host| host.trim_matches(|c| c == '[' || c == ']').to_string())
}
