use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{BackendResult, ComputeBackend};
use crate::context::RequestContext;
use crate::error::BackendError;
use crate::model::{BaseImage, ComputeNode, HandoffDescriptor, Instance, OverlayCreated};

/// Connection settings for the VM synthesis service.
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl HttpBackendConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// [`ComputeBackend`] speaking JSON over HTTP to the synthesis service.
#[derive(Clone)]
pub struct HttpComputeBackend {
    client: Client,
    base_url: Url,
}

#[derive(Serialize)]
struct NameBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct HandoffBody<'a> {
    url: &'a str,
    token: Option<&'a str>,
    vm_name: Option<&'a str>,
}

#[derive(Deserialize)]
struct HandoffReply {
    #[serde(default)]
    residue_id: Option<String>,
}

#[derive(Serialize)]
struct PortForwardBody<'a> {
    dest_ip: &'a str,
    dest_port: u16,
}

#[derive(Deserialize)]
struct PortForwardReply {
    source_port: u16,
}

impl HttpComputeBackend {
    pub fn new(config: HttpBackendConfig) -> BackendResult<Self> {
        if config.base_url.cannot_be_a_base() {
            return Err(BackendError::Other(anyhow::anyhow!(
                "backend URL cannot be used as a base: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("cloudlet-orchestrator/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base() was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(builder: RequestBuilder, ctx: &RequestContext) -> RequestBuilder {
        let mut builder = builder.header("x-user", &ctx.user);
        if let Some(project) = &ctx.project_id {
            builder = builder.header("x-project-id", project);
        }
        if let Some(token) = &ctx.auth_token {
            builder = builder.header("x-auth-token", token);
        }
        builder
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|e| format!("failed to read error body: {e}"));
        Err(BackendError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ComputeBackend for HttpComputeBackend {
    async fn get_instance(
        &self,
        ctx: &RequestContext,
        instance_id: &str,
    ) -> BackendResult<Instance> {
        let url = self.endpoint(&["instances", instance_id]);
        debug!("GET {}", url);

        let response = Self::authorize(self.client.get(url), ctx).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BackendError::InstanceNotFound(instance_id.to_string()));
        }
        Self::read_json(response).await
    }

    async fn list_compute_nodes(&self, ctx: &RequestContext) -> BackendResult<Vec<ComputeNode>> {
        let url = self.endpoint(&["compute-nodes"]);
        let response = Self::authorize(self.client.get(url), ctx).send().await?;
        Self::read_json(response).await
    }

    async fn create_instance(&self, ctx: &RequestContext, body: &Value) -> BackendResult<Value> {
        let url = self.endpoint(&["instances"]);
        let response = Self::authorize(self.client.post(url), ctx)
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn create_base(
        &self,
        ctx: &RequestContext,
        instance: &Instance,
        name: &str,
    ) -> BackendResult<BaseImage> {
        let url = self.endpoint(&["instances", &instance.id, "base"]);
        let response = Self::authorize(self.client.post(url), ctx)
            .json(&NameBody { name })
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn create_overlay(
        &self,
        ctx: &RequestContext,
        instance: &Instance,
        name: &str,
    ) -> BackendResult<String> {
        let url = self.endpoint(&["instances", &instance.id, "overlay"]);
        let response = Self::authorize(self.client.post(url), ctx)
            .json(&NameBody { name })
            .send()
            .await?;
        let created: OverlayCreated = Self::read_json(response).await?;
        Ok(created.overlay_id)
    }

    async fn initiate_handoff(
        &self,
        ctx: &RequestContext,
        instance: &Instance,
        destination: &HandoffDescriptor,
    ) -> BackendResult<Option<String>> {
        let url = self.endpoint(&["instances", &instance.id, "handoff"]);
        let body = HandoffBody {
            url: destination.url(),
            token: destination.token(),
            vm_name: destination.vm_name(),
        };
        let response = Self::authorize(self.client.post(url), ctx)
            .json(&body)
            .send()
            .await?;
        let reply: HandoffReply = Self::read_json(response).await?;
        Ok(reply.residue_id.filter(|id| !id.is_empty()))
    }

    async fn negotiate_port_forward(&self, dest_ip: &str, dest_port: u16) -> BackendResult<u16> {
        let url = self.endpoint(&["port-forwards"]);
        let response = self
            .client
            .post(url)
            .json(&PortForwardBody { dest_ip, dest_port })
            .send()
            .await?;
        let reply: PortForwardReply = Self::read_json(response).await?;
        Ok(reply.source_port)
    }
}
