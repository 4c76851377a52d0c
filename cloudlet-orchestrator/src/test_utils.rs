//! Scripted in-memory [`ComputeBackend`] for tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::backend::{BackendResult, ComputeBackend};
use crate::context::RequestContext;
use crate::error::BackendError;
use crate::model::{BaseImage, ComputeNode, HandoffDescriptor, Instance};

/// Number of times each backend operation was invoked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get_instance: usize,
    pub list_compute_nodes: usize,
    pub create_instance: usize,
    pub create_base: usize,
    pub create_overlay: usize,
    pub initiate_handoff: usize,
    pub negotiate_port_forward: usize,
}

/// A handoff the backend was asked to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedHandoff {
    pub instance_id: String,
    pub url: String,
    pub token: Option<String>,
    pub vm_name: Option<String>,
}

#[derive(Default)]
struct State {
    instances: HashMap<String, Instance>,
    lookups: HashMap<String, usize>,
    // instance id -> (lookup number that first reports the node, node)
    pending_placements: HashMap<String, (usize, String)>,
    new_instance_placement: Option<(usize, String)>,
    nodes: Vec<ComputeNode>,
    forward_port: u16,
    residue: Option<String>,
    lookup_failure: Option<String>,
    operation_failure: Option<String>,
    api_host: String,
    next_id: usize,
    calls: CallCounts,
    base_names: Vec<String>,
    overlay_names: Vec<String>,
    handoffs: Vec<RecordedHandoff>,
    port_requests: Vec<(String, u16)>,
}

pub struct ScriptedBackend {
    state: Mutex<State>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                forward_port: 40022,
                api_host: "192.168.1.10".to_string(),
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("scripted backend state poisoned")
    }

    pub fn add_instance(&self, id: &str) {
        self.state().instances.insert(
            id.to_string(),
            Instance {
                id: id.to_string(),
                node: None,
                metadata: HashMap::new(),
            },
        );
    }

    pub fn add_placed_instance(&self, id: &str, node: &str) {
        self.add_instance(id);
        if let Some(instance) = self.state().instances.get_mut(id) {
            instance.node = Some(node.to_string());
        }
    }

    /// The `polls`-th lookup of `id` (1-based) and every later one report `node`.
    pub fn place_after(&self, id: &str, polls: usize, node: &str) {
        self.state()
            .pending_placements
            .insert(id.to_string(), (polls, node.to_string()));
    }

    /// Instances created through `create_instance` get placed on `node`
    /// after `polls` lookups.
    pub fn place_new_instances_after(&self, polls: usize, node: &str) {
        self.state().new_instance_placement = Some((polls, node.to_string()));
    }

    pub fn add_node(&self, hostname: &str, host_ip: Option<&str>) {
        self.state().nodes.push(ComputeNode {
            hostname: hostname.to_string(),
            host_ip: host_ip.map(str::to_string),
        });
    }

    pub fn set_forward_port(&self, port: u16) {
        self.state().forward_port = port;
    }

    pub fn set_residue(&self, residue: Option<&str>) {
        self.state().residue = residue.map(str::to_string);
    }

    /// Host used in the `links` of created servers.
    pub fn set_api_host(&self, host: &str) {
        self.state().api_host = host.to_string();
    }

    /// Make `get_instance` and `list_compute_nodes` fail.
    pub fn fail_lookups(&self, message: &str) {
        self.state().lookup_failure = Some(message.to_string());
    }

    /// Make every mutating call fail.
    pub fn fail_operations(&self, message: &str) {
        self.state().operation_failure = Some(message.to_string());
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls.clone()
    }

    pub fn base_names(&self) -> Vec<String> {
        self.state().base_names.clone()
    }

    pub fn overlay_names(&self) -> Vec<String> {
        self.state().overlay_names.clone()
    }

    pub fn handoffs(&self) -> Vec<RecordedHandoff> {
        self.state().handoffs.clone()
    }

    pub fn port_requests(&self) -> Vec<(String, u16)> {
        self.state().port_requests.clone()
    }
}

fn failure(message: &Option<String>) -> BackendResult<()> {
    match message {
        Some(msg) => Err(BackendError::Other(anyhow::anyhow!(msg.clone()))),
        None => Ok(()),
    }
}

fn lookup(state: &State, instance_id: &str) -> BackendResult<Instance> {
    state
        .instances
        .get(instance_id)
        .cloned()
        .ok_or_else(|| BackendError::InstanceNotFound(instance_id.to_string()))
}

#[async_trait]
impl ComputeBackend for ScriptedBackend {
    async fn get_instance(
        &self,
        _ctx: &RequestContext,
        instance_id: &str,
    ) -> BackendResult<Instance> {
        let mut state = self.state();
        state.calls.get_instance += 1;
        failure(&state.lookup_failure)?;

        let mut instance = lookup(&state, instance_id)?;
        let seen = {
            let count = state.lookups.entry(instance_id.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        if let Some((polls, node)) = state.pending_placements.get(instance_id) {
            if seen >= *polls {
                instance.node = Some(node.clone());
            }
        }
        Ok(instance)
    }

    async fn list_compute_nodes(&self, _ctx: &RequestContext) -> BackendResult<Vec<ComputeNode>> {
        let mut state = self.state();
        state.calls.list_compute_nodes += 1;
        failure(&state.lookup_failure)?;
        Ok(state.nodes.clone())
    }

    async fn create_instance(&self, _ctx: &RequestContext, body: &Value) -> BackendResult<Value> {
        let mut state = self.state();
        state.calls.create_instance += 1;
        failure(&state.operation_failure)?;

        state.next_id += 1;
        let id = format!("instance-{:04}", state.next_id);
        let metadata = body
            .pointer("/server/metadata")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(k, v)| {
                        let value = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                        (k.clone(), value)
                    })
                    .collect()
            })
            .unwrap_or_default();

        state.instances.insert(
            id.clone(),
            Instance {
                id: id.clone(),
                node: None,
                metadata,
            },
        );
        if let Some(placement) = state.new_instance_placement.clone() {
            state.pending_placements.insert(id.clone(), placement);
        }

        let href = format!("http://{}:8774/v2/servers/{}", state.api_host, id);
        Ok(json!({
            "server": {
                "id": id,
                "links": [{"rel": "self", "href": href}]
            }
        }))
    }

    async fn create_base(
        &self,
        _ctx: &RequestContext,
        instance: &Instance,
        name: &str,
    ) -> BackendResult<BaseImage> {
        let mut state = self.state();
        state.calls.create_base += 1;
        failure(&state.operation_failure)?;
        state.base_names.push(name.to_string());

        Ok(BaseImage {
            disk: json!({"name": format!("{name}-disk"), "instance": instance.id}),
            memory: json!({"name": format!("{name}-mem"), "instance": instance.id}),
        })
    }

    async fn create_overlay(
        &self,
        _ctx: &RequestContext,
        instance: &Instance,
        name: &str,
    ) -> BackendResult<String> {
        let mut state = self.state();
        state.calls.create_overlay += 1;
        failure(&state.operation_failure)?;
        state.overlay_names.push(name.to_string());
        Ok(format!("overlay-{}-{}", instance.id, name))
    }

    async fn initiate_handoff(
        &self,
        _ctx: &RequestContext,
        instance: &Instance,
        destination: &HandoffDescriptor,
    ) -> BackendResult<Option<String>> {
        let mut state = self.state();
        state.calls.initiate_handoff += 1;
        failure(&state.operation_failure)?;
        state.handoffs.push(RecordedHandoff {
            instance_id: instance.id.clone(),
            url: destination.url().to_string(),
            token: destination.token().map(str::to_string),
            vm_name: destination.vm_name().map(str::to_string),
        });
        Ok(state.residue.clone())
    }

    async fn negotiate_port_forward(&self, dest_ip: &str, dest_port: u16) -> BackendResult<u16> {
        let mut state = self.state();
        state.calls.negotiate_port_forward += 1;
        failure(&state.operation_failure)?;
        state.port_requests.push((dest_ip.to_string(), dest_port));
        Ok(state.forward_port)
    }
}
