use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use utoipa::ToSchema;

/// Metadata key marking a create request as synthesis-based.
pub const OVERLAY_URL_KEY: &str = "overlay_url";
/// Metadata key marking a create request as handoff-based.
pub const HANDOFF_INFO_KEY: &str = "handoff_info";

/// Read-only view of a compute instance as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instance {
    pub id: String,

    /// Hypervisor hostname the scheduler placed this instance on.
    #[serde(default)]
    pub node: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Instance {
    pub fn is_placed(&self) -> bool {
        self.node.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComputeNode {
    #[serde(rename = "hypervisor_hostname")]
    pub hostname: String,

    #[serde(default)]
    pub host_ip: Option<String>,
}

/// Disk and memory image metadata of a captured base VM.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BaseImage {
    #[serde(rename = "base-disk")]
    #[schema(value_type = Object)]
    pub disk: serde_json::Value,

    #[serde(rename = "base-memory")]
    #[schema(value_type = Object)]
    pub memory: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct OverlayCreated {
    #[serde(rename = "overlay-id")]
    pub overlay_id: String,
}

/// Result of a handoff: the residue id, or the destination URL when the
/// backend left nothing behind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct HandoffStarted {
    pub handoff: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HandoffScheme {
    File,
    Http,
    Https,
}

impl HandoffScheme {
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "file" => Some(HandoffScheme::File),
            "http" => Some(HandoffScheme::Http),
            "https" => Some(HandoffScheme::Https),
            _ => None,
        }
    }

    /// Remote schemes must authenticate against the destination.
    pub fn requires_token(self) -> bool {
        matches!(self, HandoffScheme::Http | HandoffScheme::Https)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HandoffScheme::File => "file",
            HandoffScheme::Http => "http",
            HandoffScheme::Https => "https",
        }
    }
}

impl fmt::Display for HandoffScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated handoff destination. Only [`crate::validation::validate_handoff`]
/// constructs one, so holding a descriptor means the URL was checked.
#[derive(Clone, PartialEq)]
pub struct HandoffDescriptor {
    url: String,
    scheme: HandoffScheme,
    netloc: String,
    token: Option<String>,
    vm_name: Option<String>,
}

impl HandoffDescriptor {
    pub(crate) fn new(
        url: String,
        scheme: HandoffScheme,
        netloc: String,
        token: Option<String>,
        vm_name: Option<String>,
    ) -> Self {
        Self {
            url,
            scheme,
            netloc,
            token,
            vm_name,
        }
    }

    /// The destination URL exactly as the caller supplied it.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> HandoffScheme {
        self.scheme
    }

    pub fn netloc(&self) -> &str {
        &self.netloc
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn vm_name(&self) -> Option<&str> {
        self.vm_name.as_deref()
    }
}

impl fmt::Debug for HandoffDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandoffDescriptor")
            .field("url", &self.url)
            .field("scheme", &self.scheme)
            .field("netloc", &self.netloc)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("vm_name", &self.vm_name)
            .finish()
    }
}
