//! Validation of caller-supplied action input.
//!
//! Everything here is a pure function of its arguments: no backend calls and
//! no logging, so a rejected request never causes a side effect.

use url::Url;

use crate::action::HandoffRequest;
use crate::error::{OrchestratorError, Result};
use crate::model::{HandoffDescriptor, HandoffScheme};

/// Authority assumed for `file:` URLs written without a host (`file:///path`).
const LOCAL_NETLOC: &str = "localhost";

/// Validate a handoff destination and build its descriptor.
///
/// Accepts iff the URL is present, its scheme is `file`, `http` or `https`,
/// its network location is non-empty, and a token accompanies any
/// `http`/`https` destination.
pub fn validate_handoff(request: &HandoffRequest) -> Result<HandoffDescriptor> {
    let raw = request
        .handoff_url
        .as_deref()
        .ok_or_else(|| OrchestratorError::invalid("Handoff URL Required"))?;

    let parsed = Url::parse(raw).map_err(|e| match e {
        url::ParseError::EmptyHost => unreachable_destination(raw),
        _ => OrchestratorError::invalid(format!(
            "Invalid handoff URL ({raw}). Only file and http(s) schemes are supported."
        )),
    })?;

    let scheme = HandoffScheme::from_scheme(parsed.scheme()).ok_or_else(|| {
        OrchestratorError::invalid(format!(
            "Invalid handoff URL ({raw}). Only file and http(s) schemes are supported."
        ))
    })?;

    let netloc = network_location(&parsed, scheme);
    if netloc.is_empty() || (scheme != HandoffScheme::File && raw_authority(raw).is_none()) {
        return Err(unreachable_destination(raw));
    }

    if scheme.requires_token() && request.dest_token.is_none() {
        return Err(OrchestratorError::invalid(
            "An auth token required to handoff to the destination.",
        ));
    }

    Ok(HandoffDescriptor::new(
        raw.to_string(),
        scheme,
        netloc,
        request.dest_token.clone(),
        request.dest_vmname.clone(),
    ))
}

/// Require a non-empty name field, reporting `message` otherwise.
pub fn require_name<'a>(name: Option<&'a str>, message: &str) -> Result<&'a str> {
    match name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(OrchestratorError::invalid(message)),
    }
}

/// Authority exactly as written between `scheme://` and the path. The parser
/// supplies a host for special schemes even when the input has none
/// (`http:10.0.0.5`, `https:/host`, `http:///host`), so the raw text decides.
fn raw_authority(raw: &str) -> Option<&str> {
    let (_, rest) = raw.split_once(':')?;
    let rest = rest.strip_prefix("//")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some(&rest[..end]).filter(|authority| !authority.is_empty())
}

fn network_location(url: &Url, scheme: HandoffScheme) -> String {
    let host = url.host_str().unwrap_or_default();
    if host.is_empty() {
        return match scheme {
            HandoffScheme::File => LOCAL_NETLOC.to_string(),
            HandoffScheme::Http | HandoffScheme::Https => String::new(),
        };
    }

    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

fn unreachable_destination(raw: &str) -> OrchestratorError {
    OrchestratorError::invalid(format!(
        "Invalid handoff URL ({raw}). Destination unreachable."
    ))
}
