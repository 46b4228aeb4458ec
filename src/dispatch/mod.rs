use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::capabilities::{CapabilityRegistry, ParamSpec};

/// Failure classes reported through the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownCapability,
    InvalidParameters,
    ExecutionError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub capability_name: String,
    pub timestamp: DateTime<Utc>,
    pub request_id: Uuid,
}

/// Uniform result wrapper returned by every dispatch. Exactly one of
/// `result` and `error` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
    pub metadata: Metadata,
}

impl Envelope {
    fn metadata_for(capability_name: &str) -> Metadata {
        Metadata {
            capability_name: capability_name.to_string(),
            timestamp: Utc::now(),
            request_id: Uuid::new_v4(),
        }
    }

    pub fn ok(capability_name: &str, result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            metadata: Self::metadata_for(capability_name),
        }
    }

    pub fn err(capability_name: &str, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(EnvelopeError {
                kind,
                message: message.into(),
            }),
            metadata: Self::metadata_for(capability_name),
        }
    }
}

/// Resolves a capability by name, validates parameters against its declared
/// schema, executes it, and wraps the outcome. Performs no I/O of its own;
/// safe to share across concurrent callers.
pub struct Dispatcher {
    registry: Arc<CapabilityRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, capability_name: &str, parameters: Map<String, Value>) -> Envelope {
        let capability = match self.registry.get(capability_name) {
            Ok(capability) => capability,
            Err(e) => {
                log::warn!("dispatch of unknown capability '{}'", capability_name);
                return Envelope::err(capability_name, ErrorKind::UnknownCapability, e.to_string());
            }
        };

        let validated = match validate_parameters(&capability.parameters(), parameters) {
            Ok(validated) => validated,
            Err(message) => {
                log::warn!("invalid parameters for '{}': {}", capability_name, message);
                return Envelope::err(capability_name, ErrorKind::InvalidParameters, message);
            }
        };

        log::debug!("executing capability '{}'", capability_name);
        match capability.execute(validated).await {
            Ok(result) => Envelope::ok(capability_name, result),
            Err(e) => {
                log::warn!("capability '{}' failed: {:#}", capability_name, e);
                Envelope::err(capability_name, ErrorKind::ExecutionError, format!("{:#}", e))
            }
        }
    }
}

/// Strict schema check: unknown fields are rejected, required fields must be
/// present and type-compatible, declared defaults fill absent optionals.
fn validate_parameters(
    specs: &[ParamSpec],
    parameters: Map<String, Value>,
) -> Result<Map<String, Value>, String> {
    for name in parameters.keys() {
        if !specs.iter().any(|s| s.name == *name) {
            return Err(format!("unknown parameter '{}'", name));
        }
    }

    let mut validated = parameters;
    for spec in specs {
        match validated.get(&spec.name) {
            Some(value) => {
                if !spec.param_type.matches(value) {
                    return Err(format!(
                        "parameter '{}' expects {}",
                        spec.name,
                        spec.param_type.as_str()
                    ));
                }
            }
            None => {
                if spec.required {
                    return Err(format!("missing required parameter '{}'", spec.name));
                }
                if let Some(default) = &spec.default {
                    validated.insert(spec.name.clone(), default.clone());
                }
            }
        }
    }

    Ok(validated)
}
