use crate::error::ProvisionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why the provisioning framework invoked us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// Custom-resource lifecycle event. Only `RequestType` is consumed; the
/// framework's other fields (`ResponseURL`, `StackId`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: RequestType,
}

impl LifecycleEvent {
    pub fn new(request_type: RequestType) -> Self {
        Self { request_type }
    }

    /// Decode a raw invocation payload. A null payload means `Create`,
    /// matching a manual test invocation with no event.
    pub fn from_payload(payload: Value) -> Result<Self, ProvisionError> {
        if payload.is_null() {
            return Ok(Self::new(RequestType::Create));
        }
        serde_json::from_value(payload).map_err(|e| ProvisionError::UnsupportedEvent(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Failure,
    NoAction,
}

/// Response returned to the framework and logged. Never carries secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusRecord {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusRecord {
    pub fn success(detail: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            detail: Some(detail.into()),
            error: None,
        }
    }

    pub fn failure(error: &ProvisionError, detail: impl Into<String>) -> Self {
        Self {
            status: Status::Failure,
            detail: Some(detail.into()),
            error: Some(error.to_string()),
        }
    }

    pub fn no_action(request_type: RequestType) -> Self {
        Self {
            status: Status::NoAction,
            detail: Some(format!(
                "No action required for {request_type:?} events; schema and roles are left untouched"
            )),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}
