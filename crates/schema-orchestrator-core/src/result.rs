//! Uniform success/failure result returned by every public operation

use serde::{Deserialize, Serialize};

/// Marker that prefixes every [`OperationResult`] message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiResultStatus {
    Success,
    Failure,
}

impl ApiResultStatus {
    pub const fn value(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl std::fmt::Display for ApiResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.value())
    }
}

/// Outcome of an orchestrator operation as seen by the caller.
///
/// `message` is either the bare status marker or the marker followed by a
/// space and a human-readable detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl OperationResult {
    /// Bare success; the message is exactly the success marker.
    pub fn success() -> Self {
        Self {
            success: true,
            message: ApiResultStatus::Success.value().to_string(),
            data: None,
        }
    }

    pub fn success_with(detail: &str) -> Self {
        Self {
            success: true,
            message: format!("{} {}", ApiResultStatus::Success, detail),
            data: None,
        }
    }

    pub fn failure(detail: &str) -> Self {
        Self {
            success: false,
            message: format!("{} {}", ApiResultStatus::Failure, detail),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn status(&self) -> ApiResultStatus {
        if self.success {
            ApiResultStatus::Success
        } else {
            ApiResultStatus::Failure
        }
    }
}
