// Error Translator

use crate::error::DispatchError;
use serde::Serialize;
use tracing::{error, warn};

/// Structured failure body; never wrapped in the response envelope
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub message: String,
    pub status: u16,
}

impl ErrorBody {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    /// `{"message":..,"status":..}` in field order
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            error!(error = %e, "Failed to serialise error body");
            format!(r#"{{"message":"Internal error","status":{}}}"#, self.status)
        })
    }
}

/// Map a pipeline failure to its status code and body
pub fn translate(err: &DispatchError) -> ErrorBody {
    let status = err.status_code();
    if status >= 500 {
        error!(status, error = %err, "Dispatch failed");
    } else {
        warn!(status, error = %err, "Dispatch rejected");
    }
    ErrorBody::new(status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognised_kinds() {
        assert_eq!(translate(&DispatchError::forbidden("no")).status, 403);
        assert_eq!(translate(&DispatchError::access_denied("no")).status, 403);
        assert_eq!(translate(&DispatchError::method_not_allowed("no")).status, 405);
        assert_eq!(translate(&DispatchError::internal("boom")).status, 500);
    }

    #[test]
    fn test_other_failures_are_500() {
        let body = translate(&DispatchError::Database("disk I/O error".to_string()));
        assert_eq!(body.status, 500);
        assert_eq!(body.message, "Database error: disk I/O error");
    }

    #[test]
    fn test_body_shape() {
        let body = translate(&DispatchError::method_not_allowed("ping does not support POST"));
        let parsed: serde_json::Value = serde_json::from_str(&body.to_json()).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!({"message": "ping does not support POST", "status": 405})
        );
    }

    #[test]
    fn test_to_json_is_exact_and_escaped() {
        assert_eq!(
            ErrorBody::new(403, "User not found").to_json(),
            r#"{"message":"User not found","status":403}"#
        );
        assert_eq!(
            ErrorBody::new(500, "bad \"quote\"").to_json(),
            r#"{"message":"bad \"quote\"","status":500}"#
        );
    }
}
