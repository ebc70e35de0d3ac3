//! API response wrapper for the HTTP portal.

use serde::{Deserialize, Serialize};

// Re-export shared reply types from messages module
pub use crate::messages::{ReplyBody, StatusResponse, StoreResponse, SwitchResponse};

/// API response wrapper for consistent JSON structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present when success=true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present when success=false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_omits_error() {
        let resp = ApiResponse::ok(SwitchResponse {
            relay: true,
            changed: true,
        });
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(
            json,
            r#"{"success":true,"data":{"relay":true,"changed":true}}"#
        );
    }

    #[test]
    fn err_omits_data() {
        let resp = ApiResponse::<()>::err("not found");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"not found"}"#);
    }
}
