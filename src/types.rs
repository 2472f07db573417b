// Shared type definitions
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Uniform API envelope
// ============================================================================

/// Every API endpoint answers with this shape:
/// `{ success, data?, count?, message? }`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiEnvelope {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            message: None,
        }
    }

    pub fn ok_list(data: Value, count: usize) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: Some(count),
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            count: None,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Auth responses carry the token and the public user next to the envelope
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: Value,
}

// ============================================================================
// Health check response
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_omits_absent_fields() {
        let json = serde_json::to_value(ApiEnvelope::ok(serde_json::json!({"a": 1}))).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("count").is_none());
        assert!(json.get("message").is_none());

        let json = serde_json::to_value(ApiEnvelope::fail("nope")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "nope");
        assert!(json.get("data").is_none());
    }
}
