//! Success envelope shared by every endpoint: `{ success, message?, data? }`.
//! Error responses carry the matching failure shape (see `error.rs`).

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn ok_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<serde_json::Value> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_omits_absent_fields() {
        let value = serde_json::to_value(ApiResponse::ok(serde_json::json!({"a": 1}))).unwrap();
        assert_eq!(value["success"], true);
        assert!(value.get("message").is_none());
        assert_eq!(value["data"]["a"], 1);
    }

    #[test]
    fn message_only_envelope() {
        let value = serde_json::to_value(ApiResponse::message("done")).unwrap();
        assert_eq!(value["message"], "done");
        assert!(value.get("data").is_none());
    }
}
