//! JSON-RPC 2.0 envelopes for the HTTP transport.

use crate::error::{codes, MetadataError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// An inbound request or notification (a notification has no `id`).
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// The id to echo back, `null` when absent.
    pub fn response_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn invalid_session(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_SESSION, message)
    }

    pub fn internal() -> Self {
        Self::new(codes::INTERNAL_ERROR, "Internal error")
    }
}

impl From<&MetadataError> for JsonRpcError {
    fn from(err: &MetadataError) -> Self {
        Self::new(err.error_code(), err.to_string()).with_data(err.error_data())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_has_no_id() {
        let req: JsonRpcRequest = serde_json::from_str(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        )
        .unwrap();
        assert!(req.is_notification());
        assert_eq!(req.response_id(), Value::Null);
        assert!(req.params.is_null());
    }

    #[test]
    fn test_error_response_omits_result() {
        let resp = JsonRpcResponse::err(
            serde_json::json!(7),
            JsonRpcError::new(codes::METHOD_NOT_FOUND, "Method not found: foo"),
        );
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], -32601);
        assert!(value["error"].get("data").is_none());
    }

    #[test]
    fn test_metadata_error_conversion() {
        let err = MetadataError::UnsupportedProtocol {
            protocol: "foo".to_string(),
            supported: vec!["uniswap".to_string()],
        };
        let rpc = JsonRpcError::from(&err);
        assert_eq!(rpc.code, codes::UNSUPPORTED_PROTOCOL);
        assert_eq!(rpc.data.unwrap()["hint"], "Supported protocols: uniswap");
    }
}
