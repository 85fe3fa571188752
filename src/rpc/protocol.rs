//! JSON-RPC 2.0 wire types for the database-proxy protocol.
//!
//! Requests go out as HTTP POST bodies; responses come back as either
//! `{"result": ...}` or `{"error": {"message": ..., "data": {"stacktrace": ...}}}`.
//! The proxy handles a single request per session at a time, so every
//! request carries the same id and responses are never correlated by it.

use serde::{Deserialize, Serialize};

/// Fixed request id sent with every call.
pub const REQUEST_ID: u32 = 1;

/// The methods understood by the database proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Open a server-side cursor for a SQL statement.
    Execute,
    /// List tables visible to the proxy.
    Tables,
    /// List views visible to the proxy.
    Views,
    /// List columns of one table or view.
    Columns,
    /// Column names and types of the open query.
    Metadata,
    /// Affected-row count of the open query.
    Count,
    /// Next page of rows from the open cursor.
    Page,
    /// Close the open cursor.
    Finish,
}

impl Method {
    /// The wire-level method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Execute => "execute",
            Method::Tables => "tables",
            Method::Views => "views",
            Method::Columns => "columns",
            Method::Metadata => "metadata",
            Method::Count => "count",
            Method::Page => "page",
            Method::Finish => "finish",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outgoing JSON-RPC 2.0 request with positional parameters.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub id: u32,
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Vec<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Build a request for `method` with the given positional parameters.
    pub fn new(method: Method, params: Vec<serde_json::Value>) -> Self {
        Self {
            id: REQUEST_ID,
            jsonrpc: "2.0",
            method: method.as_str(),
            params,
        }
    }
}

/// Incoming JSON-RPC 2.0 response.
///
/// Exactly one of `result`/`error` is expected; a response carrying an
/// `error` member fails the call even if `result` is also present.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// The `error` member of a failure response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub message: String,
    pub data: JsonRpcErrorData,
}

/// Auxiliary payload the proxy attaches to every error.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorData {
    pub stacktrace: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn request_wire_shape() {
        let request = JsonRpcRequest::new(Method::Execute, vec![json!("SELECT 1")]);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 1,
                "jsonrpc": "2.0",
                "method": "execute",
                "params": ["SELECT 1"]
            })
        );
    }

    #[test]
    fn request_empty_params_serialize_as_empty_array() {
        let request = JsonRpcRequest::new(Method::Finish, Vec::new());
        let text = serde_json::to_string(&request).unwrap();
        assert!(text.contains("\"params\":[]"), "got: {}", text);
    }

    #[test]
    fn method_wire_names() {
        let names = [
            (Method::Execute, "execute"),
            (Method::Tables, "tables"),
            (Method::Views, "views"),
            (Method::Columns, "columns"),
            (Method::Metadata, "metadata"),
            (Method::Count, "count"),
            (Method::Page, "page"),
            (Method::Finish, "finish"),
        ];
        for (method, expected) in names {
            assert_eq!(method.as_str(), expected);
        }
    }

    #[test]
    fn success_response_parses_result_untouched() {
        let response: JsonRpcResponse =
            serde_json::from_str(r#"{"id":1,"jsonrpc":"2.0","result":[1,2,3]}"#).unwrap();
        assert!(response.error.is_none());
        assert_eq!(response.result, Some(json!([1, 2, 3])));
    }

    #[test]
    fn error_response_parses_message_and_stacktrace() {
        let response: JsonRpcResponse = serde_json::from_str(
            r#"{"error":{"message":"bad sql","data":{"stacktrace":"at line 1"}}}"#,
        )
        .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.message, "bad sql");
        assert_eq!(error.data.stacktrace.as_deref(), Some("at line 1"));
    }

    #[test]
    fn error_response_tolerates_null_stacktrace() {
        let response: JsonRpcResponse =
            serde_json::from_str(r#"{"error":{"message":"gone","data":{"stacktrace":null}}}"#)
                .unwrap();
        assert_eq!(response.error.unwrap().data.stacktrace, None);
    }
}
