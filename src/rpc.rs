//! RPC layer for communication with the database proxy.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐        HTTP POST          ┌──────────────────┐
//! │  querybridge    │  ◄───────────────────────►│  database proxy  │
//! │ (HttpTransport) │       JSON-RPC 2.0        │                  │
//! └─────────────────┘                           └──────────────────┘
//! ```
//!
//! # Protocol
//!
//! Each call is one POST whose body is a JSON-RPC 2.0 request with
//! positional parameters and a fixed id:
//!
//! ```text
//! {"id":1,"jsonrpc":"2.0","method":"execute","params":["SELECT 1"]}
//! ```
//!
//! Success responses carry `result`; failures carry
//! `{"error":{"message":…,"data":{"stacktrace":…}}}` and are normalized
//! into [`ErrorEnvelope`] whether they arrive with a success or a failure
//! HTTP status.
//!
//! # Usage
//!
//! ```ignore
//! use querybridge::rpc::{HttpTransport, Method, Transport};
//!
//! let transport = HttpTransport::new();
//! let result = transport
//!     .call(Some(&endpoint), Method::Tables, Vec::new())
//!     .await?;
//! ```

mod protocol;
mod transport;

pub use protocol::{
    JsonRpcError, JsonRpcErrorData, JsonRpcRequest, JsonRpcResponse, Method, REQUEST_ID,
};
pub use transport::{ErrorEnvelope, HttpTransport, RpcError, Transport};

#[cfg(test)]
pub(crate) use transport::test_support;
