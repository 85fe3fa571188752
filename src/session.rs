//! Query session controller.
//!
//! Sequences the connect / execute / paginate / finish lifecycle against a
//! [`Transport`], holding the only session state there is: the current
//! endpoint and whether a server-side cursor is open.
//!
//! The lifecycle is a three-state machine:
//!
//! ```text
//! Disconnected ──connect──► Idle ──execute──► QueryOpen
//!      ▲                     ▲  ▲                │  │
//!      │                     │  └────finish──────┘  │
//!      └─────disconnect──────┴──────────────────────┘
//! ```
//!
//! The auto-finish rule (at most one open query per session) lives in the
//! [`transition`] table rather than in ad hoc conditionals, so the invariant
//! can be checked mechanically. State is mutated only after the relevant RPC
//! settles, which keeps `query_open == true ⇒ endpoint present` true by
//! construction.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::models::{ColumnRef, PageMetadata, Row, TableRef, ViewRef};
use crate::rpc::{ErrorEnvelope, HttpTransport, Method, RpcError, Transport};

/// Lifecycle states of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No endpoint configured.
    Disconnected,
    /// Endpoint configured, no open cursor.
    Idle,
    /// Endpoint configured and a server-side cursor is open.
    QueryOpen,
}

/// State-mutating operations covered by the transition table.
///
/// Read-only RPCs (`metadata`, `page`, `count`, `tables`, `views`,
/// `columns`) never change session state and are not listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    Connect,
    Disconnect,
    Execute,
    Finish,
}

/// One row of the transition table: what must happen for an operation in a
/// given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// A `finish` RPC must complete before the operation proceeds.
    pub finish_first: bool,
    /// State after the operation succeeds.
    pub next: SessionState,
}

/// The lifecycle transition table.
///
/// `Err` rows reject the operation before any RPC is issued. `Ok` rows in
/// `Disconnected` whose RPC fails the not-connected precondition never
/// commit their `next` state; the error surfaces to the caller instead.
pub fn transition(state: SessionState, op: LifecycleOp) -> Result<Transition, ErrorEnvelope> {
    use LifecycleOp::*;
    use SessionState::*;

    match (state, op) {
        (Disconnected, Connect) => Ok(Transition {
            finish_first: false,
            next: Idle,
        }),
        (Idle | QueryOpen, Connect) => Err(ErrorEnvelope::already_connected()),

        (QueryOpen, Disconnect) => Ok(Transition {
            finish_first: true,
            next: Disconnected,
        }),
        (Disconnected | Idle, Disconnect) => Ok(Transition {
            finish_first: false,
            next: Disconnected,
        }),

        (QueryOpen, Execute) => Ok(Transition {
            finish_first: true,
            next: QueryOpen,
        }),
        (Disconnected | Idle, Execute) => Ok(Transition {
            finish_first: false,
            next: QueryOpen,
        }),

        (Disconnected, Finish) => Ok(Transition {
            finish_first: false,
            next: Disconnected,
        }),
        (Idle | QueryOpen, Finish) => Ok(Transition {
            finish_first: false,
            next: Idle,
        }),
    }
}

/// A single query session against a database proxy.
///
/// An explicit object: create as many independent sessions as needed. All
/// operations are async and report failures through the returned `Result`,
/// never by panicking.
#[derive(Debug)]
pub struct Session<T: Transport> {
    transport: T,
    endpoint: Option<Url>,
    query_open: bool,
}

impl Session<HttpTransport> {
    /// A session over HTTP, the production configuration.
    pub fn new() -> Self {
        Self::with_transport(HttpTransport::new())
    }
}

impl Default for Session<HttpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Session<T> {
    /// A session over an arbitrary transport.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            endpoint: None,
            query_open: false,
        }
    }

    /// Current lifecycle state, derived from the endpoint/flag pair.
    pub fn state(&self) -> SessionState {
        match (&self.endpoint, self.query_open) {
            // query_open is never set without an endpoint
            (None, _) => SessionState::Disconnected,
            (Some(_), false) => SessionState::Idle,
            (Some(_), true) => SessionState::QueryOpen,
        }
    }

    /// The configured endpoint, if connected.
    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    /// Whether a server-side cursor is currently open.
    pub fn query_open(&self) -> bool {
        self.query_open
    }

    async fn call(&self, method: Method, params: Vec<Value>) -> Result<Value, RpcError> {
        self.transport
            .call(self.endpoint.as_ref(), method, params)
            .await
    }

    /// Configure the proxy endpoint.
    ///
    /// Purely local; no RPC is issued. Fails if the session is already
    /// connected or the endpoint does not parse as a URL.
    pub async fn connect(&mut self, endpoint: &str) -> Result<(), RpcError> {
        transition(self.state(), LifecycleOp::Connect)?;
        let url = Url::parse(endpoint)?;
        info!(endpoint = %url, "connected");
        self.endpoint = Some(url);
        Ok(())
    }

    /// Drop the endpoint, finishing any open query first so the proxy's
    /// cursor is returned to idle.
    pub async fn disconnect(&mut self) -> Result<(), RpcError> {
        let transition = transition(self.state(), LifecycleOp::Disconnect)?;
        if transition.finish_first {
            self.finish_query().await?;
        }
        self.endpoint = None;
        info!("disconnected");
        Ok(())
    }

    /// Open a server-side cursor for `sql`.
    ///
    /// At most one query is open per session: an already-open cursor is
    /// finished before the new `execute` goes out. No rows are fetched
    /// here; see [`crate::paging`].
    pub async fn execute_query(&mut self, sql: &str) -> Result<(), RpcError> {
        let transition = transition(self.state(), LifecycleOp::Execute)?;
        if transition.finish_first {
            self.finish_query().await?;
        }
        self.call(Method::Execute, vec![Value::String(sql.to_owned())])
            .await?;
        self.query_open = true;
        debug!("cursor opened");
        Ok(())
    }

    /// Column names and types of the open query.
    pub async fn query_metadata(&self) -> Result<PageMetadata, RpcError> {
        decode(self.call(Method::Metadata, Vec::new()).await?)
    }

    /// Next page of rows from the open cursor. Zero rows means the result
    /// set is exhausted.
    pub async fn query_next_page(&self) -> Result<Vec<Row>, RpcError> {
        decode(self.call(Method::Page, Vec::new()).await?)
    }

    /// Affected-row count of the open query (statements with no row set).
    pub async fn query_result_count(&self) -> Result<i64, RpcError> {
        decode(self.call(Method::Count, Vec::new()).await?)
    }

    /// Close the open cursor regardless of whether rows remain.
    pub async fn finish_query(&mut self) -> Result<(), RpcError> {
        self.call(Method::Finish, Vec::new()).await?;
        self.query_open = false;
        debug!("cursor finished");
        Ok(())
    }

    /// Tables visible to the proxy. Independent of query-open state.
    pub async fn query_tables(&self) -> Result<Vec<TableRef>, RpcError> {
        decode(self.call(Method::Tables, Vec::new()).await?)
    }

    /// Views visible to the proxy. Independent of query-open state.
    pub async fn query_views(&self) -> Result<Vec<ViewRef>, RpcError> {
        decode(self.call(Method::Views, Vec::new()).await?)
    }

    /// Columns of one table or view.
    pub async fn query_columns(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<ColumnRef>, RpcError> {
        let params = vec![
            opt_param(catalog),
            opt_param(schema),
            Value::String(table.to_owned()),
        ];
        decode(self.call(Method::Columns, params).await?)
    }

    /// Tables and views fetched concurrently, for schema browsing.
    pub async fn query_schema(&self) -> Result<(Vec<TableRef>, Vec<ViewRef>), RpcError> {
        tokio::try_join!(self.query_tables(), self.query_views())
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(RpcError::Decode)
}

fn opt_param(value: Option<&str>) -> Value {
    match value {
        Some(text) => Value::String(text.to_owned()),
        None => Value::Null,
    }
}
