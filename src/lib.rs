//! querybridge client library
//!
//! Client for an interactive SQL query tool speaking JSON-RPC 2.0 to a
//! database proxy:
//!
//! - `rpc` - JSON-RPC transport and the normalized error envelope
//! - `session` - the connect / execute / paginate / finish lifecycle
//! - `models` - plain data structures handed to renderers
//! - `paging` - the caller-driven pagination protocol
//!
//! # Usage
//!
//! ```ignore
//! use querybridge::paging::{fetch_page, PageStep};
//! use querybridge::session::Session;
//!
//! let mut session = Session::new();
//! session.connect("http://localhost:9001/").await?;
//! session.execute_query("SELECT * FROM users").await?;
//!
//! loop {
//!     match fetch_page(&mut session).await? {
//!         PageStep::Rows { metadata, rows } => render(&metadata, &rows),
//!         PageStep::Exhausted { .. } => break,
//!         PageStep::Affected { count } => {
//!             println!("Records affected: {count}");
//!             break;
//!         }
//!     }
//! }
//! ```

pub mod models;
pub mod paging;
pub mod rpc;
pub mod session;
