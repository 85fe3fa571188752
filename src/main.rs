//! querybridge - interactive SQL console for a JSON-RPC database proxy.
//!
//! A thin rendering shell over [`querybridge::session::Session`]: reads SQL
//! and dot-commands from stdin, prints plain-text result pages, and keeps no
//! state of its own beyond the session it drives.

use std::io::Write;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use querybridge::models::{PageMetadata, Row, TableRef, ViewRef};
use querybridge::paging::{fetch_page, PageStep};
use querybridge::rpc::{RpcError, Transport};
use querybridge::session::{Session, SessionState};

const HELP: &str = "\
Commands:
  .connect <url>                     connect to a proxy endpoint
  .disconnect                        finish any open query and disconnect
  .schema                            list tables and views
  .tables                            list tables
  .views                             list views
  .columns [catalog schema] <table>  list columns of a table or view
  .next                              fetch the next page of the open query
  .finish                            close the open query
  .help                              show this help
  .quit                              exit
Anything else is executed as SQL.";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "querybridge=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    tracing::info!("Starting querybridge v{}", env!("CARGO_PKG_VERSION"));

    let mut session = Session::new();

    if let Some(endpoint) = std::env::args().nth(1) {
        dispatch(&mut session, &format!(".connect {}", endpoint)).await;
    }

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(&session)?;
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == ".quit" || input == ".exit" {
            break;
        }
        dispatch(&mut session, input).await;
    }

    if session.state() != SessionState::Disconnected {
        dispatch(&mut session, ".disconnect").await;
    }
    Ok(())
}

fn prompt(session: &Session<impl Transport>) -> Result<()> {
    let marker = match session.state() {
        SessionState::Disconnected => "sql(offline)> ",
        SessionState::Idle | SessionState::QueryOpen => "sql> ",
    };
    print!("{}", marker);
    std::io::stdout().flush()?;
    Ok(())
}

/// Run one command, rendering either its output or its error.
///
/// On any error the open query is finished best-effort, mirroring the
/// original tool's error path; a second failure there is swallowed.
async fn dispatch(session: &mut Session<impl Transport>, input: &str) {
    if let Err(err) = run_command(session, input).await {
        render_error(&err);
        let _ = session.finish_query().await;
    }
}

async fn run_command(
    session: &mut Session<impl Transport>,
    input: &str,
) -> Result<(), RpcError> {
    let mut words = input.split_whitespace();
    match words.next() {
        Some(".connect") => {
            let endpoint = words.next().unwrap_or_default();
            session.connect(endpoint).await?;
            println!("Connected to {}", endpoint);
            render_schema(session).await
        }
        Some(".disconnect") => {
            session.disconnect().await?;
            println!("Disconnected");
            Ok(())
        }
        Some(".schema") => render_schema(session).await,
        Some(".tables") => {
            for table in session.query_tables().await? {
                println!("{}", table.qualified_name());
            }
            Ok(())
        }
        Some(".views") => {
            for view in session.query_views().await? {
                println!("{}", view.qualified_name());
            }
            Ok(())
        }
        Some(".columns") => {
            let args: Vec<&str> = words.collect();
            let (catalog, schema, table) = match args.as_slice() {
                [table] => (None, None, *table),
                [catalog, schema, table] => (Some(*catalog), Some(*schema), *table),
                _ => {
                    println!("usage: .columns [catalog schema] <table>");
                    return Ok(());
                }
            };
            for column in session.query_columns(catalog, schema, table).await? {
                println!("{}\t{}", column.datatype, column.column);
            }
            Ok(())
        }
        Some(".next") => render_step(session).await,
        Some(".finish") => {
            session.finish_query().await?;
            println!("Query finished");
            Ok(())
        }
        Some(".help") => {
            println!("{}", HELP);
            Ok(())
        }
        Some(word) if word.starts_with('.') => {
            println!("Unknown command {} (.help for help)", word);
            Ok(())
        }
        _ => {
            session.execute_query(input).await?;
            render_step(session).await
        }
    }
}

async fn render_schema(
    session: &mut Session<impl Transport>,
) -> Result<(), RpcError> {
    let (tables, views) = session.query_schema().await?;
    render_refs("Tables", tables.iter().map(TableRef::qualified_name));
    render_refs("Views", views.iter().map(ViewRef::qualified_name));
    Ok(())
}

fn render_refs(title: &str, names: impl Iterator<Item = String>) {
    println!("{}:", title);
    let mut any = false;
    for name in names {
        println!("  {}", name);
        any = true;
    }
    if !any {
        println!("  (none)");
    }
}

/// Fetch and render one display page of the open query.
async fn render_step(
    session: &mut Session<impl Transport>,
) -> Result<(), RpcError> {
    match fetch_page(session).await? {
        PageStep::Rows { metadata, rows } => {
            render_page(&metadata, &rows);
            println!("(.next for more)");
        }
        PageStep::Exhausted { .. } => println!("All rows have been processed"),
        PageStep::Affected { count } => println!("Records affected: {}", count),
    }
    Ok(())
}

fn render_page(metadata: &PageMetadata, rows: &[Row]) {
    println!("{}", metadata.column_names.join("\t"));
    println!("{}", metadata.column_types.join("\t"));
    for row in rows {
        let cells: Vec<String> = metadata
            .column_names
            .iter()
            .map(|name| render_cell(row.get(name)))
            .collect();
        println!("{}", cells.join("\t"));
    }
}

fn render_cell(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => "NULL".to_string(),
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Print the failure the way the original tool displayed it: description
/// first, stacktrace below when present.
fn render_error(err: &RpcError) {
    match err.envelope() {
        Some(envelope) => {
            eprintln!("Error: {}", envelope.description);
            if let Some(trace) = envelope.stacktrace.as_deref() {
                if !trace.is_empty() {
                    eprintln!("{}", trace);
                }
            }
        }
        None => eprintln!("Error: {}", err),
    }
}
