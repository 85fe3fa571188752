//! Plain data structures exchanged with the proxy.
//!
//! These are the shapes a rendering collaborator consumes: page metadata,
//! rows, and the table/view/column descriptors behind schema browsing.
//! Field names follow the wire protocol where they differ from Rust
//! convention.

use serde::{Deserialize, Serialize};

/// A result row, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Column names and types of an open query, index-aligned.
///
/// Zero columns means the statement produced no row set (DDL/DML); callers
/// fetch the affected-row count instead of requesting pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(rename = "columnnames")]
    pub column_names: Vec<String>,
    #[serde(rename = "columntypes")]
    pub column_types: Vec<String>,
}

impl PageMetadata {
    /// True when the statement produced a row set.
    pub fn is_row_set(&self) -> bool {
        !self.column_names.is_empty()
    }
}

/// A table visible to the proxy. Catalog and schema may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    #[serde(default)]
    pub catalog: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    pub table: String,
}

impl TableRef {
    /// Fully quoted `"catalog"."schema"."table"` form.
    pub fn qualified_name(&self) -> String {
        qualified_name(
            self.catalog.as_deref(),
            self.schema.as_deref(),
            &self.table,
        )
    }
}

/// A view visible to the proxy. The proxy keys the name as `view`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRef {
    #[serde(default)]
    pub catalog: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    pub view: String,
}

impl ViewRef {
    /// Fully quoted `"catalog"."schema"."view"` form.
    pub fn qualified_name(&self) -> String {
        qualified_name(self.catalog.as_deref(), self.schema.as_deref(), &self.view)
    }
}

/// One column of a table or view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub datatype: String,
    pub column: String,
}

/// Render a three-part identifier with embedded quotes doubled.
///
/// Absent catalog/schema render as empty segments, keeping the dotted
/// shape stable for display.
fn qualified_name(catalog: Option<&str>, schema: Option<&str>, name: &str) -> String {
    format!(
        "{}.{}.{}",
        quote_ident(catalog.unwrap_or("")),
        quote_ident(schema.unwrap_or("")),
        quote_ident(name)
    )
}

fn quote_ident(part: &str) -> String {
    format!("\"{}\"", part.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn metadata_deserializes_wire_names() {
        let json = r#"{"columnnames":["x","y"],"columntypes":["int","text"]}"#;
        let metadata: PageMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.column_names, vec!["x", "y"]);
        assert_eq!(metadata.column_types, vec!["int", "text"]);
        assert!(metadata.is_row_set());
    }

    #[test]
    fn empty_metadata_is_not_a_row_set() {
        let metadata: PageMetadata =
            serde_json::from_str(r#"{"columnnames":[],"columntypes":[]}"#).unwrap();
        assert!(!metadata.is_row_set());
    }

    #[test]
    fn table_ref_tolerates_null_catalog_and_schema() {
        let table: TableRef =
            serde_json::from_str(r#"{"catalog":null,"schema":null,"table":"users"}"#).unwrap();
        assert_eq!(table.catalog, None);
        assert_eq!(table.qualified_name(), r#""".""."users""#);
    }

    #[test]
    fn qualified_name_doubles_embedded_quotes() {
        let table = TableRef {
            catalog: Some("main".to_string()),
            schema: Some("pub\"lic".to_string()),
            table: "order\"s".to_string(),
        };
        assert_eq!(table.qualified_name(), r#""main"."pub""lic"."order""s""#);
    }

    #[test]
    fn view_ref_uses_view_key() {
        let view: ViewRef =
            serde_json::from_str(r#"{"catalog":"main","schema":"public","view":"v_users"}"#)
                .unwrap();
        assert_eq!(view.view, "v_users");
        assert_eq!(view.qualified_name(), r#""main"."public"."v_users""#);
    }

    #[test]
    fn column_ref_deserializes() {
        let column: ColumnRef =
            serde_json::from_str(r#"{"datatype":"integer","column":"id"}"#).unwrap();
        assert_eq!(column.datatype, "integer");
        assert_eq!(column.column, "id");
    }
}
