//! Declarative table schema.
//!
//! A table is described by JSON configuration: columns, row selection,
//! expansion, quick-save endpoints, summaries and actions. The types here
//! deserialize that configuration with `serde`. Fields the grid does not
//! interpret itself are kept in flattened `extra` maps and forwarded to the
//! painting widget untouched.
//!
//! ```
//! use horizon_grid::TableSchema;
//!
//! let schema = TableSchema::from_json(r#"{
//!     "source": "${rows}",
//!     "columns": [{"key": "name", "title": "Name", "type": "text"}],
//!     "rowSelection": {"type": "checkbox", "keyField": "id"},
//!     "quickSaveItemApi": "put:/api/item"
//! }"#).unwrap();
//!
//! assert_eq!(schema.columns[0].key, "name");
//! assert_eq!(schema.quick_save_item_api.unwrap().method(), "PUT");
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::model::value::{DEFAULT_KEY_FIELD, DEFAULT_PRIMARY_FIELD, Record, RowKey, truthy};

/// A column title: literal text or an embedded renderable schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnTitle {
    /// Plain text.
    Text(String),
    /// A schema node rendered in place of the text.
    Schema(Record),
}

/// One column of the table, possibly a group of nested columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    /// Field the column displays. Empty for columns that do not bind a field.
    #[serde(default)]
    pub key: String,
    /// Header content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<ColumnTitle>,
    /// Cell renderer kind. Untyped columns use the widget's default text cell.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Row span expression, evaluated per cell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_span_expr: Option<String>,
    /// Column span expression, evaluated per cell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_span_expr: Option<String>,
    /// Nested columns. A column with children is a pure grouping header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ColumnSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyable: Option<bool>,
    /// Header tooltip text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// `true` or a search form schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searchable: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorter: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    /// `true`, `"left"` or `"right"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<Value>,
    /// Whether the column is shown. Absent means shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_class_name: Option<String>,
    /// Per-cell class name expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name_expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Value>,
    /// Renderer-specific settings.
    #[serde(flatten)]
    pub extra: Record,
}

impl ColumnSchema {
    /// Create a column bound to `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Set a text title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(ColumnTitle::Text(title.into()));
        self
    }

    /// Set the cell renderer kind.
    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the row span expression.
    pub fn with_row_span_expr(mut self, expr: impl Into<String>) -> Self {
        self.row_span_expr = Some(expr.into());
        self
    }

    /// Set the column span expression.
    pub fn with_col_span_expr(mut self, expr: impl Into<String>) -> Self {
        self.col_span_expr = Some(expr.into());
        self
    }

    /// Set nested columns.
    pub fn with_children(mut self, children: Vec<ColumnSchema>) -> Self {
        self.children = Some(children);
        self
    }

    /// `true` if the column is a grouping header.
    pub fn is_group(&self) -> bool {
        self.children.is_some()
    }

    /// `true` if a search affordance should be attached.
    pub fn is_searchable(&self) -> bool {
        self.searchable.as_ref().is_some_and(truthy)
    }

    /// `true` unless the column was toggled off.
    pub fn is_toggled(&self) -> bool {
        self.toggled != Some(false)
    }
}

/// A named bulk-selection entry offered by the selection menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOption {
    /// Preset name: `all`, `none`, `invert`, `odd`, `even`.
    pub key: String,
    /// Menu label.
    #[serde(default)]
    pub text: String,
}

/// Row selection configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSelectionSchema {
    /// `checkbox` or `radio`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Record field holding the selection key. Defaults to `key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_field: Option<String>,
    /// Per-row expression disabling the row's checkbox.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selections: Option<Vec<SelectionOption>>,
    /// Initially selected keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_row_keys: Option<Vec<RowKey>>,
    /// Per-row expression selecting rows initially. Wins over
    /// `selected_row_keys`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_row_keys_expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_width: Option<f64>,
    /// Toggle selection by clicking anywhere in the row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_click: Option<bool>,
    #[serde(flatten)]
    pub extra: Record,
}

impl RowSelectionSchema {
    /// The configured key field, or `key`.
    pub fn key_field(&self) -> &str {
        self.key_field.as_deref().unwrap_or(DEFAULT_KEY_FIELD)
    }
}

/// Expandable row configuration. The whole object doubles as the schema of
/// the expanded row body when `type` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandableSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_field: Option<String>,
    /// Per-row expression deciding whether a row can expand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expandable_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_row_class_name_expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_row_keys: Option<Vec<RowKey>>,
    /// Wins over `expanded_row_keys`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_row_keys_expr: Option<String>,
    #[serde(flatten)]
    pub extra: Record,
}

impl ExpandableSchema {
    /// The configured key field, or `key`.
    pub fn key_field(&self) -> &str {
        self.key_field.as_deref().unwrap_or(DEFAULT_KEY_FIELD)
    }
}

const METHODS: [&str; 7] = ["get", "post", "put", "patch", "delete", "head", "jsonp"];

/// A remote endpoint.
///
/// Accepts either a string with an optional method prefix
/// (`"post:/api/save"`, `"/api/save"`) or an object `{url, method}`.
/// The method defaults to `POST`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveApi {
    method: String,
    url: String,
}

impl SaveApi {
    /// Parse the string form.
    pub fn parse(api: &str) -> Self {
        let trimmed = api.trim();
        if let Some((prefix, rest)) = trimmed.split_once(':') {
            let lower = prefix.to_ascii_lowercase();
            if METHODS.contains(&lower.as_str()) {
                return Self::new(lower, rest.trim());
            }
        }
        Self::new("post", trimmed)
    }

    /// Create an endpoint from parts.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
        }
    }

    /// Upper-case HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Endpoint URL, possibly relative.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// `true` when the endpoint can be called.
    pub fn is_effective(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

impl<'de> Deserialize<'de> for SaveApi {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Object {
                #[serde(default)]
                url: String,
                #[serde(default)]
                method: Option<String>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => SaveApi::parse(&text),
            Raw::Object { url, method: None } => SaveApi::parse(&url),
            Raw::Object {
                url,
                method: Some(method),
            } => SaveApi::new(method, url),
        })
    }
}

/// Returns `true` if `api` is configured and callable.
pub fn is_effective_api(api: Option<&SaveApi>) -> bool {
    api.is_some_and(SaveApi::is_effective)
}

/// User-facing quick-save messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMessages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_success: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_failed: Option<String>,
}

/// One cell of a head or foot summary row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCell {
    /// Number of columns the cell covers.
    pub col_span: Option<u64>,
    /// Pinning, forwarded to the widget.
    pub fixed: Option<Value>,
    /// Schema rendered with the data source as its data.
    pub schema: Value,
}

/// A per-row hover action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAction {
    /// Hidden until hover; such actions are not rendered by the table.
    #[serde(default)]
    pub hidden_on_hover: bool,
    #[serde(flatten)]
    pub extra: Record,
}

/// The full table configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    /// Row source expression, e.g. `${items}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
    /// `true`, `"auto"` or a toggler schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns_togglable: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_selection: Option<RowSelectionSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expandable: Option<ExpandableSchema>,
    /// Key field of nested records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_field: Option<String>,
    /// Field holding nested child records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_column_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_class_name_expr: Option<String>,
    /// Record field excluded from diffs and aggregated into `ids`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_field: Option<String>,
    /// Batch quick-save endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_save_api: Option<SaveApi>,
    /// Single-row quick-save endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_save_item_api: Option<SaveApi>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<SaveMessages>,
    /// Component name to reload after a successful save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_summary: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foot_summary: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_actions: Option<Vec<ItemAction>>,
    /// Toolbar actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<Value>,
    /// Cell values resolve against the row's scope, ancestors included.
    #[serde(default)]
    pub can_access_super_data: bool,
    /// Keep existing row objects for records with the same identity.
    #[serde(rename = "reUseRow", default)]
    pub reuse_row: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_class_name: Option<String>,
    /// Location of the table in the page schema.
    #[serde(rename = "$path", default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl TableSchema {
    /// Parse a schema from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a schema from a JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// The primary field, or `id`.
    pub fn primary_field(&self) -> &str {
        self.primary_field.as_deref().unwrap_or(DEFAULT_PRIMARY_FIELD)
    }

    /// `true` when the table sits inside a CRUD container, which renders its
    /// own column toggler.
    pub fn is_in_crud(&self) -> bool {
        self.path.as_deref().is_some_and(|path| {
            path.match_indices("crud2/")
                .any(|(at, _)| at == 0 || path[..at].ends_with('/'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_api_forms() {
        let api: SaveApi = serde_json::from_value(json!("put:/api/item")).unwrap();
        assert_eq!(api.method(), "PUT");
        assert_eq!(api.url(), "/api/item");

        let api: SaveApi = serde_json::from_value(json!("/api/rows")).unwrap();
        assert_eq!(api.method(), "POST");

        let api: SaveApi = serde_json::from_value(json!("https://host/api")).unwrap();
        assert_eq!(api.url(), "https://host/api");

        let api: SaveApi =
            serde_json::from_value(json!({"url": "/x", "method": "patch"})).unwrap();
        assert_eq!(api.method(), "PATCH");

        let api: SaveApi = serde_json::from_value(json!({"url": ""})).unwrap();
        assert!(!api.is_effective());
        assert!(!is_effective_api(None));
    }

    #[test]
    fn test_column_schema_extra_fields() {
        let column: ColumnSchema = serde_json::from_value(json!({
            "key": "status",
            "title": {"type": "tpl", "tpl": "Status"},
            "type": "mapping",
            "map": {"1": "on"},
            "toggled": false
        }))
        .unwrap();

        assert!(matches!(column.title, Some(ColumnTitle::Schema(_))));
        assert_eq!(column.kind.as_deref(), Some("mapping"));
        assert_eq!(column.extra.get("map"), Some(&json!({"1": "on"})));
        assert!(!column.is_toggled());
        assert!(!column.is_group());
    }

    #[test]
    fn test_table_schema_defaults() {
        let schema = TableSchema::from_json(r#"{"columns": []}"#).unwrap();
        assert_eq!(schema.primary_field(), "id");
        assert!(!schema.reuse_row);
        assert!(TableSchema::from_json("[").is_err());
    }

    #[test]
    fn test_crud_path_detection() {
        let mut schema = TableSchema::default();
        for (path, expected) in [
            ("page/body/crud2/table", true),
            ("crud2/table", true),
            ("page/mycrud2/table", false),
            ("page/table", false),
        ] {
            schema.path = Some(path.to_string());
            assert_eq!(schema.is_in_crud(), expected, "{path}");
        }
    }
}
