//! Render tree nodes handed to the painting widget.

use serde::Serialize;
use serde_json::{Map, Value};

/// One node of the render tree.
///
/// Schema nodes are opaque to the grid: the host renders them with `data`
/// as their scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Node {
    /// A schema rendered by the host in `region`.
    Schema {
        region: String,
        schema: Value,
        data: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    /// A container with a class name.
    #[serde(rename_all = "camelCase")]
    Element {
        class_name: String,
        children: Vec<Node>,
    },
    /// Literal text.
    Text { text: String },
}

impl Node {
    pub fn schema(region: impl Into<String>, schema: Value, data: Value) -> Self {
        Self::Schema {
            region: region.into(),
            schema,
            data,
            value: None,
        }
    }

    pub fn element(class_name: impl Into<String>, children: Vec<Node>) -> Self {
        Self::Element {
            class_name: class_name.into(),
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Turn a configured schema slot into nodes.
///
/// Objects become one node, arrays one node per object entry, strings and
/// numbers literal text; `null` renders nothing.
pub fn render_schema(region: &str, schema: &Value, data: &Value) -> Vec<Node> {
    match schema {
        Value::Null => Vec::new(),
        Value::Object(_) => vec![Node::schema(region, schema.clone(), data.clone())],
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(_) => Node::schema(region, item.clone(), data.clone()),
                other => Node::text(other.as_str().map_or_else(|| other.to_string(), str::to_string)),
            })
            .collect(),
        Value::String(text) => vec![Node::text(text.clone())],
        other => vec![Node::text(other.to_string())],
    }
}

/// Wrap a column-like schema as a `cell-field` schema: the original fields
/// minus `width` and `children`, retyped, with the original kept under
/// `column` and the key as `name`.
pub fn cell_field_schema(schema: &Value) -> Value {
    let Value::Object(fields) = schema else {
        return schema.clone();
    };
    let mut rest: Map<String, Value> = fields.clone();
    rest.remove("width");
    rest.remove("children");

    let mut cell = rest.clone();
    cell.insert("type".into(), Value::from("cell-field"));
    cell.insert("column".into(), Value::Object(rest));
    cell.insert(
        "name".into(),
        fields.get("key").cloned().unwrap_or(Value::Null),
    );
    Value::Object(cell)
}

/// Join class names, skipping empty ones.
pub fn class_names<'a>(names: impl IntoIterator<Item = Option<&'a str>>) -> String {
    names
        .into_iter()
        .flatten()
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
