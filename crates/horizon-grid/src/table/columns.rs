//! Column building.
//!
//! [`ColumnBuilder`] turns the configured column tree into [`BuiltColumn`]s:
//! a title renderer, an optional cell renderer (typed columns only), an
//! optional per-cell class name resolver, an optional search dropdown and
//! the built children of grouped headers.
//!
//! Cell rendering resolves spans through the [`SpanResolver`] of the current
//! render pass.

use std::fmt;
use std::sync::Arc;

use horizon_grid_core::logging::targets;
use serde::Serialize;
use serde_json::{Value, json};

use super::node::{Node, cell_field_schema, class_names};
use super::span::{RenderProps, SpanResolver};
use crate::expr::{Evaluator, ExprContext};
use crate::model::value::{resolve_variable, to_span};
use crate::model::{RowId, RowStore, SortOrder};
use crate::schema::{ColumnSchema, ColumnTitle};

const HEAD_CELL_WRAPPER: &str = "Table-head-cell-wrapper";

/// Builds header content for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleRenderer {
    class_name: String,
    content: Option<Node>,
    remark: Option<Node>,
}

impl TitleRenderer {
    /// Class name of the header wrapper.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Render the header: content, remark, then `nested` header content, in
    /// that order, inside the wrapper.
    pub fn render(&self, nested: Vec<Node>) -> Node {
        let mut children: Vec<Node> = self
            .content
            .iter()
            .chain(self.remark.iter())
            .cloned()
            .collect();
        children.extend(nested);
        Node::element(self.class_name.clone(), children)
    }
}

/// A rendered body cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCell {
    /// Cell content, a `cell-field` schema scoped to the row's locals.
    pub content: Node,
    /// Span attributes; `Some(0)` means merged away.
    pub props: RenderProps,
    /// The row quick edits from this cell apply to, if the row exists.
    pub row: Option<RowId>,
}

/// Renders body cells of a typed column.
pub struct CellRenderer {
    column: ColumnSchema,
    cell_schema: Value,
    can_access_super_data: bool,
    evaluator: Arc<dyn Evaluator>,
}

impl fmt::Debug for CellRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellRenderer")
            .field("key", &self.column.key)
            .field("can_access_super_data", &self.can_access_super_data)
            .finish_non_exhaustive()
    }
}

impl CellRenderer {
    /// Render the cell at (`row_index`, `col_index`) for `record`.
    pub fn render<S: RowStore + ?Sized>(
        &self,
        store: &S,
        spans: &mut SpanResolver,
        record: &Value,
        row_index: usize,
        col_index: usize,
    ) -> RenderedCell {
        let row_id = store.row_by_index(row_index, &[]);
        let row = row_id.and_then(|id| store.row(id));
        let locals = row.map_or(Value::Null, |row| row.locals().clone());

        let value = if self.column.key.is_empty() {
            None
        } else {
            let scope = match row {
                Some(row) if !self.can_access_super_data => row.data(),
                _ => &locals,
            };
            Some(
                resolve_variable(&self.column.key, scope)
                    .cloned()
                    .unwrap_or(Value::Null),
            )
        };

        let ctx = ExprContext::cell(record.clone(), row_index, col_index).to_value();
        let row_span = self
            .column
            .row_span_expr
            .as_deref()
            .map_or(0, |expr| to_span(&self.evaluator.filter(expr, &ctx)));
        let col_span = self
            .column
            .col_span_expr
            .as_deref()
            .map_or(0, |expr| to_span(&self.evaluator.filter(expr, &ctx)));
        let props = spans.resolve(row_index, col_index, row_span, col_span);

        tracing::trace!(
            target: targets::COLUMNS,
            key = %self.column.key,
            row_index,
            col_index,
            ?props,
            "cell rendered"
        );

        RenderedCell {
            content: Node::Schema {
                region: "cell-field".into(),
                schema: self.cell_schema.clone(),
                data: locals,
                value,
            },
            props,
            row: row_id,
        }
    }
}

/// Resolves a cell's class name from an expression plus the column's static
/// class name.
pub struct ClassNameResolver {
    expr: String,
    static_class: Option<String>,
    evaluator: Arc<dyn Evaluator>,
}

impl fmt::Debug for ClassNameResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassNameResolver")
            .field("expr", &self.expr)
            .field("static_class", &self.static_class)
            .finish_non_exhaustive()
    }
}

impl ClassNameResolver {
    /// Class name of the cell in row `row_index` showing `record`.
    pub fn resolve(&self, record: &Value, row_index: usize) -> String {
        let ctx = ExprContext::row(record.clone(), row_index).to_value();
        let resolved = self.evaluator.filter(&self.expr, &ctx);
        match &self.static_class {
            Some(class) if !class.is_empty() => format!("{resolved} {class}"),
            _ => resolved,
        }
    }
}

/// Column-scoped quick search attached to a header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDropdown {
    /// Column key searched.
    pub name: String,
    /// `true` or a search form schema.
    pub searchable: Value,
    pub order_by: Option<String>,
    pub order_dir: Option<SortOrder>,
    /// Current query, used as the form's data.
    pub data: Value,
    pub key: String,
}

/// A column ready for the painting widget.
#[derive(Debug)]
pub struct BuiltColumn {
    /// Position among its siblings.
    pub index: usize,
    /// The configured column.
    pub schema: ColumnSchema,
    pub title: TitleRenderer,
    /// Present only for typed, non-group columns.
    pub cell: Option<CellRenderer>,
    pub class_name: Option<ClassNameResolver>,
    pub filter_dropdown: Option<SearchDropdown>,
    pub children: Vec<BuiltColumn>,
}

impl BuiltColumn {
    pub fn key(&self) -> &str {
        &self.schema.key
    }

    /// Render the header with nested group headers filled in.
    pub fn render_title(&self) -> Node {
        let nested = self.children.iter().map(BuiltColumn::render_title).collect();
        self.title.render(nested)
    }

    /// Leaf columns in display order.
    pub fn leaves(&self) -> Vec<&BuiltColumn> {
        if self.children.is_empty() {
            vec![self]
        } else {
            self.children.iter().flat_map(BuiltColumn::leaves).collect()
        }
    }
}

/// Builds columns for one render pass.
pub struct ColumnBuilder {
    evaluator: Arc<dyn Evaluator>,
    can_access_super_data: bool,
    order_by: Option<String>,
    order_dir: Option<SortOrder>,
    query: Value,
}

impl fmt::Debug for ColumnBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnBuilder")
            .field("can_access_super_data", &self.can_access_super_data)
            .field("order_by", &self.order_by)
            .finish_non_exhaustive()
    }
}

impl ColumnBuilder {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            evaluator,
            can_access_super_data: false,
            order_by: None,
            order_dir: None,
            query: Value::Null,
        }
    }

    /// Resolve cell values against the row's full scope.
    pub fn can_access_super_data(mut self, enabled: bool) -> Self {
        self.can_access_super_data = enabled;
        self
    }

    /// Sort and query state shown by search dropdowns.
    pub fn with_sort_state<S: RowStore + ?Sized>(mut self, store: &S) -> Self {
        self.order_by = store.order_by().map(str::to_string);
        self.order_dir = store.order();
        self.query = store.query().clone();
        self
    }

    /// Build `columns` and their children.
    pub fn build(&self, columns: &[ColumnSchema]) -> Vec<BuiltColumn> {
        columns
            .iter()
            .enumerate()
            .map(|(index, column)| self.build_column(index, column))
            .collect()
    }

    fn build_column(&self, index: usize, column: &ColumnSchema) -> BuiltColumn {
        let raw = serde_json::to_value(column).unwrap_or(Value::Null);

        let cell = match (&column.kind, column.is_group()) {
            (Some(_), false) => Some(CellRenderer {
                column: column.clone(),
                cell_schema: cell_field_schema(&raw),
                can_access_super_data: self.can_access_super_data,
                evaluator: self.evaluator.clone(),
            }),
            _ => None,
        };

        let class_name = column
            .class_name_expr
            .as_ref()
            .map(|expr| ClassNameResolver {
                expr: expr.clone(),
                static_class: column.class_name.clone(),
                evaluator: self.evaluator.clone(),
            });

        let filter_dropdown = column.is_searchable().then(|| SearchDropdown {
            name: column.key.clone(),
            searchable: column.searchable.clone().unwrap_or(Value::Bool(true)),
            order_by: self.order_by.clone(),
            order_dir: self.order_dir,
            data: self.query.clone(),
            key: format!("th-search-{index}"),
        });

        let children = column
            .children
            .as_deref()
            .map(|children| self.build(children))
            .unwrap_or_default();

        BuiltColumn {
            index,
            schema: column.clone(),
            title: build_title(column),
            cell,
            class_name,
            filter_dropdown,
            children,
        }
    }
}

fn build_title(column: &ColumnSchema) -> TitleRenderer {
    let (title_schema, value) = match &column.title {
        Some(ColumnTitle::Schema(schema)) => {
            (Some(Value::Object(schema.clone())), Value::Object(schema.clone()))
        }
        Some(ColumnTitle::Text(text)) => (Some(json!({"type": "plain"})), Value::from(text.as_str())),
        None => (None, Value::Null),
    };

    let content = title_schema.map(|schema| Node::Schema {
        region: "cell-field".into(),
        schema: cell_field_schema(&schema),
        data: Value::Null,
        value: Some(value),
    });

    let remark = column.remark.as_ref().map(|tooltip| {
        Node::schema(
            "remark",
            json!({"type": "remark", "tooltip": tooltip}),
            Value::Null,
        )
    });

    TitleRenderer {
        class_name: class_names([
            Some(HEAD_CELL_WRAPPER),
            column.class_name.as_deref(),
            column.title_class_name.as_deref(),
        ]),
        content,
        remark,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{FnEvaluator, VariableEvaluator};

    fn builder() -> ColumnBuilder {
        ColumnBuilder::new(Arc::new(VariableEvaluator))
    }

    #[test]
    fn test_untyped_column_has_no_cell_renderer() {
        let built = builder().build(&[
            ColumnSchema::new("name").with_title("Name"),
            ColumnSchema::new("age").with_type("number"),
        ]);
        assert!(built[0].cell.is_none());
        assert!(built[1].cell.is_some());
    }

    #[test]
    fn test_group_column_never_gets_cell_renderer() {
        let built = builder().build(&[ColumnSchema::new("group")
            .with_type("text")
            .with_children(vec![
                ColumnSchema::new("a").with_type("text"),
                ColumnSchema::new("b"),
            ])]);

        assert!(built[0].cell.is_none());
        assert_eq!(built[0].children.len(), 2);
        assert!(built[0].children[0].cell.is_some());
        assert_eq!(built[0].leaves().len(), 2);
    }

    #[test]
    fn test_title_order_and_wrapper_class() {
        let column = ColumnSchema {
            remark: Some("help".into()),
            class_name: Some("wide".into()),
            title_class_name: Some("bold".into()),
            ..ColumnSchema::new("group").with_title("Group")
        }
        .with_children(vec![ColumnSchema::new("a").with_title("A")]);

        let built = builder().build(&[column]);
        let Node::Element {
            class_name,
            children,
        } = built[0].render_title()
        else {
            panic!("expected element");
        };

        assert_eq!(class_name, "Table-head-cell-wrapper wide bold");
        assert_eq!(children.len(), 3);
        assert!(matches!(&children[0], Node::Schema { value: Some(v), .. } if v == "Group"));
        assert!(matches!(&children[1], Node::Schema { region, .. } if region == "remark"));
        assert!(matches!(&children[2], Node::Element { .. }));
    }

    #[test]
    fn test_class_name_resolver_appends_static_class() {
        let column = ColumnSchema {
            class_name_expr: Some("level-${record.level}".into()),
            class_name: Some("cell".into()),
            ..ColumnSchema::new("level")
        };
        let built = builder().build(&[column]);
        let resolver = built[0].class_name.as_ref().unwrap();
        assert_eq!(
            resolver.resolve(&serde_json::json!({"level": "warn"}), 0),
            "level-warn cell"
        );
    }

    #[test]
    fn test_search_dropdown_key() {
        let column = ColumnSchema {
            searchable: Some(Value::Bool(true)),
            ..ColumnSchema::new("name")
        };
        let built = builder().build(&[ColumnSchema::new("id"), column]);
        let dropdown = built[1].filter_dropdown.as_ref().unwrap();
        assert_eq!(dropdown.key, "th-search-1");
        assert_eq!(dropdown.name, "name");
        assert!(built[0].filter_dropdown.is_none());
    }

    #[test]
    fn test_span_expression_sees_cell_context() {
        let eval = FnEvaluator::new(|_: &str, ctx: &Value| {
            if ctx["rowIndex"] == 0 && ctx["colIndex"] == 2 {
                Value::from(2)
            } else {
                Value::Null
            }
        });
        let built = ColumnBuilder::new(Arc::new(eval))
            .build(&[ColumnSchema::new("x").with_type("text").with_row_span_expr("span")]);
        let cell = built[0].cell.as_ref().unwrap();

        let store = crate::model::TableStore::new();
        let mut spans = SpanResolver::new();
        let first = cell.render(&store, &mut spans, &Value::Null, 0, 2);
        let second = cell.render(&store, &mut spans, &Value::Null, 1, 2);

        assert_eq!(first.props.row_span, Some(2));
        assert_eq!(second.props.row_span, Some(0));
        assert!(first.row.is_none());
    }
}
