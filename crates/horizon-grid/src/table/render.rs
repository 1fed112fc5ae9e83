//! Render descriptors handed to the painting widget.

use std::fmt;
use std::sync::Arc;

use horizon_grid_core::{PerfSpan, logging::targets};
use serde::Serialize;
use serde_json::{Value, json};

use super::Table;
use super::columns::{BuiltColumn, ColumnBuilder, RenderedCell};
use super::node::{Node, class_names, render_schema};
use super::span::SpanResolver;
use crate::expr::{Evaluator, ExprContext};
use crate::model::value::merge_into;
use crate::model::{RowKey, RowStore};
use crate::schema::{
    ColumnSchema, ExpandableSchema, ItemAction, RowSelectionSchema, SelectionOption, SummaryCell,
};

/// One entry of the header toolbar.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarItem {
    /// A configured action button.
    Action(Node),
    /// The column visibility menu.
    ColumnToggler(ColumnToggler),
}

/// Column visibility menu. Toggle through [`Table::toggle_column`] and
/// [`Table::toggle_all_columns`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnToggler {
    /// Toggler schema, `type` set to `column-toggler`.
    pub schema: Value,
    /// Configured columns, hidden ones included.
    pub columns: Vec<ColumnSchema>,
    /// Visibility of each entry in `columns`.
    pub toggled: Vec<bool>,
}

/// The header toolbar.
#[derive(Debug, Clone, PartialEq)]
pub struct Toolbar {
    pub class_name: String,
    pub items: Vec<ToolbarItem>,
}

/// Shown while rows are reordered. Submit through
/// [`Table::handle_save_order`], discard through [`Table::reset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Heading {
    pub class_name: String,
    pub moved: usize,
    pub message: String,
}

/// Per-row checkbox attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckboxProps {
    pub disabled: bool,
}

/// Row selection as the painting widget sees it.
pub struct RowSelectionConfig {
    pub selected_row_keys: Vec<RowKey>,
    /// The configuration minus initial keys and presets.
    pub schema: RowSelectionSchema,
    /// Preset menu entries. Activate through
    /// [`Table::apply_selection_preset`].
    pub selections: Vec<SelectionOption>,
    disable_on: Option<String>,
    evaluator: Arc<dyn Evaluator>,
}

impl fmt::Debug for RowSelectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowSelectionConfig")
            .field("selected_row_keys", &self.selected_row_keys)
            .field("selections", &self.selections)
            .field("disable_on", &self.disable_on)
            .finish_non_exhaustive()
    }
}

impl RowSelectionConfig {
    /// Checkbox attributes of the row at `row_index`.
    pub fn checkbox_props(&self, record: &Value, row_index: usize) -> CheckboxProps {
        let disabled = self.disable_on.as_deref().is_some_and(|expr| {
            self.evaluator
                .test(expr, &ExprContext::row(record.clone(), row_index).to_value())
        });
        CheckboxProps { disabled }
    }
}

/// Expandable rows as the painting widget sees them.
pub struct ExpandableConfig {
    pub expanded_row_keys: Vec<RowKey>,
    /// The configuration minus initial keys.
    pub schema: ExpandableSchema,
    evaluator: Arc<dyn Evaluator>,
}

impl fmt::Debug for ExpandableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpandableConfig")
            .field("expanded_row_keys", &self.expanded_row_keys)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl ExpandableConfig {
    /// `false` when `expandableOn` rules the row out.
    pub fn row_expandable(&self, record: &Value, row_index: usize) -> bool {
        self.schema.expandable_on.as_deref().is_none_or(|expr| {
            self.evaluator
                .test(expr, &ExprContext::row(record.clone(), row_index).to_value())
        })
    }

    pub fn expanded_row_class_name(&self, record: &Value, row_index: usize) -> Option<String> {
        self.schema
            .expanded_row_class_name_expr
            .as_deref()
            .map(|expr| {
                self.evaluator
                    .filter(expr, &ExprContext::row(record.clone(), row_index).to_value())
            })
    }

    /// Body of the expanded row, when the configuration has a `type`.
    pub fn expanded_row_render(&self, record: &Value) -> Option<Node> {
        self.schema.kind.as_ref()?;
        let schema = serde_json::to_value(&self.schema).unwrap_or(Value::Null);
        Some(Node::schema("expandableBody", schema, record.clone()))
    }
}

/// Per-row class name from `rowClassNameExpr`.
pub struct RowClassName {
    expr: String,
    evaluator: Arc<dyn Evaluator>,
}

impl fmt::Debug for RowClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowClassName").field("expr", &self.expr).finish_non_exhaustive()
    }
}

impl RowClassName {
    pub fn resolve(&self, record: &Value, row_index: usize) -> String {
        self.evaluator
            .filter(&self.expr, &ExprContext::row(record.clone(), row_index).to_value())
    }
}

/// Hover actions rendered into each row.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemActionsConfig {
    pub actions: Vec<ItemAction>,
}

impl ItemActionsConfig {
    pub fn render(&self, record: &Value, row_index: usize) -> Node {
        let children = self
            .actions
            .iter()
            .enumerate()
            .map(|(index, action)| {
                let mut schema = action.extra.clone();
                schema.insert("isMenuItem".into(), Value::Bool(true));
                let mut data = record.clone();
                if let Value::Object(fields) = &mut data {
                    fields.insert("rowIndex".into(), Value::from(row_index));
                }
                Node::schema(format!("itemAction/{index}"), Value::Object(schema), data)
            })
            .collect();
        Node::element("Table-itemActions", children)
    }
}

/// A head or foot summary entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SummaryEntry {
    Cell(SummaryCell),
    /// A nested summary row.
    Row(Vec<SummaryCell>),
}

impl SummaryCell {
    fn from_schema(schema: &Value) -> Self {
        Self {
            col_span: schema.get("colSpan").and_then(Value::as_u64),
            fixed: schema.get("fixed").cloned(),
            schema: schema.clone(),
        }
    }

    /// Render the cell in `region` with the rows as its data.
    pub fn render(&self, region: &str, data_source: &[Value]) -> Node {
        Node::schema(region, self.schema.clone(), Value::Array(data_source.to_vec()))
    }
}

/// Build summary entries from a `headSummary` / `footSummary` setting.
///
/// Objects become cells, nested arrays rows of cells. Returns `None` when
/// nothing is left.
pub fn build_summary(key: &str, summary: &Value) -> Option<Vec<SummaryEntry>> {
    let Value::Array(items) = summary else {
        return None;
    };
    let entries: Vec<SummaryEntry> = items
        .iter()
        .filter_map(|item| match item {
            Value::Object(_) => Some(SummaryEntry::Cell(SummaryCell::from_schema(item))),
            Value::Array(row) => Some(SummaryEntry::Row(
                row.iter()
                    .filter(|cell| cell.is_object())
                    .map(SummaryCell::from_schema)
                    .collect(),
            )),
            _ => None,
        })
        .collect();
    tracing::trace!(target: targets::COLUMNS, key, entries = entries.len(), "summary built");
    (!entries.is_empty()).then_some(entries)
}

/// Everything the painting widget needs for one pass.
#[derive(Debug)]
pub struct TableRender {
    pub toolbar: Option<Toolbar>,
    pub heading: Option<Heading>,
    pub title: Vec<Node>,
    pub footer: Vec<Node>,
    pub loading: Vec<Node>,
    pub placeholder: Vec<Node>,
    pub columns: Vec<BuiltColumn>,
    /// Span records of this pass.
    pub spans: SpanResolver,
    pub data_source: Vec<Value>,
    pub row_selection: Option<RowSelectionConfig>,
    pub expandable: Option<ExpandableConfig>,
    pub row_class_name: Option<RowClassName>,
    pub head_summary: Option<Vec<SummaryEntry>>,
    pub foot_summary: Option<Vec<SummaryEntry>>,
    pub item_actions: Option<ItemActionsConfig>,
}

impl TableRender {
    /// Leaf columns in display order.
    pub fn leaf_columns(&self) -> Vec<&BuiltColumn> {
        self.columns.iter().flat_map(BuiltColumn::leaves).collect()
    }
}

impl<S: RowStore> Table<S> {
    /// Build the render descriptors of the current state.
    ///
    /// Returns `None` when item actions are configured but every one is
    /// hidden until hover.
    pub fn render(&self) -> Option<TableRender> {
        let props = self.props();
        let schema = props.schema.clone();
        let store = self.store.read();

        let item_actions = match &schema.item_actions {
            Some(actions) => {
                let actions: Vec<ItemAction> = actions
                    .iter()
                    .filter(|action| !action.hidden_on_hover)
                    .cloned()
                    .collect();
                if actions.is_empty() {
                    tracing::debug!(target: targets::COLUMNS, "all item actions hidden, nothing to render");
                    return None;
                }
                Some(ItemActionsConfig { actions })
            }
            None => None,
        };

        let columns = {
            let _span = PerfSpan::new("build_columns");
            ColumnBuilder::new(self.evaluator.clone())
                .can_access_super_data(schema.can_access_super_data)
                .with_sort_state(&*store)
                .build(&store.filtered_columns())
        };

        let mut toolbar_items: Vec<ToolbarItem> = Vec::new();
        let context = store.context_data(&props.data);
        for (index, action) in schema.actions.iter().flatten().enumerate() {
            let mut button = json!({"type": "button"});
            merge_into(&mut button, action);
            toolbar_items.push(ToolbarItem::Action(Node::schema(
                format!("action/{index}"),
                button,
                context.clone(),
            )));
        }
        if !schema.is_in_crud() && store.togglable() {
            let mut toggler = match &schema.columns_togglable {
                Some(Value::Object(fields)) => Value::Object(fields.clone()),
                _ => json!({}),
            };
            merge_into(&mut toggler, &json!({"type": "column-toggler"}));
            toolbar_items.push(ToolbarItem::ColumnToggler(ColumnToggler {
                schema: toggler,
                columns: store.columns().iter().map(|c| c.pristine().clone()).collect(),
                toggled: store.columns().iter().map(|c| c.is_toggled()).collect(),
            }));
        }
        let toolbar = (!toolbar_items.is_empty()).then(|| Toolbar {
            class_name: "Table-toolbar".into(),
            items: toolbar_items,
        });

        let moved = store.moved();
        let heading = (moved > 0).then(|| Heading {
            class_name: class_names([Some("Table-heading"), schema.heading_class_name.as_deref()]),
            moved,
            message: format!("{moved} rows moved"),
        });

        let row_selection = schema.row_selection.as_ref().map(|selection| {
            let mut rest = selection.clone();
            rest.selected_row_keys = None;
            rest.selected_row_keys_expr = None;
            let selections = rest.selections.take().unwrap_or_default();
            let disable_on = rest.disable_on.take();
            RowSelectionConfig {
                selected_row_keys: store.current_selected_row_keys(),
                schema: rest,
                selections,
                disable_on,
                evaluator: self.evaluator.clone(),
            }
        });

        let expandable = schema.expandable.as_ref().map(|expandable| {
            let mut rest = expandable.clone();
            rest.expanded_row_keys = None;
            rest.expanded_row_keys_expr = None;
            ExpandableConfig {
                expanded_row_keys: store.current_expanded_keys(),
                schema: rest,
                evaluator: self.evaluator.clone(),
            }
        });

        let row_class_name = schema.row_class_name_expr.as_ref().map(|expr| RowClassName {
            expr: expr.clone(),
            evaluator: self.evaluator.clone(),
        });

        let empty = Value::Null;
        Some(TableRender {
            toolbar,
            heading,
            title: render_schema("title", schema.title.as_ref().unwrap_or(&empty), &props.data),
            footer: render_schema("footer", schema.footer.as_ref().unwrap_or(&empty), &props.data),
            loading: render_schema("loading", schema.loading.as_ref().unwrap_or(&empty), &empty),
            placeholder: render_schema(
                "placeholder",
                schema.placeholder.as_ref().unwrap_or(&empty),
                &empty,
            ),
            columns,
            spans: SpanResolver::new(),
            data_source: store.data_source(),
            row_selection,
            expandable,
            row_class_name,
            head_summary: schema
                .head_summary
                .as_ref()
                .and_then(|summary| build_summary("headSummary", summary)),
            foot_summary: schema
                .foot_summary
                .as_ref()
                .and_then(|summary| build_summary("footSummary", summary)),
            item_actions,
        })
    }

    /// Render one body cell of `column`, or `None` for untyped columns the
    /// widget renders itself.
    pub fn render_cell(
        &self,
        column: &BuiltColumn,
        spans: &mut SpanResolver,
        record: &Value,
        row_index: usize,
        col_index: usize,
    ) -> Option<RenderedCell> {
        let cell = column.cell.as_ref()?;
        let store = self.store.read();
        Some(cell.render(&*store, spans, record, row_index, col_index))
    }

    /// Render every body cell of `render`, row by row, using the pass's own
    /// span records.
    pub fn render_body(&self, render: &mut TableRender) -> Vec<Vec<Option<RenderedCell>>> {
        let TableRender {
            columns,
            spans,
            data_source,
            ..
        } = render;
        let leaves: Vec<&BuiltColumn> = columns.iter().flat_map(BuiltColumn::leaves).collect();
        data_source
            .iter()
            .enumerate()
            .map(|(row_index, record)| {
                leaves
                    .iter()
                    .enumerate()
                    .map(|(col_index, column)| {
                        self.render_cell(column, spans, record, row_index, col_index)
                    })
                    .collect()
            })
            .collect()
    }
}
