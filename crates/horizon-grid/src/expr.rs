//! The expression adapter boundary.
//!
//! Spans, initial selection, expansion, row and cell class names are all
//! driven by string expressions evaluated against a small context object.
//! The grid makes no assumption about the expression language beyond it being
//! deterministic, pure and synchronous; the language itself is supplied by
//! the host through an [`Evaluator`].
//!
//! ```
//! use horizon_grid::expr::{Evaluator, ExprContext, FnEvaluator};
//! use serde_json::{json, Value};
//!
//! // A toy language: the expression names a record field to test.
//! let eval = FnEvaluator::new(|expr: &str, ctx: &Value| ctx["record"][expr].clone());
//!
//! let ctx = ExprContext::row(json!({"active": true}), 0);
//! assert!(eval.test("active", &ctx.to_value()));
//! ```

use std::fmt;

use serde_json::{Value, json};

use crate::model::value::{resolve_variable, stringify, truthy};

/// The context an expression sees for one row or cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprContext {
    /// The row's record.
    pub record: Value,
    /// Row index within the current render pass.
    pub row_index: usize,
    /// Column index, for cell-level expressions.
    pub col_index: Option<usize>,
}

impl ExprContext {
    /// Context for a row-level expression.
    pub fn row(record: Value, row_index: usize) -> Self {
        Self {
            record,
            row_index,
            col_index: None,
        }
    }

    /// Context for a cell-level expression.
    pub fn cell(record: Value, row_index: usize, col_index: usize) -> Self {
        Self {
            record,
            row_index,
            col_index: Some(col_index),
        }
    }

    /// The JSON object handed to the evaluator:
    /// `{record, rowIndex}` plus `colIndex` for cells.
    pub fn to_value(&self) -> Value {
        let mut ctx = json!({
            "record": self.record,
            "rowIndex": self.row_index,
        });
        if let (Some(col), Value::Object(map)) = (self.col_index, &mut ctx) {
            map.insert("colIndex".into(), Value::from(col));
        }
        ctx
    }
}

/// Evaluates string expressions against JSON data.
pub trait Evaluator: Send + Sync {
    /// Evaluate `expr` against `data` and return its value.
    fn evaluate(&self, expr: &str, data: &Value) -> Value;

    /// Evaluate `expr` as a boolean condition.
    fn test(&self, expr: &str, data: &Value) -> bool {
        truthy(&self.evaluate(expr, data))
    }

    /// Evaluate `tpl` as a template and return the printed result.
    fn filter(&self, tpl: &str, data: &Value) -> String {
        stringify(&self.evaluate(tpl, data))
    }

    /// Resolve a data source reference with raw coercion: the resolved value
    /// is returned as-is, arrays included.
    fn resolve_source(&self, source: &str, data: &Value) -> Value {
        self.evaluate(source, data)
    }
}

/// An [`Evaluator`] backed by a closure.
pub struct FnEvaluator<F> {
    eval: F,
}

impl<F> FnEvaluator<F>
where
    F: Fn(&str, &Value) -> Value + Send + Sync,
{
    /// Wrap `eval`.
    pub fn new(eval: F) -> Self {
        Self { eval }
    }
}

impl<F> fmt::Debug for FnEvaluator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEvaluator").finish_non_exhaustive()
    }
}

impl<F> Evaluator for FnEvaluator<F>
where
    F: Fn(&str, &Value) -> Value + Send + Sync,
{
    fn evaluate(&self, expr: &str, data: &Value) -> Value {
        (self.eval)(expr, data)
    }
}

/// Returns `true` if `expr` is a single variable reference such as
/// `${items}` or `$items`, with nothing around it.
pub fn is_pure_variable(expr: &str) -> bool {
    let trimmed = expr.trim();
    if let Some(inner) = trimmed.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        return !inner.is_empty() && is_path(inner.trim());
    }
    trimmed
        .strip_prefix('$')
        .is_some_and(|inner| !inner.is_empty() && is_path(inner))
}

fn is_path(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '$' | '&'))
}

/// Minimal evaluator for variable references and string templates.
///
/// - A pure variable (`${rows}`, `$rows`) resolves to the referenced value,
///   unchanged.
/// - A template with `${path}` placeholders interpolates each placeholder.
/// - `true`, `false` and numeric literals evaluate to themselves.
/// - Anything else is returned as a string.
///
/// Hosts with a real expression language supply their own [`Evaluator`];
/// this one covers data source references and fixed literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariableEvaluator;

impl Evaluator for VariableEvaluator {
    fn evaluate(&self, expr: &str, data: &Value) -> Value {
        if is_pure_variable(expr) {
            return resolve_variable(expr, data).cloned().unwrap_or(Value::Null);
        }

        let trimmed = expr.trim();
        match trimmed {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return Value::from(n);
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            return Value::from(n);
        }

        Value::String(interpolate(expr, data))
    }
}

fn interpolate(tpl: &str, data: &Value) -> String {
    let mut out = String::with_capacity(tpl.len());
    let mut rest = tpl;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let path = &after[..end];
                if let Some(value) = resolve_variable(path, data) {
                    out.push_str(&stringify(value));
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
