//! Merged cells across a render pass.

mod common;

use horizon_grid::table::columns::RenderedCell;
use serde_json::json;

use common::mounted;

type SpanGrid = Vec<Vec<(Option<usize>, Option<usize>)>>;

fn spans(body: &[Vec<Option<RenderedCell>>]) -> SpanGrid {
    body.iter()
        .map(|row| {
            row.iter()
                .map(|cell| {
                    cell.as_ref()
                        .map_or((None, None), |cell| (cell.props.row_span, cell.props.col_span))
                })
                .collect()
        })
        .collect()
}

#[test]
fn test_row_span_suppresses_cells_below() {
    let table = mounted(
        json!({
            "columns": [
                {"key": "city", "type": "text", "rowSpanExpr": "${record.span}"},
                {"key": "name", "type": "text"}
            ]
        }),
        vec![
            json!({"city": "Oslo", "name": "Ada", "span": 2}),
            json!({"city": "Oslo", "name": "Grace"}),
            json!({"city": "Rome", "name": "Edsger"}),
        ],
    );

    let mut render = table.render().unwrap();
    let body = table.render_body(&mut render);

    assert_eq!(
        spans(&body),
        vec![
            vec![(Some(2), None), (None, None)],
            vec![(Some(0), None), (None, None)],
            vec![(None, None), (None, None)],
        ]
    );
}

#[test]
fn test_col_span_suppresses_cells_to_the_right() {
    let table = mounted(
        json!({
            "columns": [
                {"key": "a", "type": "text", "colSpanExpr": "${record.wide}"},
                {"key": "b", "type": "text"},
                {"key": "c", "type": "text"}
            ]
        }),
        vec![json!({"a": 1, "b": 2, "c": 3, "wide": 2}), json!({"a": 4, "b": 5, "c": 6})],
    );

    let mut render = table.render().unwrap();
    let body = table.render_body(&mut render);

    let first: Vec<bool> = body[0]
        .iter()
        .map(|cell| cell.as_ref().unwrap().props.is_suppressed())
        .collect();
    assert_eq!(first, vec![false, true, false]);
    assert!(body[1].iter().all(|cell| !cell.as_ref().unwrap().props.is_suppressed()));
}

#[test]
fn test_each_pass_starts_clean() {
    let table = mounted(
        json!({
            "columns": [{"key": "city", "type": "text", "rowSpanExpr": "${record.span}"}]
        }),
        vec![json!({"city": "Oslo", "span": 2}), json!({"city": "Oslo"})],
    );

    let mut first = table.render().unwrap();
    let first_body = table.render_body(&mut first);
    let mut second = table.render().unwrap();
    let second_body = table.render_body(&mut second);

    assert_eq!(spans(&first_body), spans(&second_body));
    assert_eq!(second.spans.row_spans().len(), 1);
}

#[test]
fn test_untyped_columns_render_no_cell() {
    let table = mounted(
        json!({"columns": [{"key": "plain"}, {"key": "typed", "type": "text"}]}),
        vec![json!({"plain": 1, "typed": 2})],
    );

    let mut render = table.render().unwrap();
    let body = table.render_body(&mut render);

    assert!(body[0][0].is_none());
    let typed = body[0][1].as_ref().unwrap();
    assert!(typed.row.is_some());
}

#[test]
fn test_oversized_span_covers_remaining_rows() {
    let table = mounted(
        json!({
            "columns": [{"key": "city", "type": "text", "rowSpanExpr": "${record.span}"}]
        }),
        vec![
            json!({"city": "Oslo"}),
            json!({"city": "Oslo", "span": "1e30"}),
            json!({"city": "Oslo"}),
            json!({"city": "Oslo"}),
        ],
    );

    let mut render = table.render().unwrap();
    let body = table.render_body(&mut render);

    let row_spans: Vec<Option<usize>> = spans(&body).into_iter().map(|row| row[0].0).collect();
    assert_eq!(
        row_spans,
        vec![None, Some(horizon_grid::model::value::MAX_SPAN), Some(0), Some(0)]
    );
}
