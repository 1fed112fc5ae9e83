//! Cell span bookkeeping for one render pass.
//!
//! Each rendered cell may declare a row span or column span. Cells that fall
//! strictly inside a span declared earlier in the same pass render with a
//! span of `0` on that axis, which the painting widget reads as "this cell
//! does not occupy a grid slot".
//!
//! A [`SpanResolver`] is only meaningful for the pass that created it; row
//! and column indices from different passes cannot be compared.

use serde::Serialize;

/// A span declared by one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    pub row_index: usize,
    pub col_index: usize,
    pub span: usize,
}

impl CellSpan {
    fn covers_row(&self, row_index: usize, col_index: usize) -> bool {
        col_index == self.col_index
            && row_index > self.row_index
            && row_index < self.row_index.saturating_add(self.span)
    }

    fn covers_col(&self, row_index: usize, col_index: usize) -> bool {
        row_index == self.row_index
            && col_index > self.col_index
            && col_index < self.col_index.saturating_add(self.span)
    }
}

/// Span attributes of a rendered cell. `Some(0)` means merged away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_span: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col_span: Option<usize>,
}

impl RenderProps {
    /// `true` if the cell was merged into a neighbour on either axis.
    pub fn is_suppressed(&self) -> bool {
        self.row_span == Some(0) || self.col_span == Some(0)
    }
}

/// Records spans as cells render and suppresses covered cells.
#[derive(Debug, Default)]
pub struct SpanResolver {
    row_spans: Vec<CellSpan>,
    col_spans: Vec<CellSpan>,
}

impl SpanResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the span attributes of the cell at (`row_index`, `col_index`).
    ///
    /// `row_span` and `col_span` are the cell's own evaluated spans, `0`
    /// meaning none. A non-zero span is recorded before coverage is checked,
    /// so a cell covered by an earlier span still records its own.
    pub fn resolve(
        &mut self,
        row_index: usize,
        col_index: usize,
        row_span: usize,
        col_span: usize,
    ) -> RenderProps {
        let mut props = RenderProps::default();

        if row_span > 0 {
            props.row_span = Some(row_span);
            self.row_spans.push(CellSpan {
                row_index,
                col_index,
                span: row_span,
            });
        }
        if col_span > 0 {
            props.col_span = Some(col_span);
            self.col_spans.push(CellSpan {
                row_index,
                col_index,
                span: col_span,
            });
        }

        if self
            .row_spans
            .iter()
            .any(|span| span.covers_row(row_index, col_index))
        {
            props.row_span = Some(0);
        }
        if self
            .col_spans
            .iter()
            .any(|span| span.covers_col(row_index, col_index))
        {
            props.col_span = Some(0);
        }

        props
    }

    /// Spans recorded so far, row axis.
    pub fn row_spans(&self) -> &[CellSpan] {
        &self.row_spans
    }

    /// Spans recorded so far, column axis.
    pub fn col_spans(&self) -> &[CellSpan] {
        &self.col_spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_span_suppresses_covered_cell() {
        let mut spans = SpanResolver::new();

        let first = spans.resolve(0, 1, 2, 0);
        assert_eq!(first.row_span, Some(2));

        let covered = spans.resolve(1, 1, 0, 0);
        assert_eq!(covered.row_span, Some(0));
        assert!(covered.is_suppressed());

        let next = spans.resolve(2, 1, 3, 0);
        assert_eq!(next.row_span, Some(3));
    }

    #[test]
    fn test_other_columns_unaffected() {
        let mut spans = SpanResolver::new();
        spans.resolve(0, 0, 3, 0);
        let other = spans.resolve(1, 1, 0, 0);
        assert_eq!(other, RenderProps::default());
    }

    #[test]
    fn test_col_span_suppression() {
        let mut spans = SpanResolver::new();
        assert_eq!(spans.resolve(0, 0, 0, 3).col_span, Some(3));
        assert_eq!(spans.resolve(0, 1, 0, 0).col_span, Some(0));
        assert_eq!(spans.resolve(0, 2, 0, 0).col_span, Some(0));
        assert_eq!(spans.resolve(0, 3, 0, 0).col_span, None);
        assert_eq!(spans.resolve(1, 1, 0, 0).col_span, None);
    }

    #[test]
    fn test_covered_cell_still_records_its_span() {
        let mut spans = SpanResolver::new();
        spans.resolve(0, 0, 2, 0);
        let covered = spans.resolve(1, 0, 3, 0);
        assert_eq!(covered.row_span, Some(0));
        assert_eq!(spans.row_spans().len(), 2);
        // Row 2 is covered by the span recorded at row 1.
        assert_eq!(spans.resolve(2, 0, 0, 0).row_span, Some(0));
    }

    #[test]
    fn test_huge_spans_cover_the_rest() {
        let mut spans = SpanResolver::new();
        spans.resolve(1, 0, usize::MAX, 0);
        assert_eq!(spans.resolve(2, 0, 0, 0).row_span, Some(0));
        assert_eq!(spans.resolve(usize::MAX - 1, 0, 0, 0).row_span, Some(0));

        spans.resolve(0, 1, 0, usize::MAX);
        assert_eq!(spans.resolve(0, 2, 0, 0).col_span, Some(0));
    }
}
