//! Logging facilities for Horizon Grid.
//!
//! Horizon Grid uses the `tracing` crate for instrumentation and never
//! installs a subscriber itself. Applications opt in:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_grid::quick_edit=debug,horizon_grid::sync=trace")
//!     .init();
//! ```

use std::time::Instant;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_grid_core::signal";
    /// Cancelable event dispatch target.
    pub const EVENTS: &str = "horizon_grid::events";
    /// Row/selection/expansion synchronization target.
    pub const SYNC: &str = "horizon_grid::sync";
    /// Column building and span resolution target.
    pub const COLUMNS: &str = "horizon_grid::columns";
    /// Quick-edit and remote save target.
    pub const QUICK_EDIT: &str = "horizon_grid::quick_edit";
    /// Selection and selection preset target.
    pub const SELECTION: &str = "horizon_grid::selection";
    /// Action dispatcher target.
    pub const ACTION: &str = "horizon_grid::action";
    /// Row store target.
    pub const STORE: &str = "horizon_grid::store";
    /// HTTP save transport target.
    pub const NET_SAVE: &str = "horizon_grid_net::save";
    /// Timing spans.
    pub const PERF: &str = "horizon_grid::perf";
}

/// A timing guard for profiling grid operations.
///
/// Enters a `tracing` span on creation and logs the elapsed time at `debug`
/// when dropped.
///
/// ```
/// use horizon_grid_core::PerfSpan;
///
/// {
///     let _span = PerfSpan::new("build_columns");
///     // ... work ...
/// } // elapsed time logged here
/// ```
pub struct PerfSpan {
    name: &'static str,
    started: Instant,
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Start timing `name`.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!(target: "horizon_grid::perf", "perf", operation = name);
        Self {
            name,
            started: Instant::now(),
            span: span.entered(),
        }
    }
}

impl Drop for PerfSpan {
    fn drop(&mut self) {
        tracing::debug!(
            target: targets::PERF,
            operation = self.name,
            elapsed_us = self.started.elapsed().as_micros() as u64,
            "operation finished"
        );
    }
}
