//! Metrics polling: wire types, node visuals and the reconciliation cycle.

mod reconcile;
mod types;
mod visual;

pub use reconcile::{ApplyReport, CycleOutcome, MetricsReconciler, apply_metrics};
pub use types::{EqPathKey, MetricRecord, MetricsRequest, MetricsResponse, MetricsRow};
pub use visual::{ICON_EXTENSION, icon_asset_path, metric_label};
