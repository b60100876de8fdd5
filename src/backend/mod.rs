//! The dashboard's view of the MES gateway routes.

mod http;
mod timer;

use std::future::Future;

pub use http::HttpBackend;
pub use timer::{BrowserTimer, Timer, with_timeout};

use crate::error::DashboardError;
use crate::graph::{NodePosition, SaveResult, Topology};
use crate::metrics::{MetricRecord, MetricsRequest, MetricsResponse};

/// Remote source of topology and metrics.
pub trait Backend {
	/// Initial diagram for a production line.
	fn fetch_topology(
		&self,
		line_id: &str,
	) -> impl Future<Output = Result<Topology, DashboardError>>;

	/// Metrics for every key of `request`, answered positionally.
	fn fetch_metrics(
		&self,
		request: &MetricsRequest,
	) -> impl Future<Output = Result<MetricsResponse, DashboardError>>;

	/// Metrics for a single equipment point.
	fn fetch_metric(
		&self,
		eq_path: &str,
	) -> impl Future<Output = Result<MetricRecord, DashboardError>>;

	fn save_positions(
		&self,
		positions: &[NodePosition],
	) -> impl Future<Output = Result<SaveResult, DashboardError>>;
}
