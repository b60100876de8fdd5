use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, error, info, warn};

use super::types::{MetricsRequest, MetricsResponse, MetricsRow};
use super::visual::{icon_asset_path, metric_label};
use crate::backend::{Backend, Timer, with_timeout};
use crate::error::DashboardError;
use crate::graph::{PlantGraph, SharedGraph};

/// Per-row tally of one applied response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
	/// Rows written into a node.
	pub applied: usize,
	/// Rows without an OEE value yet.
	pub pending: usize,
	/// Rows that are not a list of metric records.
	pub malformed: usize,
	/// Rows whose node no longer carries the requested key.
	pub missing_nodes: usize,
	/// Rows past the end of the request.
	pub overflow: usize,
}

#[derive(Debug)]
pub enum CycleOutcome {
	/// A previous cycle was still in flight.
	Busy,
	/// No node carries a metrics key; nothing was requested.
	Idle,
	/// The response was written into the graph.
	Applied(ApplyReport),
	/// The request or response failed; no node was touched.
	Failed(DashboardError),
}

/// Write a batch response into the graph.
///
/// Row `i` answers `request` key `i`. Rows apply independently; nodes are
/// looked up by key in the graph as it is now, so a node removed or re-keyed
/// since the request was built is skipped. Ends with one style refresh.
pub fn apply_metrics(
	graph: &mut PlantGraph,
	request: &MetricsRequest,
	response: &MetricsResponse,
	asset_base: &str,
) -> Result<ApplyReport, DashboardError> {
	let rows = match response.metrics.as_deref() {
		Some(rows) if !rows.is_empty() => rows,
		_ => return Err(DashboardError::EmptyMetrics),
	};

	let mut report = ApplyReport::default();
	for (index, row) in rows.iter().enumerate() {
		let Some(eq_path) = request.key(index) else {
			report.overflow += 1;
			continue;
		};
		let record = match MetricsRow::decode(row) {
			MetricsRow::Ready(record) => record,
			MetricsRow::Pending => {
				report.pending += 1;
				continue;
			}
			MetricsRow::Malformed => {
				warn!("Malformed metrics row for {eq_path:?}: {row}");
				report.malformed += 1;
				continue;
			}
		};
		let Some(oee) = record.oee else {
			report.pending += 1;
			continue;
		};
		let Some(node) = graph.node_by_eq_path_mut(eq_path) else {
			report.missing_nodes += 1;
			continue;
		};

		let label = metric_label(&record, node.original_label(), oee);
		node.set_label(label);
		if let Some(color) = record.state_color {
			node.set_fill_color(color);
		}
		if let Some(icon) = record.state_icon.as_deref().filter(|i| !i.is_empty()) {
			node.set_icon(icon_asset_path(asset_base, icon));
		}
		report.applied += 1;
	}

	if report.overflow > 0 {
		warn!(
			"Metrics response has {} rows for {} keys; extra rows ignored",
			rows.len(),
			request.len()
		);
	}
	graph.refresh_style();
	Ok(report)
}

/// Runs metrics cycles against a shared graph.
///
/// Only one cycle is in flight at a time: a cycle started while another is
/// still waiting on the backend returns [`CycleOutcome::Busy`]. The request is
/// bounded by `timeout`, so a hung backend releases the guard.
pub struct MetricsReconciler<B, T> {
	backend: Rc<B>,
	timer: T,
	timeout: Duration,
	asset_base: String,
	in_flight: Cell<bool>,
}

struct InFlight<'a>(&'a Cell<bool>);

impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		self.0.set(false);
	}
}

impl<B: Backend, T: Timer> MetricsReconciler<B, T> {
	pub fn new(backend: Rc<B>, timer: T, timeout: Duration, asset_base: impl Into<String>) -> Self {
		Self {
			backend,
			timer,
			timeout,
			asset_base: asset_base.into(),
			in_flight: Cell::new(false),
		}
	}

	pub fn is_in_flight(&self) -> bool {
		self.in_flight.get()
	}

	/// One reconciliation cycle. Never panics or propagates; the outcome is
	/// logged and returned.
	pub async fn run_cycle(&self, graph: &SharedGraph) -> CycleOutcome {
		if self.in_flight.replace(true) {
			debug!("Metrics update still in flight, skipping this cycle");
			return CycleOutcome::Busy;
		}
		let _guard = InFlight(&self.in_flight);

		let request = MetricsRequest::new(graph.borrow().eligible_eq_paths());
		if request.is_empty() {
			debug!("No valid eqPaths found. Skipping update.");
			return CycleOutcome::Idle;
		}

		let result = match with_timeout(
			self.backend.fetch_metrics(&request),
			self.timer.sleep(self.timeout),
			self.timeout,
		)
		.await
		{
			Ok(response) => apply_metrics(
				&mut graph.borrow_mut(),
				&request,
				&response,
				&self.asset_base,
			),
			Err(err) => Err(err),
		};

		match result {
			Ok(report) => {
				info!(
					"Metrics successfully updated: {} applied, {} pending, {} malformed, {} missing",
					report.applied, report.pending, report.malformed, report.missing_nodes
				);
				CycleOutcome::Applied(report)
			}
			Err(err) => {
				error!("Error fetching metrics: {err}");
				CycleOutcome::Failed(err)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::graph::{NodeData, NodeElement, Position, Topology};

	fn graph_with(keys: &[(&str, Option<&str>)]) -> PlantGraph {
		PlantGraph::from_topology(&Topology {
			nodes: keys
				.iter()
				.enumerate()
				.map(|(i, (id, eq_path))| NodeElement {
					data: NodeData {
						id: (*id).into(),
						label: Some(id.to_uppercase()),
						eq_path: eq_path.map(Into::into),
						..NodeData::default()
					},
					position: Some(Position {
						x: i as f64 * 200.0,
						y: 0.0,
					}),
					classes: Vec::new(),
				})
				.collect(),
			..Topology::default()
		})
	}

	fn response(value: serde_json::Value) -> MetricsResponse {
		serde_json::from_value(value).unwrap()
	}

	#[test]
	fn writes_label_color_and_icon() {
		let mut graph = graph_with(&[("filler", Some("Line/Filler"))]);
		let request = MetricsRequest::new(graph.eligible_eq_paths());
		let report = apply_metrics(
			&mut graph,
			&request,
			&response(json!({"metrics": [[{
				"name": "Filler 1",
				"oee": 72.5,
				"stateColor": "#ff0000",
				"stateIcon": "states/icons/stopped"
			}]]})),
			"/assets",
		)
		.unwrap();

		assert_eq!(report.applied, 1);
		let node = graph.node("filler").unwrap();
		assert_eq!(node.label(), "Filler 1\n\nOEE: 72.5%");
		assert_eq!(node.fill_color(), Some("#ff0000"));
		assert_eq!(node.icon(), Some("/assets/stopped.svg"));
		assert_eq!(node.position(), (0.0, 0.0));
		assert_eq!(node.original_label(), "FILLER");
	}

	#[test]
	fn nameless_metric_uses_original_label_each_time() {
		let mut graph = graph_with(&[("filler", Some("Line/Filler"))]);
		let request = MetricsRequest::new(graph.eligible_eq_paths());
		for oee in [50, 60] {
			apply_metrics(
				&mut graph,
				&request,
				&response(json!({"metrics": [[{"oee": oee, "stateColor": "#00ff00"}]]})),
				"/assets",
			)
			.unwrap();
		}
		let node = graph.node("filler").unwrap();
		assert_eq!(node.label(), "FILLER\n\nOEE: 60%");
		assert_eq!(node.icon(), None);
	}

	#[test]
	fn short_response_leaves_trailing_nodes() {
		let mut graph = graph_with(&[("a", Some("A")), ("b", Some("B")), ("c", Some("C"))]);
		let request = MetricsRequest::new(graph.eligible_eq_paths());
		let report = apply_metrics(
			&mut graph,
			&request,
			&response(json!({"metrics": [[{"oee": 10, "stateColor": "#111111"}]]})),
			"/assets",
		)
		.unwrap();

		assert_eq!(report.applied, 1);
		assert_eq!(graph.node("a").unwrap().fill_color(), Some("#111111"));
		for id in ["b", "c"] {
			let node = graph.node(id).unwrap();
			assert_eq!(node.label(), id.to_uppercase());
			assert_eq!(node.fill_color(), None);
		}
	}

	#[test]
	fn long_response_ignores_extra_rows() {
		let mut graph = graph_with(&[("a", Some("A"))]);
		let request = MetricsRequest::new(graph.eligible_eq_paths());
		let report = apply_metrics(
			&mut graph,
			&request,
			&response(json!({"metrics": [[{"oee": 1}], [{"oee": 2}]]})),
			"/assets",
		)
		.unwrap();
		assert_eq!(report.applied, 1);
		assert_eq!(report.overflow, 1);
		assert_eq!(graph.node("a").unwrap().label(), "A\n\nOEE: 1%");
	}

	#[test]
	fn bad_rows_do_not_abort_the_batch() {
		let mut graph = graph_with(&[("a", Some("A")), ("b", Some("B")), ("c", Some("C"))]);
		let request = MetricsRequest::new(graph.eligible_eq_paths());
		let report = apply_metrics(
			&mut graph,
			&request,
			&response(json!({"metrics": [
				"garbage",
				[{"oee": null, "stateColor": "#222222"}],
				[{"oee": 33, "stateColor": "#333333"}]
			]})),
			"/assets",
		)
		.unwrap();

		assert_eq!(
			report,
			ApplyReport {
				applied: 1,
				pending: 1,
				malformed: 1,
				..ApplyReport::default()
			}
		);
		assert_eq!(graph.node("b").unwrap().fill_color(), None);
		assert_eq!(graph.node("c").unwrap().fill_color(), Some("#333333"));
	}

	#[test]
	fn missing_or_empty_metrics_fail_without_refresh() {
		for body in [json!({}), json!({"metrics": []}), json!({"metrics": null})] {
			let mut graph = graph_with(&[("a", Some("A"))]);
			let generation = graph.style_generation();
			let request = MetricsRequest::new(graph.eligible_eq_paths());
			let result = apply_metrics(&mut graph, &request, &response(body), "/assets");
			assert!(matches!(result, Err(DashboardError::EmptyMetrics)));
			assert_eq!(graph.style_generation(), generation);
		}
	}

	#[test]
	fn refreshes_style_once_per_response() {
		let mut graph = graph_with(&[("a", Some("A")), ("b", Some("B"))]);
		let generation = graph.style_generation();
		let request = MetricsRequest::new(graph.eligible_eq_paths());
		apply_metrics(
			&mut graph,
			&request,
			&response(json!({"metrics": [[{"oee": 1}], [{"oee": 2}]]})),
			"/assets",
		)
		.unwrap();
		assert_eq!(graph.style_generation(), generation + 1);
	}

	#[test]
	fn missing_state_color_keeps_fill() {
		let mut graph = graph_with(&[("pump", Some("Line/Pump"))]);
		if let Some(node) = graph.node_by_eq_path_mut("Line/Pump") {
			node.set_fill_color("#123456".into());
		}
		let request = MetricsRequest::new(graph.eligible_eq_paths());
		let report = apply_metrics(
			&mut graph,
			&request,
			&response(json!({"metrics": [[{"oee": 5, "stateIcon": "x/y"}]]})),
			"/assets",
		)
		.unwrap();

		assert_eq!(report.applied, 1);
		let node = graph.node("pump").unwrap();
		assert_eq!(node.fill_color(), Some("#123456"));
		assert_eq!(node.label(), "PUMP\n\nOEE: 5%");
		assert_eq!(node.icon(), Some("/assets/y.svg"));
	}
}
