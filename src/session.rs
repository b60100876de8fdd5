//! Per-page dashboard context.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use leptos::task::spawn_local;
use log::{debug, error, info};

use crate::backend::{Backend, BrowserTimer, HttpBackend, Timer, with_timeout};
use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::graph::{PlantGraph, SaveResult, SharedGraph};
use crate::metrics::{CycleOutcome, MetricRecord, MetricsReconciler};
use crate::schedule::PollSchedule;

/// Everything one page view owns: config, backend, graph, reconciler and timers.
pub struct DashboardSession<B, T> {
	config: DashboardConfig,
	backend: Rc<B>,
	timer: T,
	graph: SharedGraph,
	reconciler: MetricsReconciler<B, T>,
	schedule: RefCell<Option<PollSchedule>>,
}

pub type BrowserSession = DashboardSession<HttpBackend, BrowserTimer>;

impl BrowserSession {
	pub fn for_browser(config: DashboardConfig) -> Rc<Self> {
		let backend = HttpBackend::new(config.clone());
		Rc::new(Self::new(config, backend, BrowserTimer))
	}

	/// Start the metrics timers. Replaces any running schedule.
	pub fn start_polling(self: &Rc<Self>) -> Result<(), DashboardError> {
		let weak: Weak<Self> = Rc::downgrade(self);
		let tick = move || {
			let Some(session) = weak.upgrade() else {
				return;
			};
			spawn_local(async move {
				session.reconcile().await;
			});
		};
		let schedule = PollSchedule::start(self.config.initial_delay, self.config.poll_interval, tick)?;
		info!(
			"Polling metrics every {:?} (first update in {:?})",
			self.config.poll_interval, self.config.initial_delay
		);
		*self.schedule.borrow_mut() = Some(schedule);
		Ok(())
	}

	pub fn stop_polling(&self) {
		self.schedule.borrow_mut().take();
	}
}

impl<B: Backend, T: Timer + Clone> DashboardSession<B, T> {
	pub fn new(config: DashboardConfig, backend: B, timer: T) -> Self {
		let backend = Rc::new(backend);
		let reconciler = MetricsReconciler::new(
			backend.clone(),
			timer.clone(),
			config.request_timeout,
			config.asset_base.clone(),
		);
		Self {
			config,
			backend,
			timer,
			graph: SharedGraph::default(),
			reconciler,
			schedule: RefCell::new(None),
		}
	}
}

impl<B: Backend, T: Timer> DashboardSession<B, T> {
	pub fn config(&self) -> &DashboardConfig {
		&self.config
	}

	pub fn graph(&self) -> &SharedGraph {
		&self.graph
	}

	/// Fetch the line's topology and replace the graph with it.
	pub async fn load_topology(&self) -> Result<(), DashboardError> {
		let topology = with_timeout(
			self.backend.fetch_topology(&self.config.line_id),
			self.timer.sleep(self.config.request_timeout),
			self.config.request_timeout,
		)
		.await?;
		let graph = PlantGraph::from_topology(&topology);
		info!(
			"Loaded line {} with {} nodes ({} with metrics)",
			self.config.line_id,
			graph.len(),
			graph.eligible_eq_paths().len()
		);
		*self.graph.borrow_mut() = graph;
		Ok(())
	}

	pub async fn reconcile(&self) -> CycleOutcome {
		self.reconciler.run_cycle(&self.graph).await
	}

	/// Metrics for the node the user clicked. `None` when the node has no
	/// metrics key or the request failed.
	pub async fn node_metrics(&self, node_id: &str) -> Option<MetricRecord> {
		let eq_path = {
			let graph = self.graph.borrow();
			let node = graph.node(node_id)?;
			match node.eq_path() {
				Some(path) => path.to_owned(),
				None => {
					debug!("Node {node_id:?} has no eqPath, no metrics to show");
					return None;
				}
			}
		};
		let result = with_timeout(
			self.backend.fetch_metric(&eq_path),
			self.timer.sleep(self.config.request_timeout),
			self.config.request_timeout,
		)
		.await;
		match result {
			Ok(record) => Some(record),
			Err(err) => {
				error!("Error fetching metrics: {err}");
				None
			}
		}
	}

	/// Send every node position to the backend.
	pub async fn save_positions(&self) -> Result<SaveResult, DashboardError> {
		let positions = self.graph.borrow().positions();
		let result = with_timeout(
			self.backend.save_positions(&positions),
			self.timer.sleep(self.config.request_timeout),
			self.config.request_timeout,
		)
		.await?;
		if result.success {
			info!("Positions saved successfully: {}", result.message);
		} else {
			error!("Error saving positions: {}", result.message);
		}
		Ok(result)
	}

	/// Log every node as a topology element, pretty-printed.
	pub fn log_positions(&self) {
		match serde_json::to_string_pretty(&self.graph.borrow().to_elements()) {
			Ok(json) => info!("{json}"),
			Err(err) => error!("Could not serialize positions: {err}"),
		}
	}

	/// Log the whole diagram, nodes and edges, pretty-printed.
	pub fn log_graph(&self) {
		let graph = self.graph.borrow();
		let dump = serde_json::json!({
			"nodes": graph.to_elements(),
			"edges": graph.to_edge_elements(),
		});
		match serde_json::to_string_pretty(&dump) {
			Ok(json) => info!("{json}"),
			Err(err) => error!("Could not serialize graph: {err}"),
		}
	}
}
