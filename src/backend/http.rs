use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use super::Backend;
use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::graph::{NodePosition, SaveResult, Topology};
use crate::metrics::{MetricRecord, MetricsRequest, MetricsResponse};

/// `fetch`-based client for the gateway routes.
#[derive(Clone, Debug)]
pub struct HttpBackend {
	config: DashboardConfig,
}

impl HttpBackend {
	pub fn new(config: DashboardConfig) -> Self {
		Self { config }
	}

	async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DashboardError> {
		let init = RequestInit::new();
		init.set_method("GET");
		self.send(url, &init).await
	}

	async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, DashboardError>
	where
		B: Serialize + ?Sized,
		T: DeserializeOwned,
	{
		let body = serde_json::to_string(body).map_err(|source| DashboardError::Encode {
			url: url.to_owned(),
			source,
		})?;
		let init = RequestInit::new();
		init.set_method("POST");
		init.set_body(&JsValue::from_str(&body));
		self.send(url, &init).await
	}

	async fn send<T: DeserializeOwned>(
		&self,
		url: &str,
		init: &RequestInit,
	) -> Result<T, DashboardError> {
		let window = web_sys::window().ok_or(DashboardError::NoWindow)?;
		let request = Request::new_with_str_and_init(url, init).map_err(DashboardError::from_js)?;
		request
			.headers()
			.set("Content-Type", "application/json")
			.map_err(DashboardError::from_js)?;

		debug!("{} {url}", request.method());
		let response: Response = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(DashboardError::from_js)?
			.dyn_into()
			.map_err(DashboardError::from_js)?;
		if !response.ok() {
			return Err(DashboardError::Status {
				status: response.status(),
				url: url.to_owned(),
			});
		}

		let text = JsFuture::from(response.text().map_err(DashboardError::from_js)?)
			.await
			.map_err(DashboardError::from_js)?
			.as_string()
			.unwrap_or_default();
		serde_json::from_str(&text).map_err(|source| DashboardError::Decode {
			url: url.to_owned(),
			source,
		})
	}
}

impl Backend for HttpBackend {
	async fn fetch_topology(&self, line_id: &str) -> Result<Topology, DashboardError> {
		let mut config = self.config.clone();
		config.line_id = line_id.to_owned();
		self.get_json(&config.model_url()).await
	}

	async fn fetch_metrics(
		&self,
		request: &MetricsRequest,
	) -> Result<MetricsResponse, DashboardError> {
		self.post_json(&self.config.metrics_url(), request).await
	}

	async fn fetch_metric(&self, eq_path: &str) -> Result<MetricRecord, DashboardError> {
		self.get_json(&self.config.metric_url(eq_path)).await
	}

	async fn save_positions(
		&self,
		positions: &[NodePosition],
	) -> Result<SaveResult, DashboardError> {
		self.post_json(&self.config.save_url(), positions).await
	}
}
