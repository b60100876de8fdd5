//! Page configuration: backend locations, polling cadence and the line to show.

use std::time::Duration;

use log::warn;

use crate::error::DashboardError;

/// Default base path of the backend routes.
pub const DEFAULT_ROUTES_BASE: &str = "/system/webdev/mes_gateway/cytoscape/routes";
/// Default base path of the state icon assets.
pub const DEFAULT_ASSET_BASE: &str = "/system/webdev/mes_gateway/cytoscape/assets";
/// Delay between the graph becoming ready and the first metrics cycle.
pub const INITIAL_DELAY: Duration = Duration::from_millis(500);
/// Period of the recurring metrics cycle.
pub const POLL_INTERVAL: Duration = Duration::from_secs(300);
/// Upper bound on any single backend request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardConfig {
	pub line_id: String,
	pub routes_base: String,
	pub asset_base: String,
	pub initial_delay: Duration,
	pub poll_interval: Duration,
	pub request_timeout: Duration,
}

impl DashboardConfig {
	/// Config with defaults for everything but the line.
	pub fn new(line_id: impl Into<String>) -> Self {
		Self {
			line_id: line_id.into(),
			routes_base: DEFAULT_ROUTES_BASE.into(),
			asset_base: DEFAULT_ASSET_BASE.into(),
			initial_delay: INITIAL_DELAY,
			poll_interval: POLL_INTERVAL,
			request_timeout: REQUEST_TIMEOUT,
		}
	}

	/// Build the config from a URL query string (with or without the leading `?`).
	///
	/// `lineId` is required. `refresh` and `timeout` override the poll interval
	/// and request timeout in whole seconds.
	pub fn from_query(query: &str) -> Result<Self, DashboardError> {
		let line_id = query_param(query, "lineId")
			.filter(|id| !id.is_empty())
			.ok_or(DashboardError::MissingLineId)?;
		let mut config = Self::new(line_id);
		if let Some(secs) = seconds_param(query, "refresh") {
			config.poll_interval = secs;
		}
		if let Some(secs) = seconds_param(query, "timeout") {
			config.request_timeout = secs;
		}
		Ok(config)
	}

	/// Read the config from the current page location.
	pub fn from_location() -> Result<Self, DashboardError> {
		let window = web_sys::window().ok_or(DashboardError::NoWindow)?;
		let search = window
			.location()
			.search()
			.map_err(DashboardError::from_js)?;
		Self::from_query(&search)
	}

	pub fn model_url(&self) -> String {
		format!(
			"{}/model?lineId={}",
			self.routes_base,
			urlencoding::encode(&self.line_id)
		)
	}

	pub fn metrics_url(&self) -> String {
		format!("{}/metrics", self.routes_base)
	}

	pub fn metric_url(&self, eq_path: &str) -> String {
		format!(
			"{}/metrics?eqPath={}",
			self.routes_base,
			urlencoding::encode(eq_path)
		)
	}

	pub fn save_url(&self) -> String {
		format!("{}/save", self.routes_base)
	}
}

/// First value of `name` in a query string, percent-decoded.
pub fn query_param(query: &str, name: &str) -> Option<String> {
	query
		.trim_start_matches('?')
		.split('&')
		.filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
		.find(|(key, _)| *key == name)
		.map(|(_, value)| {
			let value = value.replace('+', " ");
			urlencoding::decode(&value)
				.map(|v| v.into_owned())
				.unwrap_or(value)
		})
}

fn seconds_param(query: &str, name: &str) -> Option<Duration> {
	let raw = query_param(query, name)?;
	match raw.parse::<u64>() {
		Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
		_ => {
			warn!("Ignoring invalid `{name}` value {raw:?}, using default");
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn line_id_is_required() {
		assert!(matches!(
			DashboardConfig::from_query("?other=1"),
			Err(DashboardError::MissingLineId)
		));
		assert!(matches!(
			DashboardConfig::from_query("?lineId="),
			Err(DashboardError::MissingLineId)
		));
		assert!(matches!(
			DashboardConfig::from_query(""),
			Err(DashboardError::MissingLineId)
		));
	}

	#[test]
	fn parses_line_id_and_keeps_defaults() {
		let config = DashboardConfig::from_query("?lineId=Line%201").unwrap();
		assert_eq!(config.line_id, "Line 1");
		assert_eq!(config.poll_interval, POLL_INTERVAL);
		assert_eq!(config.initial_delay, INITIAL_DELAY);
		assert_eq!(config.request_timeout, REQUEST_TIMEOUT);
	}

	#[test]
	fn overrides_cadence() {
		let config = DashboardConfig::from_query("lineId=7&refresh=60&timeout=5").unwrap();
		assert_eq!(config.poll_interval, Duration::from_secs(60));
		assert_eq!(config.request_timeout, Duration::from_secs(5));
	}

	#[test]
	fn invalid_overrides_fall_back() {
		let config = DashboardConfig::from_query("lineId=7&refresh=soon&timeout=0").unwrap();
		assert_eq!(config.poll_interval, POLL_INTERVAL);
		assert_eq!(config.request_timeout, REQUEST_TIMEOUT);
	}

	#[test]
	fn metric_url_encodes_eq_path() {
		let config = DashboardConfig::new("7");
		assert_eq!(
			config.metric_url("Site/Area 1/Filler"),
			format!("{DEFAULT_ROUTES_BASE}/metrics?eqPath=Site%2FArea%201%2FFiller")
		);
		assert_eq!(config.model_url(), format!("{DEFAULT_ROUTES_BASE}/model?lineId=7"));
	}
}
