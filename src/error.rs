//! Error type shared by the dashboard's fetch, reconcile and setup paths.

use std::time::Duration;

use wasm_bindgen::{JsCast, JsValue};

/// Everything that can go wrong while talking to the backend or the browser.
///
/// None of these are fatal: callers log them and keep the previous graph state.
#[derive(thiserror::Error, Debug)]
pub enum DashboardError {
	/// The page URL carries no `lineId` query parameter.
	#[error("lineId query parameter is missing")]
	MissingLineId,

	/// No global `window` (not running in a browser).
	#[error("no browser window available")]
	NoWindow,

	/// A browser API or `fetch` call rejected.
	#[error("browser call failed: {0}")]
	Js(String),

	/// The server answered with a non-success status.
	#[error("{url} returned HTTP {status}")]
	Status { status: u16, url: String },

	/// The body did not match the expected JSON shape.
	#[error("invalid response from {url}: {source}")]
	Decode {
		url: String,
		#[source]
		source: serde_json::Error,
	},

	/// A request body could not be serialized.
	#[error("could not encode request for {url}: {source}")]
	Encode {
		url: String,
		#[source]
		source: serde_json::Error,
	},

	/// The batch response carried no metrics list, or an empty one.
	#[error("error or empty metrics returned")]
	EmptyMetrics,

	/// The request did not settle within the configured bound.
	#[error("request timed out after {0:?}")]
	Timeout(Duration),
}

impl DashboardError {
	/// Wrap a rejected promise or thrown JS exception.
	pub fn from_js(value: JsValue) -> Self {
		let message = value
			.as_string()
			.or_else(|| value.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
			.or_else(|| {
				js_sys::JSON::stringify(&value)
					.ok()
					.and_then(|s| s.as_string())
			})
			.unwrap_or_else(|| "unknown error".into());
		Self::Js(message)
	}
}
