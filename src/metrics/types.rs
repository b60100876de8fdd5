use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Operational metrics for one equipment point.
///
/// `null` and absent fields both read as `None`. The modal-only fields
/// (`state`, `a`, `q`, `p`) also read as `None` when they have an unexpected
/// type, so they never decide whether a node gets updated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub oee: Option<f64>,
	#[serde(default, deserialize_with = "lenient")]
	pub state: Option<String>,
	#[serde(default)]
	pub state_color: Option<String>,
	#[serde(default)]
	pub state_icon: Option<String>,
	/// Availability.
	#[serde(default, deserialize_with = "lenient")]
	pub a: Option<f64>,
	/// Quality.
	#[serde(default, deserialize_with = "lenient")]
	pub q: Option<f64>,
	/// Performance.
	#[serde(default, deserialize_with = "lenient")]
	pub p: Option<f64>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned,
{
	let value = Value::deserialize(deserializer)?;
	Ok(serde_json::from_value(value).ok())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqPathKey {
	pub eq_path: String,
}

/// Body of the batch `metrics` request; keys are in graph order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRequest {
	pub eq_paths: Vec<EqPathKey>,
}

impl MetricsRequest {
	pub fn new(eq_paths: impl IntoIterator<Item = String>) -> Self {
		Self {
			eq_paths: eq_paths
				.into_iter()
				.map(|eq_path| EqPathKey { eq_path })
				.collect(),
		}
	}

	pub fn len(&self) -> usize {
		self.eq_paths.len()
	}

	pub fn is_empty(&self) -> bool {
		self.eq_paths.is_empty()
	}

	pub fn key(&self, index: usize) -> Option<&str> {
		self.eq_paths.get(index).map(|k| k.eq_path.as_str())
	}
}

/// Body of the batch `metrics` response.
///
/// The backend wraps every record in a one-element list, so the wire shape is
/// `metrics: [[MetricRecord], ...]`, row `i` answering request key `i`. That
/// wrapping looks like a leftover of the backend's query layer rather than a
/// deliberate contract; rows are kept as raw JSON and decoded one at a time so
/// a single odd row cannot fail the whole response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
	#[serde(default)]
	pub metrics: Option<Vec<Value>>,
}

/// One decoded response row.
#[derive(Clone, Debug, PartialEq)]
pub enum MetricsRow {
	/// First record of the row, carrying an OEE value.
	Ready(MetricRecord),
	/// Row present but without OEE yet (or an empty list / `null`).
	Pending,
	/// Row is not a list, or its first element is not a metric record.
	Malformed,
}

impl MetricsRow {
	/// Decode element 0 of a row. Anything after it is ignored.
	pub fn decode(row: &Value) -> Self {
		if row.is_null() {
			return Self::Pending;
		}
		let Some(items) = row.as_array() else {
			return Self::Malformed;
		};
		match items.first() {
			None | Some(Value::Null) => Self::Pending,
			Some(first) => match MetricRecord::deserialize(first) {
				Ok(record) if record.oee.is_some() => Self::Ready(record),
				Ok(_) => Self::Pending,
				Err(_) => Self::Malformed,
			},
		}
	}
}
