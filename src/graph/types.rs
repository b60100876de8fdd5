use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parent: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub eq_path: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub line_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub original_label: Option<String>,
}

/// A node or area entry of the topology.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeElement {
	pub data: NodeData,
	#[serde(default)]
	pub position: Option<Position>,
	#[serde(default)]
	pub classes: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
	pub id: String,
	pub source: String,
	pub target: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeElement {
	pub data: EdgeData,
}

/// Initial diagram as served by the `model` route.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
	#[serde(default)]
	pub nodes: Vec<NodeElement>,
	#[serde(default)]
	pub edges: Vec<EdgeElement>,
	#[serde(default)]
	pub areas: Vec<NodeElement>,
}

/// One entry of the `save` request body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
	pub id: String,
	pub x: f64,
	pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveResult {
	pub success: bool,
	#[serde(default)]
	pub message: String,
}
