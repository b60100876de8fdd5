//! In-memory plant diagram: nodes, edges and the visual state metrics write into.

mod types;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::warn;

pub use types::{
	EdgeData, EdgeElement, NodeData, NodeElement, NodePosition, Position, SaveResult, Topology,
};

/// Graph handle shared by the canvas, the reconciler and the session.
pub type SharedGraph = Rc<RefCell<PlantGraph>>;

pub const COMPOUND_CLASS: &str = "compound";

pub const MIN_NODE_WIDTH: f64 = 100.0;
pub const MIN_NODE_HEIGHT: f64 = 70.0;
pub const NODE_PADDING: f64 = 10.0;
pub const COMPOUND_PADDING: f64 = 10.0;
pub const LINE_HEIGHT: f64 = 22.0;
/// Average advance of a bold 20px glyph.
pub const CHAR_WIDTH: f64 = 11.0;

/// A diagram node.
///
/// Identity, parent and position are fixed from outside the graph; only the
/// label, fill color and icon can be written by callers.
#[derive(Clone, Debug, PartialEq)]
pub struct PlantNode {
	id: String,
	label: String,
	original_label: String,
	parent: Option<String>,
	eq_path: Option<String>,
	line_id: Option<String>,
	classes: Vec<String>,
	compound: bool,
	x: f64,
	y: f64,
	fill_color: Option<String>,
	icon: Option<String>,
}

impl PlantNode {
	fn from_element(element: &NodeElement) -> Self {
		let data = &element.data;
		let label = data.label.clone().unwrap_or_default();
		let position = element.position.clone().unwrap_or_default();
		Self {
			id: data.id.clone(),
			original_label: data.original_label.clone().unwrap_or_else(|| label.clone()),
			label,
			parent: data.parent.clone().filter(|p| !p.is_empty()),
			eq_path: data.eq_path.clone(),
			line_id: data.line_id.clone(),
			compound: element.classes.iter().any(|c| c == COMPOUND_CLASS),
			classes: element.classes.clone(),
			x: position.x,
			y: position.y,
			fill_color: None,
			icon: None,
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	/// Label as loaded, before any metric was written into it.
	pub fn original_label(&self) -> &str {
		&self.original_label
	}

	pub fn parent(&self) -> Option<&str> {
		self.parent.as_deref()
	}

	/// Metrics key, if the node has a non-empty one.
	pub fn eq_path(&self) -> Option<&str> {
		self.eq_path.as_deref().filter(|p| !p.is_empty())
	}

	pub fn is_eligible(&self) -> bool {
		self.eq_path().is_some()
	}

	pub fn is_compound(&self) -> bool {
		self.compound
	}

	pub fn position(&self) -> (f64, f64) {
		(self.x, self.y)
	}

	pub fn fill_color(&self) -> Option<&str> {
		self.fill_color.as_deref()
	}

	pub fn icon(&self) -> Option<&str> {
		self.icon.as_deref()
	}

	pub fn set_label(&mut self, label: String) {
		self.label = label;
	}

	pub fn set_fill_color(&mut self, color: String) {
		self.fill_color = Some(color);
	}

	pub fn set_icon(&mut self, path: String) {
		self.icon = Some(path);
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlantEdge {
	pub id: String,
	pub source: usize,
	pub target: usize,
}

/// Axis-aligned node box in graph coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeBox {
	pub cx: f64,
	pub cy: f64,
	pub width: f64,
	pub height: f64,
}

impl NodeBox {
	fn around(cx: f64, cy: f64, width: f64, height: f64) -> Self {
		Self {
			cx,
			cy,
			width,
			height,
		}
	}

	pub fn left(&self) -> f64 {
		self.cx - self.width / 2.0
	}

	pub fn right(&self) -> f64 {
		self.cx + self.width / 2.0
	}

	pub fn top(&self) -> f64 {
		self.cy - self.height / 2.0
	}

	pub fn bottom(&self) -> f64 {
		self.cy + self.height / 2.0
	}

	pub fn contains(&self, x: f64, y: f64) -> bool {
		x >= self.left() && x <= self.right() && y >= self.top() && y <= self.bottom()
	}

	fn union(&self, other: &NodeBox) -> NodeBox {
		let (l, r) = (self.left().min(other.left()), self.right().max(other.right()));
		let (t, b) = (self.top().min(other.top()), self.bottom().max(other.bottom()));
		NodeBox::around((l + r) / 2.0, (t + b) / 2.0, r - l, b - t)
	}

	fn expand(&self, pad: f64) -> NodeBox {
		NodeBox::around(self.cx, self.cy, self.width + 2.0 * pad, self.height + 2.0 * pad)
	}
}

/// Box size needed to show a (possibly multi-line) label.
pub fn label_size(label: &str) -> (f64, f64) {
	let lines = label.split('\n');
	let (count, longest) = lines.fold((0usize, 0usize), |(n, w), line| {
		(n + 1, w.max(line.chars().count()))
	});
	(
		(longest as f64 * CHAR_WIDTH + 2.0 * NODE_PADDING).max(MIN_NODE_WIDTH),
		(count as f64 * LINE_HEIGHT + 2.0 * NODE_PADDING).max(MIN_NODE_HEIGHT),
	)
}

#[derive(Debug, Default)]
pub struct PlantGraph {
	nodes: Vec<PlantNode>,
	edges: Vec<PlantEdge>,
	index: HashMap<String, usize>,
	children: Vec<Vec<usize>>,
	boxes: Vec<NodeBox>,
	style_generation: u64,
}

impl PlantGraph {
	/// Build the graph from a topology. Nodes come first, then areas, matching
	/// the order the elements are listed in.
	pub fn from_topology(topology: &Topology) -> Self {
		let mut graph = PlantGraph::default();

		for element in topology.nodes.iter().chain(&topology.areas) {
			if graph.index.contains_key(&element.data.id) {
				warn!("Duplicate node id {:?} ignored", element.data.id);
				continue;
			}
			graph
				.index
				.insert(element.data.id.clone(), graph.nodes.len());
			graph.nodes.push(PlantNode::from_element(element));
		}

		for edge in &topology.edges {
			match (
				graph.index.get(&edge.data.source),
				graph.index.get(&edge.data.target),
			) {
				(Some(&source), Some(&target)) => graph.edges.push(PlantEdge {
					id: edge.data.id.clone(),
					source,
					target,
				}),
				_ => warn!("Edge {:?} references an unknown node", edge.data.id),
			}
		}

		graph.children = vec![Vec::new(); graph.nodes.len()];
		for (idx, node) in graph.nodes.iter().enumerate() {
			if let Some(&parent) = node.parent().and_then(|p| graph.index.get(p)) {
				if parent != idx {
					graph.children[parent].push(idx);
				}
			}
		}
		for idx in 0..graph.nodes.len() {
			if !graph.children[idx].is_empty() {
				graph.nodes[idx].compound = true;
			}
		}

		graph.refresh_style();
		graph
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn nodes(&self) -> &[PlantNode] {
		&self.nodes
	}

	pub fn edges(&self) -> &[PlantEdge] {
		&self.edges
	}

	pub fn node(&self, id: &str) -> Option<&PlantNode> {
		self.index.get(id).map(|&idx| &self.nodes[idx])
	}

	pub fn node_index(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Metrics keys of every eligible node, in graph order.
	pub fn eligible_eq_paths(&self) -> Vec<String> {
		self.nodes
			.iter()
			.filter_map(|n| n.eq_path().map(str::to_owned))
			.collect()
	}

	/// First node currently carrying `eq_path`.
	pub fn node_by_eq_path_mut(&mut self, eq_path: &str) -> Option<&mut PlantNode> {
		self.nodes
			.iter_mut()
			.find(|n| n.eq_path.as_deref() == Some(eq_path))
	}

	/// Recompute every node's box from its current label and bump the style
	/// generation so the canvas redraws once.
	pub fn refresh_style(&mut self) {
		self.refresh_layout();
		self.style_generation += 1;
	}

	pub fn style_generation(&self) -> u64 {
		self.style_generation
	}

	pub fn node_box(&self, idx: usize) -> NodeBox {
		self.boxes.get(idx).copied().unwrap_or_default()
	}

	fn refresh_layout(&mut self) {
		let mut boxes = vec![None; self.nodes.len()];
		for idx in 0..self.nodes.len() {
			self.compute_box(idx, &mut boxes, 0);
		}
		self.boxes = boxes.into_iter().map(Option::unwrap_or_default).collect();
	}

	fn compute_box(&self, idx: usize, boxes: &mut [Option<NodeBox>], depth: usize) -> NodeBox {
		if let Some(b) = boxes[idx] {
			return b;
		}
		let node = &self.nodes[idx];
		let children = &self.children[idx];
		let b = if children.is_empty() || depth > self.nodes.len() {
			let (w, h) = if node.compound {
				(MIN_NODE_WIDTH, MIN_NODE_HEIGHT)
			} else {
				label_size(&node.label)
			};
			NodeBox::around(node.x, node.y, w, h)
		} else {
			let mut iter = children.iter();
			let first = iter
				.next()
				.map(|&c| self.compute_box(c, boxes, depth + 1))
				.unwrap_or_default();
			iter.fold(first, |acc, &c| acc.union(&self.compute_box(c, boxes, depth + 1)))
				.expand(COMPOUND_PADDING)
		};
		boxes[idx] = Some(b);
		b
	}

	fn depth(&self, idx: usize) -> usize {
		let mut depth = 0;
		let mut current = idx;
		while let Some(&parent) = self.nodes[current].parent().and_then(|p| self.index.get(p)) {
			depth += 1;
			if depth > self.nodes.len() {
				break;
			}
			current = parent;
		}
		depth
	}

	/// Compound nodes outermost first, then plain nodes in graph order.
	pub fn draw_order(&self) -> Vec<usize> {
		let mut compounds: Vec<usize> = (0..self.nodes.len())
			.filter(|&i| self.nodes[i].compound)
			.collect();
		compounds.sort_by_key(|&i| self.depth(i));
		compounds.extend((0..self.nodes.len()).filter(|&i| !self.nodes[i].compound));
		compounds
	}

	/// Topmost node under a graph-space point.
	pub fn node_at(&self, x: f64, y: f64) -> Option<usize> {
		self.draw_order()
			.into_iter()
			.rev()
			.find(|&i| self.node_box(i).contains(x, y))
	}

	/// Move a node, and everything nested in it, by a graph-space delta.
	pub fn move_node(&mut self, idx: usize, dx: f64, dy: f64) {
		let mut stack = vec![idx];
		let mut visited = vec![false; self.nodes.len()];
		while let Some(i) = stack.pop() {
			if std::mem::replace(&mut visited[i], true) {
				continue;
			}
			self.nodes[i].x += dx;
			self.nodes[i].y += dy;
			stack.extend(self.children[i].iter().copied());
		}
		self.refresh_layout();
	}

	/// Bounding box of the whole diagram.
	pub fn bounds(&self) -> Option<NodeBox> {
		let mut iter = self.boxes.iter();
		let first = *iter.next()?;
		Some(iter.fold(first, |acc, b| acc.union(b)))
	}

	/// Current node positions, compound nodes at the center of their children.
	pub fn positions(&self) -> Vec<NodePosition> {
		self.nodes
			.iter()
			.enumerate()
			.map(|(idx, node)| {
				let (x, y) = self.rendered_position(idx);
				NodePosition {
					id: node.id.clone(),
					x,
					y,
				}
			})
			.collect()
	}

	fn rendered_position(&self, idx: usize) -> (f64, f64) {
		if self.children[idx].is_empty() {
			self.nodes[idx].position()
		} else {
			let b = self.node_box(idx);
			(b.cx, b.cy)
		}
	}

	/// Nodes as topology elements, with current label and position.
	pub fn to_elements(&self) -> Vec<NodeElement> {
		self.nodes
			.iter()
			.enumerate()
			.map(|(idx, node)| {
				let (x, y) = self.rendered_position(idx);
				NodeElement {
					data: NodeData {
						id: node.id.clone(),
						label: Some(node.label.clone()),
						parent: node.parent.clone(),
						eq_path: node.eq_path.clone(),
						line_id: node.line_id.clone(),
						original_label: None,
					},
					position: Some(Position { x, y }),
					classes: node.classes.clone(),
				}
			})
			.collect()
	}

	/// Edges as topology elements.
	pub fn to_edge_elements(&self) -> Vec<EdgeElement> {
		self.edges
			.iter()
			.map(|edge| EdgeElement {
				data: EdgeData {
					id: edge.id.clone(),
					source: self.nodes[edge.source].id.clone(),
					target: self.nodes[edge.target].id.clone(),
				},
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn element(id: &str, parent: Option<&str>, eq_path: Option<&str>, x: f64, y: f64) -> NodeElement {
		NodeElement {
			data: NodeData {
				id: id.into(),
				label: Some(format!("{id} label")),
				parent: parent.map(Into::into),
				eq_path: eq_path.map(Into::into),
				..NodeData::default()
			},
			position: Some(Position { x, y }),
			classes: Vec::new(),
		}
	}

	fn sample() -> PlantGraph {
		let mut area = element("area", None, None, 0.0, 0.0);
		area.classes.push(COMPOUND_CLASS.into());
		PlantGraph::from_topology(&Topology {
			nodes: vec![
				element("filler", None, Some("Site/Filler"), 500.0, 0.0),
				element("wicker1", Some("area"), Some("Site/Wicker1"), 0.0, -50.0),
				element("wicker2", Some("area"), Some(""), 0.0, 50.0),
			],
			edges: vec![
				EdgeElement {
					data: EdgeData {
						id: "e1".into(),
						source: "area".into(),
						target: "filler".into(),
					},
				},
				EdgeElement {
					data: EdgeData {
						id: "dangling".into(),
						source: "area".into(),
						target: "nowhere".into(),
					},
				},
			],
			areas: vec![area],
		})
	}

	#[test]
	fn loads_nodes_then_areas() {
		let graph = sample();
		let ids: Vec<_> = graph.nodes().iter().map(PlantNode::id).collect();
		assert_eq!(ids, ["filler", "wicker1", "wicker2", "area"]);
		assert_eq!(graph.edges().len(), 1);
		assert!(graph.node("area").unwrap().is_compound());
		assert!(!graph.node("filler").unwrap().is_compound());
	}

	#[test]
	fn empty_eq_path_is_not_eligible() {
		let graph = sample();
		assert_eq!(graph.eligible_eq_paths(), ["Site/Filler", "Site/Wicker1"]);
		assert!(!graph.node("wicker2").unwrap().is_eligible());
	}

	#[test]
	fn original_label_defaults_to_label() {
		let graph = sample();
		let node = graph.node("filler").unwrap();
		assert_eq!(node.original_label(), "filler label");

		let mut element = element("x", None, None, 0.0, 0.0);
		element.data.original_label = Some("Original".into());
		let graph = PlantGraph::from_topology(&Topology {
			nodes: vec![element],
			..Topology::default()
		});
		assert_eq!(graph.node("x").unwrap().original_label(), "Original");
	}

	#[test]
	fn compound_box_wraps_children() {
		let graph = sample();
		let area = graph.node_box(graph.node_index("area").unwrap());
		let w1 = graph.node_box(graph.node_index("wicker1").unwrap());
		let w2 = graph.node_box(graph.node_index("wicker2").unwrap());
		assert_eq!(area.top(), w1.top() - COMPOUND_PADDING);
		assert_eq!(area.bottom(), w2.bottom() + COMPOUND_PADDING);
	}

	#[test]
	fn label_change_resizes_only_after_refresh() {
		let mut graph = sample();
		let idx = graph.node_index("filler").unwrap();
		let before = graph.node_box(idx);
		let generation = graph.style_generation();

		graph
			.node_by_eq_path_mut("Site/Filler")
			.unwrap()
			.set_label("A considerably longer label\n\nOEE: 87%".into());
		assert_eq!(graph.node_box(idx), before);

		graph.refresh_style();
		assert!(graph.node_box(idx).width > before.width);
		assert_eq!(graph.node_box(idx).height, 3.0 * LINE_HEIGHT + 2.0 * NODE_PADDING);
		assert_eq!(graph.style_generation(), generation + 1);
	}

	#[test]
	fn hit_test_prefers_children_over_areas() {
		let graph = sample();
		assert_eq!(graph.node_at(0.0, -50.0), graph.node_index("wicker1"));
		let area = graph.node_box(graph.node_index("area").unwrap());
		assert_eq!(graph.node_at(area.left() + 1.0, area.cy), graph.node_index("area"));
		assert_eq!(graph.node_at(-1000.0, -1000.0), None);
	}

	#[test]
	fn moving_an_area_moves_its_children() {
		let mut graph = sample();
		let area = graph.node_index("area").unwrap();
		graph.move_node(area, 10.0, 5.0);
		assert_eq!(graph.node("wicker1").unwrap().position(), (10.0, -45.0));
		assert_eq!(graph.node("filler").unwrap().position(), (500.0, 0.0));

		let positions = graph.positions();
		let area_pos = positions.iter().find(|p| p.id == "area").unwrap();
		assert_eq!((area_pos.x, area_pos.y), (10.0, 5.0));
	}

	#[test]
	fn elements_serialize_with_wire_names() {
		let graph = sample();
		let json = serde_json::to_value(graph.to_elements()).unwrap();
		assert_eq!(json[1]["data"]["parent"], "area");
		assert_eq!(json[1]["data"]["eqPath"], "Site/Wicker1");
		assert_eq!(json[3]["classes"][0], COMPOUND_CLASS);
	}

	#[test]
	fn edges_serialize_with_node_ids() {
		let graph = sample();
		let json = serde_json::to_value(graph.to_edge_elements()).unwrap();
		assert_eq!(
			json,
			serde_json::json!([{"data": {"id": "e1", "source": "area", "target": "filler"}}])
		);
	}
}
