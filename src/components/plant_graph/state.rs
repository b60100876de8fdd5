use std::collections::HashSet;

use crate::graph::SharedGraph;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
pub const FIT_PADDING: f64 = 30.0;
/// Pointer travel, in screen pixels, that turns a press into a drag.
pub const DRAG_THRESHOLD: f64 = 4.0;

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub last_gx: f64,
	pub last_gy: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
}

/// View and interaction state of one canvas over the shared graph.
pub struct CanvasState {
	pub graph: SharedGraph,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	drawn_generation: Option<u64>,
	dirty: bool,
}

impl CanvasState {
	pub fn new(graph: SharedGraph, width: f64, height: f64) -> Self {
		let mut state = Self {
			graph,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			drawn_generation: None,
			dirty: true,
		};
		state.fit();
		state
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.graph.borrow().node_at(gx, gy)
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		self.hover.node = node;
		self.hover.neighbors.clear();
		if let Some(idx) = node {
			for edge in self.graph.borrow().edges() {
				if edge.source == idx {
					self.hover.neighbors.insert(edge.target);
				} else if edge.target == idx {
					self.hover.neighbors.insert(edge.source);
				}
			}
		}
		self.dirty = true;
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.hover.node == Some(idx) || self.hover.neighbors.contains(&idx)
	}

	pub fn press(&mut self, x: f64, y: f64) {
		if let Some(idx) = self.node_at_position(x, y) {
			let (gx, gy) = self.screen_to_graph(x, y);
			self.drag = DragState {
				active: true,
				moved: false,
				node_idx: Some(idx),
				start_x: x,
				start_y: y,
				last_gx: gx,
				last_gy: gy,
			};
		} else {
			self.pan = PanState {
				active: true,
				start_x: x,
				start_y: y,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
		}
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		if !self.drag.active {
			let hovered = self.node_at_position(x, y);
			self.set_hover(hovered);
		}

		if self.drag.active {
			let Some(idx) = self.drag.node_idx else {
				return;
			};
			if !self.drag.moved
				&& (x - self.drag.start_x).hypot(y - self.drag.start_y) < DRAG_THRESHOLD
			{
				return;
			}
			self.drag.moved = true;
			let (gx, gy) = self.screen_to_graph(x, y);
			self.graph
				.borrow_mut()
				.move_node(idx, gx - self.drag.last_gx, gy - self.drag.last_gy);
			self.drag.last_gx = gx;
			self.drag.last_gy = gy;
			self.dirty = true;
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
			self.dirty = true;
		}
	}

	/// End a press. Returns the node that was tapped (pressed and released
	/// without dragging), if any.
	pub fn release(&mut self) -> Option<usize> {
		let tapped = if self.drag.active && !self.drag.moved {
			self.drag.node_idx
		} else {
			None
		};
		self.drag = DragState::default();
		self.pan.active = false;
		tapped
	}

	pub fn leave(&mut self) {
		self.drag = DragState::default();
		self.pan.active = false;
		self.set_hover(None);
	}

	/// Zoom by `factor` keeping the screen point `(x, y)` fixed.
	pub fn zoom_at(&mut self, factor: f64, x: f64, y: f64) {
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.dirty = true;
	}

	/// Zoom by `factor`, then center the diagram.
	pub fn zoom_by(&mut self, factor: f64) {
		self.transform.k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		self.center();
	}

	pub fn reset_zoom(&mut self) {
		self.transform.k = 1.0;
		self.center();
	}

	pub fn center(&mut self) {
		let (cx, cy) = self
			.graph
			.borrow()
			.bounds()
			.map(|b| (b.cx, b.cy))
			.unwrap_or_default();
		self.transform.x = self.width / 2.0 - cx * self.transform.k;
		self.transform.y = self.height / 2.0 - cy * self.transform.k;
		self.dirty = true;
	}

	/// Zoom and pan so the whole diagram is visible.
	pub fn fit(&mut self) {
		let Some(bounds) = self.graph.borrow().bounds() else {
			return;
		};
		let (avail_w, avail_h) = (
			(self.width - 2.0 * FIT_PADDING).max(1.0),
			(self.height - 2.0 * FIT_PADDING).max(1.0),
		);
		let k = (avail_w / bounds.width.max(1.0))
			.min(avail_h / bounds.height.max(1.0))
			.clamp(MIN_ZOOM, MAX_ZOOM);
		self.transform.k = k;
		self.center();
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.dirty = true;
	}

	/// Whether the view or the graph's style changed since the last frame.
	/// Clears the flag.
	pub fn take_redraw(&mut self) -> bool {
		let generation = self.graph.borrow().style_generation();
		let stale = self.dirty || self.drawn_generation != Some(generation);
		self.dirty = false;
		self.drawn_generation = Some(generation);
		stale
	}

	pub fn mark_dirty(&mut self) {
		self.dirty = true;
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use crate::graph::{NodeData, NodeElement, PlantGraph, Position, Topology};

	fn state() -> CanvasState {
		let node = |id: &str, x: f64| NodeElement {
			data: NodeData {
				id: id.into(),
				label: Some(id.into()),
				..NodeData::default()
			},
			position: Some(Position { x, y: 0.0 }),
			classes: Vec::new(),
		};
		let graph = PlantGraph::from_topology(&Topology {
			nodes: vec![node("a", 0.0), node("b", 400.0)],
			..Topology::default()
		});
		CanvasState::new(Rc::new(RefCell::new(graph)), 800.0, 600.0)
	}

	fn screen_of(state: &CanvasState, gx: f64, gy: f64) -> (f64, f64) {
		(
			gx * state.transform.k + state.transform.x,
			gy * state.transform.k + state.transform.y,
		)
	}

	#[test]
	fn fit_centers_the_diagram() {
		let state = state();
		let (sx, sy) = screen_of(&state, 200.0, 0.0);
		assert!((sx - 400.0).abs() < 1e-9);
		assert!((sy - 300.0).abs() < 1e-9);
	}

	#[test]
	fn press_and_release_is_a_tap() {
		let mut state = state();
		let (sx, sy) = screen_of(&state, 0.0, 0.0);
		state.press(sx, sy);
		state.pointer_move(sx + 1.0, sy);
		assert_eq!(state.release(), Some(0));
		assert_eq!(state.graph.borrow().nodes()[0].position(), (0.0, 0.0));
	}

	#[test]
	fn drag_moves_node_and_is_not_a_tap() {
		let mut state = state();
		let (sx, sy) = screen_of(&state, 400.0, 0.0);
		state.press(sx, sy);
		state.pointer_move(sx + 50.0, sy);
		assert_eq!(state.release(), None);
		let (x, _) = state.graph.borrow().nodes()[1].position();
		assert!((x - (400.0 + 50.0 / state.transform.k)).abs() < 1e-9);
	}

	#[test]
	fn reset_zoom_restores_unit_scale() {
		let mut state = state();
		state.zoom_by(1.1);
		state.zoom_by(1.1);
		state.reset_zoom();
		assert_eq!(state.transform.k, 1.0);
		let (sx, _) = screen_of(&state, 200.0, 0.0);
		assert!((sx - 400.0).abs() < 1e-9);
	}

	#[test]
	fn redraw_follows_style_generation() {
		let mut state = state();
		assert!(state.take_redraw());
		assert!(!state.take_redraw());
		state.graph.borrow_mut().refresh_style();
		assert!(state.take_redraw());
		assert!(!state.take_redraw());
	}
}
