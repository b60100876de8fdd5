use std::collections::HashMap;

use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::state::CanvasState;
use crate::graph::{NodeBox, PlantGraph, LINE_HEIGHT};

const BACKGROUND: &str = "#1a1a2e";
const DEFAULT_FILL: &str = "#008a00";
const NODE_BORDER: &str = "#005700";
const HIGHLIGHT_BORDER: &str = "#ffffff";
const COMPOUND_FILL: &str = "rgba(242, 242, 242, 0.5)";
const COMPOUND_BORDER: &str = "#cccccc";
const EDGE_COLOR: &str = "#cccccc";
const NODE_RADIUS: f64 = 20.0;
const EDGE_WIDTH: f64 = 3.0;
const ARROW_SIZE: f64 = 12.0;
const ICON_SIZE: f64 = 20.0;

/// Loaded state icons, keyed by asset path.
#[derive(Default)]
pub struct IconCache {
	images: HashMap<String, HtmlImageElement>,
}

impl IconCache {
	fn get(&mut self, path: &str) -> Option<&HtmlImageElement> {
		if !self.images.contains_key(path) {
			let image = HtmlImageElement::new().ok()?;
			image.set_src(path);
			self.images.insert(path.to_owned(), image);
		}
		self.images.get(path)
	}

	/// True while some icon is still downloading.
	pub fn loading(&self) -> bool {
		self.images.values().any(|image| !image.complete())
	}
}

pub fn render(state: &CanvasState, ctx: &CanvasRenderingContext2d, icons: &mut IconCache) {
	let graph = state.graph.borrow();
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	let order = graph.draw_order();
	for &idx in order.iter().filter(|&&i| graph.nodes()[i].is_compound()) {
		draw_compound(state, &graph, idx, ctx);
	}
	draw_edges(&graph, ctx);
	for &idx in order.iter().filter(|&&i| !graph.nodes()[i].is_compound()) {
		draw_node(state, &graph, idx, ctx, icons);
	}
	ctx.restore();
}

fn round_rect(ctx: &CanvasRenderingContext2d, b: &NodeBox, radius: f64) {
	let r = radius.min(b.width / 2.0).min(b.height / 2.0);
	let (l, t, rt, bt) = (b.left(), b.top(), b.right(), b.bottom());
	ctx.begin_path();
	ctx.move_to(l + r, t);
	let _ = ctx.arc_to(rt, t, rt, bt, r);
	let _ = ctx.arc_to(rt, bt, l, bt, r);
	let _ = ctx.arc_to(l, bt, l, t, r);
	let _ = ctx.arc_to(l, t, rt, t, r);
	ctx.close_path();
}

fn draw_compound(state: &CanvasState, graph: &PlantGraph, idx: usize, ctx: &CanvasRenderingContext2d) {
	let b = graph.node_box(idx);
	round_rect(ctx, &b, NODE_RADIUS / 2.0);
	ctx.set_fill_style_str(COMPOUND_FILL);
	ctx.fill();
	ctx.set_line_width(2.0 / state.transform.k.max(1.0));
	ctx.set_stroke_style_str(if state.is_highlighted(idx) {
		HIGHLIGHT_BORDER
	} else {
		COMPOUND_BORDER
	});
	ctx.stroke();
}

/// Point where the ray from the box center towards `(dx, dy)` leaves the box.
fn border_point(b: &NodeBox, dx: f64, dy: f64) -> (f64, f64) {
	let tx = if dx.abs() > f64::EPSILON { b.width / 2.0 / dx.abs() } else { f64::INFINITY };
	let ty = if dy.abs() > f64::EPSILON { b.height / 2.0 / dy.abs() } else { f64::INFINITY };
	let t = tx.min(ty);
	(b.cx + dx * t, b.cy + dy * t)
}

fn draw_edges(graph: &PlantGraph, ctx: &CanvasRenderingContext2d) {
	ctx.set_stroke_style_str(EDGE_COLOR);
	ctx.set_fill_style_str(EDGE_COLOR);
	ctx.set_line_width(EDGE_WIDTH);

	for edge in graph.edges() {
		let (src, tgt) = (graph.node_box(edge.source), graph.node_box(edge.target));
		let (dx, dy) = (tgt.cx - src.cx, tgt.cy - src.cy);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}
		let (ux, uy) = (dx / dist, dy / dist);
		let (x1, y1) = border_point(&src, ux, uy);
		let (tip_x, tip_y) = border_point(&tgt, -ux, -uy);

		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(tip_x - ux * ARROW_SIZE, tip_y - uy * ARROW_SIZE);
		ctx.stroke();

		let (back_x, back_y) = (tip_x - ux * ARROW_SIZE, tip_y - uy * ARROW_SIZE);
		let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_node(
	state: &CanvasState,
	graph: &PlantGraph,
	idx: usize,
	ctx: &CanvasRenderingContext2d,
	icons: &mut IconCache,
) {
	let node = &graph.nodes()[idx];
	let b = graph.node_box(idx);

	round_rect(ctx, &b, NODE_RADIUS);
	ctx.set_fill_style_str(node.fill_color().unwrap_or(DEFAULT_FILL));
	ctx.fill();
	ctx.set_line_width(if state.is_highlighted(idx) { 3.0 } else { 2.0 });
	ctx.set_stroke_style_str(if state.is_highlighted(idx) {
		HIGHLIGHT_BORDER
	} else {
		NODE_BORDER
	});
	ctx.stroke();

	let icon = match node.icon() {
		Some(path) => icons.get(path),
		None => None,
	};
	if let Some(image) = icon {
		if image.complete() && image.natural_width() > 0 {
			let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
				image,
				b.right() - ICON_SIZE,
				b.top(),
				ICON_SIZE,
				ICON_SIZE,
			);
		}
	}

	let lines: Vec<&str> = node.label().split('\n').collect();
	let first_y = b.cy - (lines.len() as f64 - 1.0) * LINE_HEIGHT / 2.0;
	ctx.set_fill_style_str("white");
	ctx.set_font("bold 20px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	for (i, line) in lines.iter().enumerate() {
		let _ = ctx.fill_text(line, b.cx, first_y + i as f64 * LINE_HEIGHT);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn border_point_hits_the_nearer_side() {
		let b = NodeBox {
			cx: 0.0,
			cy: 0.0,
			width: 100.0,
			height: 70.0,
		};
		assert_eq!(border_point(&b, 1.0, 0.0), (50.0, 0.0));
		assert_eq!(border_point(&b, 0.0, -1.0), (0.0, -35.0));
		let (x, y) = border_point(&b, 1.0, 1.0);
		assert_eq!((x, y), (35.0, 35.0));
	}
}
