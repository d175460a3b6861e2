use std::collections::HashMap;

use log::debug;

use super::layout::Viewport;
use super::theme::{MUTED_LABEL, ThemeColors};
use super::types::GraphData;

pub const ACTIVE_GROWTH: f64 = 1.15;
/// Block height relative to its edge length.
pub const BLOCK_HEIGHT: f64 = 0.6;
pub const LABEL_OFFSET: f64 = 18.0;
pub const DOT_SPACING: f64 = 24.0;
pub const DOT_RADIUS: f64 = 0.8;
pub const HIT_PADDING: f64 = 8.0;
pub const HIT_MIN_WIDTH: f64 = 56.0;

const EDGE_DASH: &str = "4 4";
const EDGE_OPACITY: f64 = 0.6;
const EDGE_HIGHLIGHT_OPACITY: f64 = 0.9;
const EDGE_DIMMED_OPACITY: f64 = 0.2;
const NODE_DIMMED_OPACITY: f64 = 0.4;
const BLOCK_IDLE_OPACITY: f64 = 0.8;

/// Face fill opacities; the top face reads as lit.
pub const TOP_FACE_OPACITY: f64 = 0.9;
pub const LEFT_FACE_OPACITY: f64 = 0.7;
pub const RIGHT_FACE_OPACITY: f64 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub struct DotGrid {
	pub pattern_id: String,
	pub spacing: f64,
	pub radius: f64,
	pub color: String,
	pub opacity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeLine {
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
	pub stroke: String,
	pub stroke_width: f64,
	/// `None` draws solid.
	pub dash: Option<&'static str>,
	pub opacity: f64,
	pub highlighted: bool,
}

/// SVG `points` strings for the three visible faces of a block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockFaces {
	pub top: String,
	pub left: String,
	pub right: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeGlyph {
	pub id: String,
	pub label: String,
	pub cx: f64,
	pub cy: f64,
	pub size: f64,
	pub color: String,
	pub block_opacity: f64,
	/// Opacity of the whole glyph group, dimmed while another node is active.
	pub opacity: f64,
	pub faces: BlockFaces,
	pub label_x: f64,
	pub label_y: f64,
	pub label_color: String,
	pub font_size: f64,
	pub font_weight: u16,
	pub hit: Rect,
	pub active: bool,
	pub center: bool,
}

/// Everything needed to paint one frame, in paint order.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
	pub width: f64,
	pub height: f64,
	pub grid: DotGrid,
	pub edges: Vec<EdgeLine>,
	pub nodes: Vec<NodeGlyph>,
}

fn fmt_points(points: &[(f64, f64)]) -> String {
	points
		.iter()
		.map(|(x, y)| format!("{x:.2},{y:.2}"))
		.collect::<Vec<_>>()
		.join(" ")
}

/// Faces of a block whose bottom vertex sits at `cy + w/2`.
pub fn block_faces(cx: f64, cy: f64, size: f64) -> BlockFaces {
	let (w, h) = (size, size * BLOCK_HEIGHT);
	let top_y = cy - h;
	let rim_y = top_y + w / 4.0;
	let inner = (cx, top_y + w / 2.0);
	let bottom = (cx, cy + w / 2.0);
	BlockFaces {
		top: fmt_points(&[(cx, top_y), (cx + w / 2.0, rim_y), inner, (cx - w / 2.0, rim_y)]),
		right: fmt_points(&[
			inner,
			(cx + w / 2.0, rim_y),
			(cx + w / 2.0, cy + w / 4.0),
			bottom,
		]),
		left: fmt_points(&[
			inner,
			(cx - w / 2.0, rim_y),
			(cx - w / 2.0, cy + w / 4.0),
			bottom,
		]),
	}
}

/// Target area around a glyph and its label.
pub fn hit_region(cx: f64, cy: f64, size: f64, label_y: f64) -> Rect {
	let width = size.max(HIT_MIN_WIDTH) + 2.0 * HIT_PADDING;
	let top = cy - size * BLOCK_HEIGHT - HIT_PADDING;
	let bottom = label_y + HIT_PADDING;
	Rect {
		x: cx - width / 2.0,
		y: top,
		width,
		height: bottom - top,
	}
}

/// Build the frame for the current viewport, theme, and active node.
/// Edges with an unknown endpoint are left out.
pub fn scene(
	viewport: &Viewport,
	theme: &ThemeColors,
	data: &GraphData,
	active: Option<&str>,
	instance_id: &str,
) -> Scene {
	let positions: HashMap<&str, (f64, f64)> = data
		.nodes
		.iter()
		.map(|n| (n.id.as_str(), viewport.to_screen(n.x, n.y)))
		.collect();
	let center_id = data.center().map(|n| n.id.as_str());

	let edges = data
		.edges
		.iter()
		.filter_map(|edge| {
			let (Some(&(x1, y1)), Some(&(x2, y2))) = (
				positions.get(edge.source.as_str()),
				positions.get(edge.target.as_str()),
			) else {
				debug!("skipping edge {} -> {}: unknown node", edge.source, edge.target);
				return None;
			};
			let highlighted = active.is_some_and(|a| a == edge.source || a == edge.target);
			let (stroke, stroke_width, dash, opacity) = if highlighted {
				(theme.accent.clone(), 2.0, None, EDGE_HIGHLIGHT_OPACITY)
			} else if active.is_some() {
				(theme.surface.clone(), 1.0, Some(EDGE_DASH), EDGE_DIMMED_OPACITY)
			} else {
				(theme.surface.clone(), 1.0, Some(EDGE_DASH), EDGE_OPACITY)
			};
			Some(EdgeLine {
				x1,
				y1,
				x2,
				y2,
				stroke,
				stroke_width,
				dash,
				opacity,
				highlighted,
			})
		})
		.collect();

	let nodes = data
		.nodes
		.iter()
		.map(|node| {
			let (cx, cy) = viewport.to_screen(node.x, node.y);
			let is_active = active == Some(node.id.as_str());
			let is_center = data.is_center(&node.id);
			let emphasized = is_active || is_center;
			let size = node.size * viewport.scale * if is_active { ACTIVE_GROWTH } else { 1.0 };
			let label_y = cy + size * 0.5 + LABEL_OFFSET;
			// Dim bystanders only; the center stays lit, and hovering it dims nothing.
			let dimmed = active.is_some_and(|a| Some(a) != center_id) && !emphasized;

			NodeGlyph {
				id: node.id.clone(),
				label: node.label.to_uppercase(),
				cx,
				cy,
				size,
				color: if emphasized {
					theme.accent.clone()
				} else {
					theme.surface.clone()
				},
				block_opacity: if emphasized { 1.0 } else { BLOCK_IDLE_OPACITY },
				opacity: if dimmed { NODE_DIMMED_OPACITY } else { 1.0 },
				faces: block_faces(cx, cy, size),
				label_x: cx,
				label_y,
				label_color: if emphasized {
					theme.accent.clone()
				} else {
					MUTED_LABEL.to_string()
				},
				font_size: if is_center { 11.0 } else { 10.0 },
				font_weight: if is_center { 700 } else { 400 },
				hit: hit_region(cx, cy, size, label_y),
				active: is_active,
				center: is_center,
			}
		})
		.collect();

	Scene {
		width: viewport.width,
		height: viewport.height,
		grid: DotGrid {
			pattern_id: format!("{instance_id}-dots"),
			spacing: DOT_SPACING,
			radius: DOT_RADIUS,
			color: theme.surface.clone(),
			opacity: 0.5,
		},
		edges,
		nodes,
	}
}
