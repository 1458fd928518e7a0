use std::collections::{HashMap, HashSet};

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{CARD_HEIGHT, CARD_WIDTH, CanvasState};
use crate::graph::{GraphStore, PowerState, RendererType, TopologyNode};

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn category_color(renderer: &RendererType) -> &'static str {
	match renderer {
		RendererType::Cluster => "#9467bd",
		RendererType::Host => "#1f77b4",
		RendererType::Vm => "#2ca02c",
		RendererType::Vswitch => "#ff7f0e",
		RendererType::Portgroup => "#bcbd22",
		RendererType::Datastore => "#8c564b",
		RendererType::Declared(_) | RendererType::Default => "#7f7f7f",
	}
}

pub fn render(state: &CanvasState, store: &GraphStore, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, store, ctx);
	draw_nodes(state, store, ctx);
	ctx.restore();
}

fn draw_edges(state: &CanvasState, store: &GraphStore, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, dash, gap, arrow_size) = (1.5 / k, 8.0 / k, 4.0 / k, 8.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);
	let by_id: HashMap<&str, &TopologyNode> = store
		.visible_nodes()
		.iter()
		.map(|n| (n.id.as_str(), n))
		.collect();

	for edge in store.visible_edges() {
		let (Some(source), Some(target)) = (
			by_id.get(edge.source.as_str()),
			by_id.get(edge.target.as_str()),
		) else {
			continue;
		};
		let (s, d) = (source.position_or_origin(), target.position_or_origin());
		// Bottom centre of the parent card to top centre of the child card
		let (x1, y1) = (s.x + CARD_WIDTH / 2.0, s.y + CARD_HEIGHT);
		let (x2, y2) = (d.x + CARD_WIDTH / 2.0, d.y);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		let is_highlighted = state.is_highlighted(&edge.source) && state.is_highlighted(&edge.target);
		let (edge_alpha, arrow_alpha, width) = if is_highlighted {
			(0.6 + 0.3 * t, 0.8 + 0.1 * t, line_width * (1.0 + 0.3 * t))
		} else {
			(0.6 - 0.45 * t, 0.8 - 0.45 * t, line_width * (1.0 - 0.3 * t))
		};
		let width = if edge.selected { width * 2.0 } else { width };

		ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {})", edge_alpha));
		ctx.set_line_width(width);
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(dash),
			&JsValue::from_f64(gap),
		));
		ctx.set_line_dash_offset(dash_offset);

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2 - ux * arrow_size, y2 - uy * arrow_size);
		ctx.stroke();

		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(&format!("rgba(100, 180, 255, {})", arrow_alpha));
		let (back_x, back_y) = (x2 - ux * arrow_size, y2 - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(x2, y2);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(state: &CanvasState, store: &GraphStore, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);
	let parents: HashSet<&str> = store.all_edges().iter().map(|e| e.source.as_str()).collect();

	for node in store.visible_nodes() {
		let dimmed = has_highlight && !state.is_highlighted(&node.id);
		let alpha = if dimmed { 1.0 - 0.7 * t } else { 1.0 };
		let marker = parents
			.contains(node.id.as_str())
			.then(|| if store.is_expanded(&node.id) { "−" } else { "+" });
		draw_card(node, alpha, marker, k, ctx);

		if node.selected || (state.is_hovered(&node.id) && t > 0.01) {
			let p = node.position_or_origin();
			let pad = 3.0 / k;
			let stroke_alpha = if node.selected { 1.0 } else { 0.7 * t };
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", stroke_alpha));
			ctx.set_line_width(2.0 / k);
			ctx.stroke_rect(p.x - pad, p.y - pad, CARD_WIDTH + 2.0 * pad, CARD_HEIGHT + 2.0 * pad);
		}
	}
}

fn draw_card(
	node: &TopologyNode,
	alpha: f64,
	marker: Option<&str>,
	k: f64,
	ctx: &CanvasRenderingContext2d,
) {
	let p = node.position_or_origin();
	let renderer = node.renderer_type();
	let powered_off = node.data.power_state == Some(PowerState::PoweredOff);

	ctx.set_global_alpha(if powered_off { alpha * 0.5 } else { alpha });
	ctx.set_fill_style_str("#24243e");
	ctx.fill_rect(p.x, p.y, CARD_WIDTH, CARD_HEIGHT);
	ctx.set_fill_style_str(category_color(&renderer));
	ctx.fill_rect(p.x, p.y, 6.0, CARD_HEIGHT);

	let font_px = 14.0 / k.max(0.5);
	ctx.set_fill_style_str("white");
	ctx.set_font(&format!("{}px sans-serif", font_px));
	let _ = ctx.fill_text(&node.data.name, p.x + 16.0, p.y + 26.0);
	ctx.set_fill_style_str("rgba(255, 255, 255, 0.6)");
	ctx.set_font(&format!("{}px sans-serif", font_px * 0.8));
	let subtitle = match &node.data.description {
		Some(description) => format!("{renderer} · {description}"),
		None => renderer.to_string(),
	};
	let _ = ctx.fill_text(&subtitle, p.x + 16.0, p.y + 48.0);

	if let Some(marker) = marker {
		ctx.set_fill_style_str("white");
		ctx.set_font(&format!("{}px sans-serif", font_px * 1.2));
		let _ = ctx.fill_text(marker, p.x + CARD_WIDTH - 22.0, p.y + 26.0);
	}
	ctx.set_global_alpha(1.0);
}
