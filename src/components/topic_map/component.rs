use std::rc::Rc;

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::MouseEvent;

use super::audio::SoundHandle;
use super::controller::{Navigate, TopicMapConfig, TopicMapController};
use super::layout::Viewport;
use super::render::{
	self, EdgeLine, LEFT_FACE_OPACITY, NodeGlyph, RIGHT_FACE_OPACITY, Scene, TOP_FACE_OPACITY,
};
use super::theme::ThemeColors;
use super::types::GraphData;

/// Random per-mount id, used to scope SVG defs between maps on one page.
fn instance_id() -> String {
	format!("topic-map-{:08x}", rand::random::<u32>())
}

/// Monotonic when `Performance` exists, wall clock otherwise.
fn now_ms() -> f64 {
	web_sys::window()
		.and_then(|w| w.performance())
		.map(|p| p.now())
		.unwrap_or_else(js_sys::Date::now)
}

fn navigate_to(slug: &str) {
	let Some(window) = web_sys::window() else {
		return;
	};
	if let Err(e) = window.location().set_href(&format!("/{slug}")) {
		warn!("navigation to /{slug} failed: {e:?}");
	}
}

fn detach_resize(cb: Option<Closure<dyn FnMut()>>) {
	let (Some(cb), Some(window)) = (cb, web_sys::window()) else {
		return;
	};
	let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
}

fn num(v: f64) -> String {
	format!("{v:.2}")
}

fn node_class(n: &NodeGlyph) -> String {
	let mut class = String::from("topic-node");
	if n.center {
		class.push_str(" center");
	}
	if n.active {
		class.push_str(" active");
	}
	class
}

fn edge_class(e: &EdgeLine) -> String {
	let class = if e.highlighted {
		"topic-edge highlighted"
	} else {
		"topic-edge"
	};
	class.to_string()
}

fn glyph<T: Default>(scene: Memo<Scene>, i: usize, f: impl Fn(&NodeGlyph) -> T) -> T {
	scene.with(|s| s.nodes.get(i).map(f).unwrap_or_default())
}

/// Isometric map of topics. Hovering highlights a node and its edges and
/// plays a tick; clicking navigates to the node's page.
#[component]
pub fn TopicMap(
	data: GraphData,
	/// Explicit colors. When absent they are read from the container's
	/// computed style at mount.
	#[prop(optional)]
	theme: Option<ThemeColors>,
	#[prop(optional)] config: TopicMapConfig,
	/// Called with the node slug on click. Defaults to a full page load of `/{slug}`.
	#[prop(optional, into)]
	on_navigate: Option<Callback<String>>,
) -> impl IntoView {
	let container = NodeRef::<leptos::html::Div>::new();
	let instance = instance_id();
	let theme_from_container = theme.is_none();
	let colors = RwSignal::new(theme.unwrap_or_default());
	let viewport = RwSignal::new(Viewport::default());
	let active = RwSignal::new(None::<String>);
	let graph = StoredValue::new(data);

	let navigate: Navigate = match on_navigate {
		Some(cb) => Rc::new(move |slug: &str| cb.run(slug.to_string())),
		None => Rc::new(navigate_to),
	};
	let sound = config.sound_enabled.then(SoundHandle::shared);
	let controller = StoredValue::new_local(TopicMapController::new(sound, navigate));
	let linger = StoredValue::new_local(None::<Timeout>);
	let resize_cb = StoredValue::new_local(None::<Closure<dyn FnMut()>>);
	let linger_ms = config.deactivation_linger_ms;

	let mount_id = instance.clone();
	Effect::new(move |_| {
		let Some(el) = container.get() else {
			return;
		};
		if theme_from_container {
			colors.set(ThemeColors::from_element(&el));
		}

		let measure = move || Viewport::for_host_width(el.get_bounding_client_rect().width());
		viewport.set(measure());

		let cb = Closure::<dyn FnMut()>::new(move || {
			let vp = measure();
			debug!("topic map resized to {:.0}x{:.0} @ {:.3}", vp.width, vp.height, vp.scale);
			viewport.set(vp);
		});
		if let Some(window) = web_sys::window() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
		resize_cb.update_value(|slot| detach_resize(slot.replace(cb)));

		graph.with_value(|g| {
			info!(
				"topic map {mount_id} mounted: {} nodes, {} edges",
				g.nodes.len(),
				g.edges.len()
			)
		});
	});

	on_cleanup(move || {
		resize_cb.update_value(|slot| detach_resize(slot.take()));
		// dropping a gloo Timeout cancels it
		linger.set_value(None);
		controller.update_value(|c| c.teardown());
	});

	let sync_active = move || {
		let current = controller.with_value(|c| c.active().map(str::to_string));
		if active.get_untracked() != current {
			active.set(current);
		}
	};

	let enter = move |id: &str| {
		linger.set_value(None);
		let now = now_ms();
		controller.update_value(|c| {
			c.pointer_enter(id, now);
		});
		sync_active();
	};

	let leave = move || {
		let Some(ticket) = controller.try_update_value(|c| c.pointer_leave()).flatten() else {
			return;
		};
		let timeout = Timeout::new(linger_ms, move || {
			let idle = controller
				.try_update_value(|c| c.deactivation_elapsed(ticket))
				.unwrap_or(false);
			if idle {
				active.set(None);
			}
		});
		linger.set_value(Some(timeout));
	};

	let scene = Memo::new(move |_| {
		graph.with_value(|g| {
			render::scene(
				&viewport.get(),
				&colors.get(),
				g,
				active.get().as_deref(),
				&instance,
			)
		})
	});

	let (pattern_id, edge_count) =
		scene.with_untracked(|s| (s.grid.pattern_id.clone(), s.edges.len()));
	let grid_fill = format!("url(#{pattern_id})");
	let dot_spacing = num(render::DOT_SPACING);
	let dot_center = num(render::DOT_SPACING / 2.0);

	let edges = (0..edge_count)
		.map(|i| {
			let edge = move |f: fn(&EdgeLine) -> String| {
				scene.with(|s| s.edges.get(i).map(f).unwrap_or_default())
			};
			view! {
				<line
					class=move || edge(edge_class)
					x1=move || edge(|e| num(e.x1))
					y1=move || edge(|e| num(e.y1))
					x2=move || edge(|e| num(e.x2))
					y2=move || edge(|e| num(e.y2))
					stroke=move || edge(|e| e.stroke.clone())
					stroke-width=move || edge(|e| num(e.stroke_width))
					stroke-dasharray=move || edge(|e| e.dash.unwrap_or("none").to_string())
					opacity=move || edge(|e| num(e.opacity))
					style="transition: all 0.2s ease;"
				/>
			}
		})
		.collect_view();

	let nodes = graph
		.with_value(|g| g.nodes.clone())
		.into_iter()
		.enumerate()
		.map(|(i, node)| {
			let id = node.id.clone();
			let topic_id = node.id.clone();
			let label = scene.with_untracked(|s| {
				s.nodes.get(i).map(|n| n.label.clone()).unwrap_or_default()
			});
			view! {
				<g
					class=move || glyph(scene, i, node_class)
					data-topic=topic_id
					style="cursor: pointer;"
					opacity=move || glyph(scene, i, |n| num(n.opacity))
					on:mouseenter=move |_: MouseEvent| enter(&id)
					on:mouseleave=move |_: MouseEvent| leave()
					on:click=move |_: MouseEvent| {
							// run after the borrow ends; the host may unmount us
							if let Some(nav) = controller.try_with_value(|c| c.activate(&node)) {
								nav.run();
							}
						}
				>
					<rect
						x=move || glyph(scene, i, |n| num(n.hit.x))
						y=move || glyph(scene, i, |n| num(n.hit.y))
						width=move || glyph(scene, i, |n| num(n.hit.width))
						height=move || glyph(scene, i, |n| num(n.hit.height))
						fill="transparent"
					/>
					<g opacity=move || glyph(scene, i, |n| num(n.block_opacity))>
						<polygon
							points=move || glyph(scene, i, |n| n.faces.left.clone())
							fill=move || glyph(scene, i, |n| n.color.clone())
							fill-opacity={num(LEFT_FACE_OPACITY)}
							stroke=move || glyph(scene, i, |n| n.color.clone())
							stroke-width="1"
							stroke-opacity="0.6"
						/>
						<polygon
							points=move || glyph(scene, i, |n| n.faces.right.clone())
							fill=move || glyph(scene, i, |n| n.color.clone())
							fill-opacity={num(RIGHT_FACE_OPACITY)}
							stroke=move || glyph(scene, i, |n| n.color.clone())
							stroke-width="1"
							stroke-opacity="0.6"
						/>
						<polygon
							points=move || glyph(scene, i, |n| n.faces.top.clone())
							fill=move || glyph(scene, i, |n| n.color.clone())
							fill-opacity={num(TOP_FACE_OPACITY)}
							stroke=move || glyph(scene, i, |n| n.color.clone())
							stroke-width="1.5"
							stroke-opacity="0.9"
						/>
					</g>
					<text
						x=move || glyph(scene, i, |n| num(n.label_x))
						y=move || glyph(scene, i, |n| num(n.label_y))
						text-anchor="middle"
						font-size=move || glyph(scene, i, |n| num(n.font_size))
						font-weight=move || glyph(scene, i, |n| n.font_weight.to_string())
						fill=move || glyph(scene, i, |n| n.label_color.clone())
						style="letter-spacing: 0.1em; transition: fill 0.2s ease;"
					>
						{label}
					</text>
				</g>
			}
		})
		.collect_view();

	view! {
		<div node_ref=container class="topic-map" style="width: 100%;">
			<svg
				viewBox=move || scene.with(|s| format!("0 0 {} {}", num(s.width), num(s.height)))
				width=move || scene.with(|s| num(s.width))
				height=move || scene.with(|s| num(s.height))
				style="display: block; width: 100%; height: auto; font-family: var(--font-mono, monospace);"
			>
				<defs>
					<pattern
						id=pattern_id
						width={dot_spacing.clone()}
						height=dot_spacing
						patternUnits="userSpaceOnUse"
					>
						<circle
							cx={dot_center.clone()}
							cy=dot_center
							r={num(render::DOT_RADIUS)}
							fill=move || scene.with(|s| s.grid.color.clone())
							opacity=move || scene.with(|s| num(s.grid.opacity))
						/>
					</pattern>
				</defs>
				<rect
					width=move || scene.with(|s| num(s.width))
					height=move || scene.with(|s| num(s.height))
					fill=grid_fill
				/>
				{edges}
				{nodes}
			</svg>
		</div>
	}
}
