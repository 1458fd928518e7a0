use leptos::prelude::*;
use web_sys::Event;

use crate::components::topology_canvas::TopologyCanvas;
use crate::graph::{FilterCriteria, GraphStore, load_topology};

const SAMPLE_TOPOLOGY: &str = include_str!("../../assets/sample_topology.json");

fn load_sample(store: &mut GraphStore) {
	store.set_loading(true);
	match load_topology(SAMPLE_TOPOLOGY) {
		Ok(graph) => {
			store.load(graph);
			store.set_loading(false);
		}
		Err(err) => store.set_error(Some(err.to_string())),
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let store = RwSignal::new(GraphStore::new());
	store.update(load_sample);

	let on_search = move |ev: Event| {
		let search = event_target_value(&ev);
		store.update(|s| {
			s.set_filters(FilterCriteria {
				search: Some(search),
				..Default::default()
			})
		});
	};
	let on_powered_off = move |ev: Event| {
		let show = event_target_checked(&ev);
		store.update(|s| {
			s.set_filters(FilterCriteria {
				show_powered_off: Some(show),
				..Default::default()
			})
		});
	};

	let status = move || {
		store.with(|s| {
			format!(
				"{}/{} nodes, {}/{} links",
				s.visible_nodes().len(),
				s.all_nodes().len(),
				s.visible_edges().len(),
				s.all_edges().len()
			)
		})
	};
	let selected = move || {
		store.with(|s| {
			s.selected_node_id()
				.and_then(|id| s.node(id))
				.map(|n| format!("{} ({})", n.data.name, n.renderer_type()))
		})
	};
	let error = move || {
		store.with(|s| {
			s.error()
				.map(|e| e.to_string())
				.map(|e| view! { <p class="graph-error">{e}</p> })
		})
	};

	view! {
		<div class="fullscreen-graph">
			<TopologyCanvas store=store fullscreen=true />
			<div class="graph-overlay">
				<h1>"Infrastructure Topology"</h1>
				<p class="subtitle">
					"Double-click a node to expand it. Drag cards to reposition. Scroll to zoom."
				</p>
				<div class="graph-controls">
					<input
						type="search"
						placeholder="Search name, description, tags"
						prop:value=move || store.with(|s| s.active_filters().search.clone().unwrap_or_default())
						on:input=on_search
					/>
					<label>
						<input
							type="checkbox"
							prop:checked=move || store.with(|s| s.active_filters().show_powered_off != Some(false))
							on:change=on_powered_off
						/>
						"Show powered-off VMs"
					</label>
					<button on:click=move |_| store.update(|s| s.expand_all())>"Expand all"</button>
					<button on:click=move |_| store.update(|s| s.collapse_all())>"Collapse all"</button>
					<button on:click=move |_| store.update(|s| s.clear_filters())>"Clear filters"</button>
				</div>
				<p class="graph-status">{status}</p>
				<p class="graph-selection">{selected}</p>
				{error}
			</div>
		</div>
	}
}
