use std::collections::HashSet;

use infra_topology_canvas::graph::{
	FilterCriteria, GraphStore, NodeData, NodeKind, PowerState, RendererType, TopologyEdge,
	TopologyNode, resolve_visible,
};
use proptest::prelude::*;

const VENDORS: [&str; 3] = ["Dell", "HPE", "Lenovo"];

fn arb_kind() -> impl Strategy<Value = NodeKind> {
	prop::sample::select(NodeKind::ALL.to_vec())
}

fn arb_power_state() -> impl Strategy<Value = PowerState> {
	prop_oneof![
		Just(PowerState::PoweredOn),
		Just(PowerState::PoweredOff),
		Just(PowerState::Suspended),
	]
}

/// Declared types that may disagree with the node's kind.
fn arb_declared_type() -> impl Strategy<Value = RendererType> {
	prop::sample::select(vec![
		RendererType::Vm,
		RendererType::Host,
		RendererType::Cluster,
		RendererType::Datastore,
		RendererType::Declared("appliance".into()),
	])
}

fn arb_node(index: usize) -> impl Strategy<Value = TopologyNode> {
	(
		arb_kind(),
		prop::option::of(prop::sample::select(VENDORS.to_vec())),
		prop::option::of(arb_power_state()),
		prop::option::of(arb_declared_type()),
	)
		.prop_map(move |(kind, vendor, power_state, renderer)| {
			let mut data = NodeData::new(kind, format!("node-{index}"));
			data.vendor = vendor.map(str::to_string);
			data.power_state = power_state;
			let mut node = TopologyNode::new(format!("n{index}"), data);
			node.renderer = renderer;
			node
		})
}

fn is_anchor_kind(kind: NodeKind) -> bool {
	matches!(kind, NodeKind::Cluster | NodeKind::PhysicalHost)
}

fn arb_graph() -> impl Strategy<Value = (Vec<TopologyNode>, Vec<TopologyEdge>)> {
	(1usize..12).prop_flat_map(|n| {
		let nodes: Vec<_> = (0..n).map(arb_node).collect();
		let edges = prop::collection::vec((0..n, 0..n), 0..(n * 2));
		(nodes, edges).prop_map(|(nodes, pairs)| {
			let edges = pairs
				.into_iter()
				.enumerate()
				.map(|(i, (s, t))| TopologyEdge::new(format!("e{i}"), format!("n{s}"), format!("n{t}")))
				.collect();
			(nodes, edges)
		})
	})
}

fn arb_expanded() -> impl Strategy<Value = HashSet<String>> {
	prop::collection::hash_set((0usize..12).prop_map(|i| format!("n{i}")), 0..6)
}

fn arb_filters() -> impl Strategy<Value = FilterCriteria> {
	(
		prop::option::of(prop::collection::vec(arb_kind(), 0..4)),
		prop::option::of(prop::collection::vec(
			prop::sample::select(VENDORS.to_vec()).prop_map(str::to_string),
			0..2,
		)),
		prop::option::of(any::<bool>()),
		prop::option::of(prop::sample::select(vec!["node-1", "NODE", "zzz", ""])),
	)
		.prop_map(|(kinds, vendors, show_powered_off, search)| FilterCriteria {
			kinds,
			vendors,
			show_powered_off,
			search: search.map(str::to_string),
			..Default::default()
		})
}

fn loaded(nodes: Vec<TopologyNode>, edges: Vec<TopologyEdge>) -> GraphStore {
	let mut store = GraphStore::new();
	store.set_graph(nodes, edges);
	store
}

proptest! {
	#[test]
	fn visible_graph_is_a_consistent_subgraph(
		(nodes, edges) in arb_graph(),
		expanded in arb_expanded(),
		filters in arb_filters(),
	) {
		let visible = resolve_visible(&nodes, &edges, &expanded, &filters);
		let ids: HashSet<&str> = visible.nodes.iter().map(|n| n.id.as_str()).collect();
		for node in &visible.nodes {
			prop_assert!(nodes.contains(node));
			prop_assert!(filters.matches(node));
		}
		for edge in &visible.edges {
			prop_assert!(edges.contains(edge));
			prop_assert!(ids.contains(edge.source.as_str()));
			prop_assert!(ids.contains(edge.target.as_str()));
		}
	}

	#[test]
	fn anchors_persist_under_any_expansion(
		(nodes, edges) in arb_graph(),
		expanded in arb_expanded(),
		filters in arb_filters(),
	) {
		prop_assume!(!expanded.is_empty());
		let visible = resolve_visible(&nodes, &edges, &expanded, &filters);
		for node in &nodes {
			let anchor = is_anchor_kind(node.data.kind) || node.renderer_type().is_anchor();
			if anchor && filters.matches(node) {
				prop_assert!(visible.nodes.iter().any(|v| v.id == node.id));
			}
		}
	}

	#[test]
	fn double_toggle_is_identity(
		(nodes, edges) in arb_graph(),
		expanded in arb_expanded(),
		target in 0usize..12,
	) {
		let mut store = loaded(nodes, edges);
		for id in &expanded {
			store.toggle_node_expansion(id);
		}
		let before = store.visible_nodes().to_vec();
		let id = format!("n{target}");
		store.toggle_node_expansion(&id);
		store.toggle_node_expansion(&id);
		prop_assert_eq!(store.visible_nodes(), before.as_slice());
	}

	#[test]
	fn filters_combine_as_a_conjunction(
		(nodes, edges) in arb_graph(),
		kind in arb_kind(),
		vendor in prop::sample::select(VENDORS.to_vec()),
	) {
		let mut stepwise = loaded(nodes.clone(), edges.clone());
		stepwise.set_filters(FilterCriteria { kinds: Some(vec![kind]), ..Default::default() });
		stepwise.set_filters(FilterCriteria { vendors: Some(vec![vendor.into()]), ..Default::default() });

		let mut direct = loaded(nodes, edges);
		direct.set_filters(FilterCriteria {
			kinds: Some(vec![kind]),
			vendors: Some(vec![vendor.into()]),
			..Default::default()
		});

		prop_assert_eq!(stepwise.visible_nodes(), direct.visible_nodes());
		prop_assert_eq!(stepwise.visible_edges(), direct.visible_edges());
	}

	#[test]
	fn kind_patch_to_anchor_keeps_node_visible(
		(nodes, edges) in arb_graph(),
		expanded in arb_expanded(),
		target in 0usize..12,
		kind in prop::sample::select(vec!["cluster", "physical-host"]),
	) {
		prop_assume!(!expanded.is_empty());
		let id = format!("n{target}");
		prop_assume!(nodes.iter().any(|n| n.id == id));
		let mut store = loaded(nodes, edges);
		for expanded_id in &expanded {
			store.toggle_node_expansion(expanded_id);
		}
		prop_assume!(!store.expanded_nodes().is_empty());

		let patch = serde_json::json!({ "kind": kind });
		store.update_node_data(&id, patch.as_object().unwrap());

		let node = store.node(&id).unwrap();
		prop_assert!(node.renderer_type().is_anchor());
		prop_assert!(store.visible_nodes().iter().any(|n| n.id == id));
	}
}
