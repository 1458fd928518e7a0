//! Derives the visible subgraph from filters and expansion state.
//!
//! Filtering always runs first and bounds everything after it: a node that
//! fails a filter can never be revealed by expanding one of its parents.

use std::collections::{HashMap, HashSet, VecDeque};

use super::filter::FilterCriteria;
use super::model::{TopologyEdge, TopologyNode};

/// The nodes and edges the canvas should draw, in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisibleGraph {
	pub nodes: Vec<TopologyNode>,
	pub edges: Vec<TopologyEdge>,
}

/// Computes the visible subgraph.
///
/// With an empty `expanded` set every filtered node is shown. Otherwise
/// anchors (clusters and hosts), the expanded nodes themselves and every
/// node reachable from them through a chain of expanded nodes are shown.
pub fn resolve_visible(
	all_nodes: &[TopologyNode],
	all_edges: &[TopologyEdge],
	expanded: &HashSet<String>,
	filters: &FilterCriteria,
) -> VisibleGraph {
	let filtered: HashSet<&str> = all_nodes
		.iter()
		.filter(|node| filters.matches(node))
		.map(|node| node.id.as_str())
		.collect();

	let visible_ids = if expanded.is_empty() {
		filtered
	} else {
		expand(all_nodes, all_edges, expanded, &filtered)
	};

	let nodes = all_nodes
		.iter()
		.filter(|node| visible_ids.contains(node.id.as_str()))
		.cloned()
		.collect();
	let edges = all_edges
		.iter()
		.filter(|edge| {
			!edge.is_self_loop()
				&& visible_ids.contains(edge.source.as_str())
				&& visible_ids.contains(edge.target.as_str())
		})
		.cloned()
		.collect();

	VisibleGraph { nodes, edges }
}

fn expand<'a>(
	all_nodes: &'a [TopologyNode],
	all_edges: &'a [TopologyEdge],
	expanded: &HashSet<String>,
	filtered: &HashSet<&'a str>,
) -> HashSet<&'a str> {
	let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
	for edge in all_edges {
		children
			.entry(edge.source.as_str())
			.or_default()
			.push(edge.target.as_str());
	}

	let mut visible: HashSet<&'a str> = all_nodes
		.iter()
		.filter(|node| filtered.contains(node.id.as_str()) && node.is_anchor())
		.map(|node| node.id.as_str())
		.collect();

	// Roots are taken from `all_nodes` so the borrowed ids outlive `expanded`.
	let mut frontier: VecDeque<&'a str> = all_nodes
		.iter()
		.map(|node| node.id.as_str())
		.filter(|id| expanded.contains(*id) && filtered.contains(id))
		.collect();
	let mut visited: HashSet<&'a str> = frontier.iter().copied().collect();
	visible.extend(frontier.iter().copied());

	while let Some(id) = frontier.pop_front() {
		let Some(targets) = children.get(id) else {
			continue;
		};
		for &target in targets {
			if !filtered.contains(target) {
				continue;
			}
			visible.insert(target);
			if expanded.contains(target) && visited.insert(target) {
				frontier.push_back(target);
			}
		}
	}

	visible
}
