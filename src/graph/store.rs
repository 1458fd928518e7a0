//! Authoritative graph state and the operations that mutate it.
//!
//! Every operation that touches the full graph, the expansion set or the
//! filters recomputes the visible pair from scratch. Operations referencing
//! an id that does not exist are no-ops.

use std::collections::HashSet;

use log::{debug, info, warn};
use serde_json::{Map, Value};

use super::changes::{self, Connection, EdgeChange, NodeChange};
use super::filter::FilterCriteria;
use super::model::{GraphData, TopologyEdge, TopologyNode, renderer_type_for};
use super::visibility::{VisibleGraph, resolve_visible};

/// Single source of truth for one topology view.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
	all_nodes: Vec<TopologyNode>,
	all_edges: Vec<TopologyEdge>,
	visible_nodes: Vec<TopologyNode>,
	visible_edges: Vec<TopologyEdge>,
	expanded_nodes: HashSet<String>,
	active_filters: FilterCriteria,
	selected_node_id: Option<String>,
	is_loading: bool,
	error: Option<String>,
}

impl GraphStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn all_nodes(&self) -> &[TopologyNode] {
		&self.all_nodes
	}

	pub fn all_edges(&self) -> &[TopologyEdge] {
		&self.all_edges
	}

	pub fn visible_nodes(&self) -> &[TopologyNode] {
		&self.visible_nodes
	}

	pub fn visible_edges(&self) -> &[TopologyEdge] {
		&self.visible_edges
	}

	pub fn expanded_nodes(&self) -> &HashSet<String> {
		&self.expanded_nodes
	}

	pub fn active_filters(&self) -> &FilterCriteria {
		&self.active_filters
	}

	pub fn selected_node_id(&self) -> Option<&str> {
		self.selected_node_id.as_deref()
	}

	pub fn is_loading(&self) -> bool {
		self.is_loading
	}

	pub fn error(&self) -> Option<&str> {
		self.error.as_deref()
	}

	/// Looks a node up in the full graph.
	pub fn node(&self, id: &str) -> Option<&TopologyNode> {
		self.all_nodes.iter().find(|n| n.id == id)
	}

	pub fn is_expanded(&self, id: &str) -> bool {
		self.expanded_nodes.contains(id)
	}

	/// Replaces the whole graph, assigning renderer types and default
	/// positions, and clears any loader error.
	pub fn set_graph(&mut self, nodes: Vec<TopologyNode>, edges: Vec<TopologyEdge>) {
		self.all_nodes = nodes;
		for (index, node) in self.all_nodes.iter_mut().enumerate() {
			node.normalize(index);
		}
		self.all_edges = edges;
		self.error = None;
		info!(
			"graph loaded: {} nodes, {} edges",
			self.all_nodes.len(),
			self.all_edges.len()
		);
		self.recompute();
	}

	/// [`GraphStore::set_graph`] for a loader result.
	pub fn load(&mut self, data: GraphData) {
		self.set_graph(data.nodes, data.edges);
	}

	/// Makes `id` the only selected node.
	///
	/// Only the selection flags change, so canvas edits to the visible nodes
	/// survive.
	pub fn select_node(&mut self, id: &str) {
		if self.node(id).is_none() {
			debug!("select_node: unknown id {id}");
			return;
		}
		for node in self.all_nodes.iter_mut().chain(self.visible_nodes.iter_mut()) {
			node.selected = node.id == id;
		}
		self.selected_node_id = Some(id.to_string());
	}

	pub fn clear_selection(&mut self) {
		for node in self.all_nodes.iter_mut().chain(self.visible_nodes.iter_mut()) {
			node.selected = false;
		}
		self.selected_node_id = None;
	}

	/// Flips membership of `id` in the expansion set.
	pub fn toggle_node_expansion(&mut self, id: &str) {
		if !self.expanded_nodes.remove(id) {
			self.expanded_nodes.insert(id.to_string());
		}
		debug!(
			"toggled expansion of {id}: {} expanded",
			self.expanded_nodes.len()
		);
		self.recompute();
	}

	pub fn expand_all(&mut self) {
		self.expanded_nodes = self.all_nodes.iter().map(|n| n.id.clone()).collect();
		self.recompute();
	}

	pub fn collapse_all(&mut self) {
		self.expanded_nodes.clear();
		self.recompute();
	}

	/// Merges `patch` into the active filters; set keys override.
	pub fn set_filters(&mut self, patch: FilterCriteria) {
		self.active_filters.merge(patch);
		debug!("filters now {:?}", self.active_filters);
		self.recompute();
	}

	pub fn clear_filters(&mut self) {
		self.active_filters = FilterCriteria::default();
		self.recompute();
	}

	/// Shallow-merges `patch` into a node's data payload.
	///
	/// A patch that would leave the payload undecodable is dropped.
	pub fn update_node_data(&mut self, id: &str, patch: &Map<String, Value>) {
		let Some(node) = self.all_nodes.iter_mut().find(|n| n.id == id) else {
			debug!("update_node_data: unknown id {id}");
			return;
		};
		if let Err(err) = node.data.merge(patch) {
			warn!("ignoring invalid data patch for {id}: {err}");
			return;
		}
		// The patch may have changed the kind
		node.renderer = Some(renderer_type_for(node));
		self.recompute();
	}

	/// Appends a node. Duplicate ids are ignored.
	pub fn add_node(&mut self, mut node: TopologyNode) {
		if self.node(&node.id).is_some() {
			warn!("add_node: duplicate id {}", node.id);
			return;
		}
		node.normalize(self.all_nodes.len());
		self.all_nodes.push(node);
		self.recompute();
	}

	/// Removes a node together with every edge touching it.
	pub fn remove_node(&mut self, id: &str) {
		let before = self.all_nodes.len();
		self.all_nodes.retain(|n| n.id != id);
		if self.all_nodes.len() == before {
			return;
		}
		self.all_edges.retain(|e| e.source != id && e.target != id);
		self.expanded_nodes.remove(id);
		if self.selected_node_id.as_deref() == Some(id) {
			self.selected_node_id = None;
		}
		self.recompute();
	}

	/// Appends an edge. Duplicate ids and self-loops are ignored.
	pub fn add_edge_to_graph(&mut self, edge: TopologyEdge) {
		if edge.is_self_loop() {
			warn!("add_edge_to_graph: self-loop on {}", edge.source);
			return;
		}
		if self.all_edges.iter().any(|e| e.id == edge.id) {
			warn!("add_edge_to_graph: duplicate id {}", edge.id);
			return;
		}
		self.all_edges.push(edge);
		self.recompute();
	}

	pub fn remove_edge(&mut self, id: &str) {
		let before = self.all_edges.len();
		self.all_edges.retain(|e| e.id != id);
		if self.all_edges.len() != before {
			self.recompute();
		}
	}

	/// Applies canvas node changes to the visible nodes only.
	pub fn on_nodes_change(&mut self, changes: Vec<NodeChange>) {
		changes::apply_node_changes(changes, &mut self.visible_nodes);
	}

	/// Applies canvas edge changes to the visible edges only.
	pub fn on_edges_change(&mut self, changes: Vec<EdgeChange>) {
		changes::apply_edge_changes(changes, &mut self.visible_edges);
	}

	/// Adds a user-drawn connection to the visible edges only.
	pub fn on_connect(&mut self, connection: Connection) {
		if !changes::add_connection(connection, &mut self.visible_edges) {
			debug!("on_connect: connection ignored");
		}
	}

	/// Resets every piece of state, including expansion and selection.
	pub fn clear_graph(&mut self) {
		*self = Self::default();
	}

	pub fn set_loading(&mut self, loading: bool) {
		self.is_loading = loading;
	}

	/// Records a loader failure. Setting an error also ends loading.
	pub fn set_error(&mut self, error: Option<String>) {
		if let Some(message) = &error {
			warn!("graph loader failed: {message}");
			self.is_loading = false;
		}
		self.error = error;
	}

	fn recompute(&mut self) {
		let VisibleGraph { nodes, edges } = resolve_visible(
			&self.all_nodes,
			&self.all_edges,
			&self.expanded_nodes,
			&self.active_filters,
		);
		debug!(
			"visible: {}/{} nodes, {}/{} edges",
			nodes.len(),
			self.all_nodes.len(),
			edges.len(),
			self.all_edges.len()
		);
		self.visible_nodes = nodes;
		self.visible_edges = edges;
	}
}
