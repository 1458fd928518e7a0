//! Incremental change descriptors emitted by the interactive canvas.
//!
//! These only ever touch the visible collections: the canvas can manipulate
//! nothing it cannot see.

use serde::{Deserialize, Serialize};

use super::model::{Position, TopologyEdge, TopologyNode};

/// A change to one visible node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeChange {
	Position {
		id: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		position: Option<Position>,
		#[serde(default)]
		dragging: bool,
	},
	/// Measured size; recorded in the node's extra data.
	Dimensions { id: String, width: f64, height: f64 },
	Select { id: String, selected: bool },
	Remove { id: String },
	Add { node: TopologyNode },
}

/// A change to one visible edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeChange {
	Select { id: String, selected: bool },
	Remove { id: String },
	Add { edge: TopologyEdge },
}

/// A user-drawn link between two nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
	pub source: String,
	pub target: String,
}

impl Connection {
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}

	/// Id given to the edge a connection becomes.
	pub fn edge_id(&self) -> String {
		format!("edge-{}-{}", self.source, self.target)
	}
}

/// Applies node changes in order. Changes for unknown ids are skipped.
pub fn apply_node_changes(changes: Vec<NodeChange>, nodes: &mut Vec<TopologyNode>) {
	for change in changes {
		match change {
			NodeChange::Position { id, position, .. } => {
				if let (Some(node), Some(position)) = (find_node(nodes, &id), position) {
					node.position = Some(position);
				}
			}
			NodeChange::Dimensions { id, width, height } => {
				if let Some(node) = find_node(nodes, &id) {
					node.data.extra.insert("width".into(), width.into());
					node.data.extra.insert("height".into(), height.into());
				}
			}
			NodeChange::Select { id, selected } => {
				if let Some(node) = find_node(nodes, &id) {
					node.selected = selected;
				}
			}
			NodeChange::Remove { id } => nodes.retain(|n| n.id != id),
			NodeChange::Add { node } => {
				if !nodes.iter().any(|n| n.id == node.id) {
					nodes.push(node);
				}
			}
		}
	}
}

/// Applies edge changes in order. Changes for unknown ids are skipped.
pub fn apply_edge_changes(changes: Vec<EdgeChange>, edges: &mut Vec<TopologyEdge>) {
	for change in changes {
		match change {
			EdgeChange::Select { id, selected } => {
				if let Some(edge) = edges.iter_mut().find(|e| e.id == id) {
					edge.selected = selected;
				}
			}
			EdgeChange::Remove { id } => edges.retain(|e| e.id != id),
			EdgeChange::Add { edge } => {
				if !edges.iter().any(|e| e.id == edge.id) {
					edges.push(edge);
				}
			}
		}
	}
}

/// Turns a connection into an edge unless it loops or already exists.
///
/// Returns whether an edge was added.
pub fn add_connection(connection: Connection, edges: &mut Vec<TopologyEdge>) -> bool {
	if connection.source == connection.target {
		return false;
	}
	let exists = edges
		.iter()
		.any(|e| e.source == connection.source && e.target == connection.target);
	if exists {
		return false;
	}
	edges.push(TopologyEdge::new(
		connection.edge_id(),
		connection.source,
		connection.target,
	));
	true
}

fn find_node<'a>(nodes: &'a mut [TopologyNode], id: &str) -> Option<&'a mut TopologyNode> {
	nodes.iter_mut().find(|n| n.id == id)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::model::{NodeData, NodeKind};

	fn nodes() -> Vec<TopologyNode> {
		vec![
			TopologyNode::new("a", NodeData::new(NodeKind::PhysicalHost, "a")),
			TopologyNode::new("b", NodeData::new(NodeKind::VirtualMachine, "b")),
		]
	}

	#[test]
	fn position_change_moves_node() {
		let mut nodes = nodes();
		apply_node_changes(
			vec![NodeChange::Position {
				id: "b".into(),
				position: Some(Position { x: 10.0, y: 20.0 }),
				dragging: true,
			}],
			&mut nodes,
		);
		assert_eq!(nodes[1].position, Some(Position { x: 10.0, y: 20.0 }));
	}

	#[test]
	fn unknown_ids_are_ignored() {
		let mut nodes = nodes();
		let before = nodes.clone();
		apply_node_changes(
			vec![
				NodeChange::Select {
					id: "ghost".into(),
					selected: true,
				},
				NodeChange::Remove { id: "ghost".into() },
			],
			&mut nodes,
		);
		assert_eq!(nodes, before);
	}

	#[test]
	fn remove_and_add_edges() {
		let mut edges = vec![TopologyEdge::new("e1", "a", "b")];
		apply_edge_changes(
			vec![
				EdgeChange::Add {
					edge: TopologyEdge::new("e1", "b", "a"),
				},
				EdgeChange::Select {
					id: "e1".into(),
					selected: true,
				},
			],
			&mut edges,
		);
		assert_eq!(edges.len(), 1);
		assert!(edges[0].selected);
		apply_edge_changes(vec![EdgeChange::Remove { id: "e1".into() }], &mut edges);
		assert!(edges.is_empty());
	}

	#[test]
	fn connection_rejects_loops_and_duplicates() {
		let mut edges = Vec::new();
		assert!(add_connection(Connection::new("a", "b"), &mut edges));
		assert!(!add_connection(Connection::new("a", "b"), &mut edges));
		assert!(!add_connection(Connection::new("a", "a"), &mut edges));
		assert_eq!(edges, vec![TopologyEdge::new("edge-a-b", "a", "b")]);
	}

	#[test]
	fn change_descriptors_decode_from_canvas_json() {
		let change: NodeChange = serde_json::from_str(
			r#"{"type":"position","id":"a","position":{"x":1.0,"y":2.0},"dragging":false}"#,
		)
		.unwrap();
		assert_eq!(
			change,
			NodeChange::Position {
				id: "a".into(),
				position: Some(Position { x: 1.0, y: 2.0 }),
				dragging: false,
			}
		);
	}
}
