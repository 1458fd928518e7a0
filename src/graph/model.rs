//! Typed nodes and edges describing infrastructure entities.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Horizontal distance between two columns of the default layout.
pub const COLUMN_WIDTH: f64 = 320.0;
/// Vertical distance between two layers of the default layout.
pub const ROW_HEIGHT: f64 = 200.0;

/// Kind of infrastructure entity a node stands for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
	/// A bare-metal hypervisor host.
	PhysicalHost,
	/// A guest virtual machine.
	VirtualMachine,
	/// A compute cluster grouping hosts.
	Cluster,
	/// A storage controller VM (HCI platforms).
	ControllerVm,
	/// A host-local virtual switch.
	VirtualSwitch,
	/// A switch spanning several hosts.
	DistributedSwitch,
	/// A port group on a standard switch.
	PortGroup,
	/// A port group on a distributed switch.
	#[serde(rename = "dvport-group")]
	DvPortGroup,
	/// A VLAN backed network.
	VlanNetwork,
	/// A storage volume.
	Datastore,
	/// Anything the inventory could not classify.
	#[default]
	#[serde(other)]
	Other,
}

impl NodeKind {
	/// Every kind, in declaration order.
	pub const ALL: [NodeKind; 11] = [
		NodeKind::PhysicalHost,
		NodeKind::VirtualMachine,
		NodeKind::Cluster,
		NodeKind::ControllerVm,
		NodeKind::VirtualSwitch,
		NodeKind::DistributedSwitch,
		NodeKind::PortGroup,
		NodeKind::DvPortGroup,
		NodeKind::VlanNetwork,
		NodeKind::Datastore,
		NodeKind::Other,
	];

	/// Whether the power-state filter applies to this kind.
	pub fn is_virtual_machine(self) -> bool {
		matches!(self, NodeKind::VirtualMachine | NodeKind::ControllerVm)
	}
}

/// Power state reported for virtual machines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerState {
	PoweredOn,
	PoweredOff,
	Suspended,
	#[default]
	#[serde(other)]
	Unknown,
}

/// Presentation category consumed by the canvas renderer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RendererType {
	Host,
	Vm,
	Cluster,
	Vswitch,
	Portgroup,
	Datastore,
	/// A category declared by the data source that has no built-in mapping.
	Declared(String),
	#[default]
	Default,
}

impl RendererType {
	/// Wire name of the category.
	pub fn as_str(&self) -> &str {
		match self {
			RendererType::Host => "host",
			RendererType::Vm => "vm",
			RendererType::Cluster => "cluster",
			RendererType::Vswitch => "vswitch",
			RendererType::Portgroup => "portgroup",
			RendererType::Datastore => "datastore",
			RendererType::Declared(name) => name,
			RendererType::Default => "default",
		}
	}

	/// Anchor categories stay on screen whenever they pass filtering.
	pub fn is_anchor(&self) -> bool {
		matches!(self, RendererType::Host | RendererType::Cluster)
	}
}

impl From<String> for RendererType {
	fn from(value: String) -> Self {
		match value.as_str() {
			"host" => RendererType::Host,
			"vm" => RendererType::Vm,
			"cluster" => RendererType::Cluster,
			"vswitch" => RendererType::Vswitch,
			"portgroup" => RendererType::Portgroup,
			"datastore" => RendererType::Datastore,
			"default" => RendererType::Default,
			_ => RendererType::Declared(value),
		}
	}
}

impl From<RendererType> for String {
	fn from(value: RendererType) -> Self {
		value.as_str().to_string()
	}
}

impl fmt::Display for RendererType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Canvas coordinates of a node's top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	/// Default slot for a node at `order` within `layer`.
	pub fn from_layout(order: u32, layer: u32) -> Self {
		Self {
			x: order as f64 * COLUMN_WIDTH,
			y: layer as f64 * ROW_HEIGHT,
		}
	}
}

/// Domain payload carried by every node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
	#[serde(default)]
	pub kind: NodeKind,
	#[serde(default)]
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tags: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub vendor: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cluster: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cluster_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub power_state: Option<PowerState>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub layer: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub order: Option<u32>,
	/// Keys the model does not know about, kept verbatim.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl NodeData {
	/// Shorthand for a payload with only kind and name set.
	pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
		Self {
			kind,
			name: name.into(),
			..Default::default()
		}
	}

	/// Shallow-merges `patch` into this payload.
	///
	/// Later keys override earlier ones. Returns the error if the merged
	/// object no longer decodes into a valid payload, leaving `self` as is.
	pub fn merge(&mut self, patch: &Map<String, Value>) -> Result<(), serde_json::Error> {
		let mut object = match serde_json::to_value(&*self)? {
			Value::Object(object) => object,
			_ => Map::new(),
		};
		for (key, value) in patch {
			object.insert(key.clone(), value.clone());
		}
		*self = serde_json::from_value(Value::Object(object))?;
		Ok(())
	}
}

/// A vertex of the topology graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyNode {
	pub id: String,
	#[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
	pub renderer: Option<RendererType>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub position: Option<Position>,
	#[serde(default)]
	pub data: NodeData,
	#[serde(default)]
	pub selected: bool,
}

impl TopologyNode {
	/// Creates an unplaced node.
	pub fn new(id: impl Into<String>, data: NodeData) -> Self {
		Self {
			id: id.into(),
			data,
			..Default::default()
		}
	}

	/// Position, or the origin for a node that was never placed.
	pub fn position_or_origin(&self) -> Position {
		self.position.unwrap_or_default()
	}

	/// Clusters and hosts anchor the graph, judged by kind or by category.
	pub fn is_anchor(&self) -> bool {
		matches!(self.data.kind, NodeKind::Cluster | NodeKind::PhysicalHost)
			|| self.renderer_type().is_anchor()
	}

	/// Renderer category, computed on the fly when not yet assigned.
	pub fn renderer_type(&self) -> RendererType {
		self.renderer.clone().unwrap_or_else(|| renderer_type_for(self))
	}

	/// Assigns the renderer category and, if missing, a default position.
	///
	/// `index` stands in for `data.order` when the payload carries none.
	pub fn normalize(&mut self, index: usize) {
		self.renderer = Some(renderer_type_for(self));
		if self.position.is_none() {
			let order = self.data.order.unwrap_or(index as u32);
			let layer = self.data.layer.unwrap_or(0);
			self.position = Some(Position::from_layout(order, layer));
		}
	}
}

/// A directed containment or connectivity link.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyEdge {
	pub id: String,
	pub source: String,
	pub target: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
	#[serde(default)]
	pub selected: bool,
}

impl TopologyEdge {
	/// Creates an unlabelled edge.
	pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			..Default::default()
		}
	}

	pub fn is_self_loop(&self) -> bool {
		self.source == self.target
	}
}

/// A whole graph as supplied by a loader.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	#[serde(default)]
	pub nodes: Vec<TopologyNode>,
	#[serde(default)]
	pub edges: Vec<TopologyEdge>,
}

/// Maps a node's kind to the category the canvas draws it as.
///
/// Unclassified kinds fall back to the node's declared type, then to
/// [`RendererType::Default`].
pub fn renderer_type_for(node: &TopologyNode) -> RendererType {
	match node.data.kind {
		NodeKind::PhysicalHost => RendererType::Host,
		NodeKind::VirtualMachine | NodeKind::ControllerVm => RendererType::Vm,
		NodeKind::Cluster => RendererType::Cluster,
		NodeKind::VirtualSwitch | NodeKind::DistributedSwitch => RendererType::Vswitch,
		NodeKind::PortGroup | NodeKind::DvPortGroup | NodeKind::VlanNetwork => {
			RendererType::Portgroup
		}
		NodeKind::Datastore => RendererType::Datastore,
		NodeKind::Other => node.renderer.clone().unwrap_or_default(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use serde_json::json;

	fn node_of(kind: NodeKind) -> TopologyNode {
		TopologyNode::new("n", NodeData::new(kind, "n"))
	}

	#[test]
	fn every_kind_maps_to_a_category() {
		let expected = [
			(NodeKind::PhysicalHost, RendererType::Host),
			(NodeKind::VirtualMachine, RendererType::Vm),
			(NodeKind::Cluster, RendererType::Cluster),
			(NodeKind::ControllerVm, RendererType::Vm),
			(NodeKind::VirtualSwitch, RendererType::Vswitch),
			(NodeKind::DistributedSwitch, RendererType::Vswitch),
			(NodeKind::PortGroup, RendererType::Portgroup),
			(NodeKind::DvPortGroup, RendererType::Portgroup),
			(NodeKind::VlanNetwork, RendererType::Portgroup),
			(NodeKind::Datastore, RendererType::Datastore),
			(NodeKind::Other, RendererType::Default),
		];
		assert_eq!(expected.len(), NodeKind::ALL.len());
		for (kind, category) in expected {
			assert_eq!(renderer_type_for(&node_of(kind)), category, "{kind:?}");
		}
	}

	#[test]
	fn unknown_kind_keeps_declared_type() {
		let node: TopologyNode = serde_json::from_value(json!({
			"id": "lb-1",
			"type": "loadbalancer",
			"data": { "kind": "load-balancer", "name": "lb-1" }
		}))
		.unwrap();
		assert_eq!(node.data.kind, NodeKind::Other);
		assert_eq!(
			renderer_type_for(&node),
			RendererType::Declared("loadbalancer".into())
		);
	}

	#[test]
	fn known_kind_overrides_declared_type() {
		let mut node = node_of(NodeKind::PhysicalHost);
		node.renderer = Some(RendererType::Vm);
		assert_eq!(renderer_type_for(&node), RendererType::Host);
	}

	#[test]
	fn normalize_places_node_from_layout_hints() {
		let mut node = node_of(NodeKind::VirtualMachine);
		node.data.layer = Some(2);
		node.normalize(3);
		assert_eq!(node.position, Some(Position { x: 960.0, y: 400.0 }));
		assert_eq!(node.renderer, Some(RendererType::Vm));

		let mut ordered = node_of(NodeKind::Cluster);
		ordered.data.order = Some(1);
		ordered.normalize(7);
		assert_eq!(ordered.position, Some(Position { x: 320.0, y: 0.0 }));
	}

	#[test]
	fn normalize_keeps_existing_position() {
		let mut node = node_of(NodeKind::Datastore);
		node.position = Some(Position { x: 5.0, y: 6.0 });
		node.normalize(0);
		assert_eq!(node.position, Some(Position { x: 5.0, y: 6.0 }));
	}

	#[test]
	fn merge_overrides_and_keeps_extra_keys() {
		let mut data = NodeData::new(NodeKind::VirtualMachine, "web-01");
		let patch = json!({ "powerState": "poweredOff", "owner": "ops" });
		data.merge(patch.as_object().unwrap()).unwrap();
		assert_eq!(data.power_state, Some(PowerState::PoweredOff));
		assert_eq!(data.name, "web-01");
		assert_eq!(data.extra.get("owner"), Some(&json!("ops")));
	}

	#[test]
	fn merge_rejects_invalid_payload() {
		let mut data = NodeData::new(NodeKind::VirtualMachine, "web-01");
		let patch = json!({ "name": 42 });
		assert!(data.merge(patch.as_object().unwrap()).is_err());
		assert_eq!(data.name, "web-01");
	}

	#[test]
	fn node_serializes_renderer_contract() {
		let mut node = node_of(NodeKind::PhysicalHost);
		node.normalize(0);
		let value = serde_json::to_value(&node).unwrap();
		assert_eq!(value["type"], json!("host"));
		assert_eq!(value["position"], json!({ "x": 0.0, "y": 0.0 }));
		assert_eq!(value["data"]["kind"], json!("physical-host"));
	}
}
