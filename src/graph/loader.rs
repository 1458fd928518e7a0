//! Builds graphs from inventory documents.
//!
//! An inventory export describes clusters, their hosts, and per host the
//! virtual machines, virtual switches with their port groups, and mounted
//! datastores. Converting it yields a layered graph: clusters on top, then
//! hosts, then switches and datastores, then port groups, then VMs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{GraphData, NodeData, NodeKind, PowerState, TopologyEdge, TopologyNode};

const CLUSTER_LAYER: u32 = 0;
const HOST_LAYER: u32 = 1;
const SWITCH_LAYER: u32 = 2;
const PORTGROUP_LAYER: u32 = 3;
const VM_LAYER: u32 = 4;

/// Failure to turn a document into a graph.
#[derive(Debug, Error)]
pub enum LoadError {
	#[error("malformed topology document: {0}")]
	Json(#[from] serde_json::Error),
	#[error("topology document contains no clusters")]
	Empty,
}

/// Inventory export root.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Topology {
	#[serde(default)]
	pub clusters: Vec<ClusterSpec>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
	pub name: String,
	#[serde(default)]
	pub vendor: Option<String>,
	#[serde(default)]
	pub hosts: Vec<HostSpec>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSpec {
	pub name: String,
	#[serde(default)]
	pub vendor: Option<String>,
	#[serde(default)]
	pub model: Option<String>,
	#[serde(default)]
	pub vms: Vec<VmSpec>,
	#[serde(default)]
	pub virtual_switches: Vec<SwitchSpec>,
	#[serde(default)]
	pub datastores: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmSpec {
	pub name: String,
	#[serde(default)]
	pub power_state: PowerState,
	#[serde(default)]
	pub guest_os: Option<String>,
	/// Marks storage controller VMs of hyperconverged clusters.
	#[serde(default)]
	pub controller: bool,
	/// Port groups the VM's NICs attach to.
	#[serde(default)]
	pub networks: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchSpec {
	pub name: String,
	/// `"distributed"` for switches spanning hosts; anything else is standard.
	#[serde(default)]
	pub switch_type: Option<String>,
	#[serde(default)]
	pub port_groups: Vec<PortGroupSpec>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortGroupSpec {
	pub name: String,
	#[serde(default)]
	pub vlan_id: u16,
}

/// Decodes an inventory export.
pub fn parse_topology(json: &str) -> Result<Topology, LoadError> {
	let topology: Topology = serde_json::from_str(json)?;
	if topology.clusters.is_empty() {
		return Err(LoadError::Empty);
	}
	Ok(topology)
}

/// Decodes a ready-made `{nodes, edges}` document.
pub fn parse_graph(json: &str) -> Result<GraphData, LoadError> {
	Ok(serde_json::from_str(json)?)
}

/// Parses and converts an inventory export in one step.
pub fn load_topology(json: &str) -> Result<GraphData, LoadError> {
	parse_topology(json).map(|topology| topology_to_graph(&topology))
}

/// Converts an inventory export into nodes and edges.
pub fn topology_to_graph(topology: &Topology) -> GraphData {
	let mut builder = GraphBuilder::default();

	for cluster in &topology.clusters {
		let cluster_id = format!("cluster:{}", cluster.name);
		let mut data = NodeData::new(NodeKind::Cluster, &cluster.name);
		data.vendor = cluster.vendor.clone();
		data.cluster = Some(cluster.name.clone());
		data.cluster_id = Some(cluster_id.clone());
		data.description = Some(format!("{} hosts", cluster.hosts.len()));
		builder.node(&cluster_id, data, CLUSTER_LAYER);

		for host in &cluster.hosts {
			builder.host(host, cluster, &cluster_id);
		}
	}

	builder.finish()
}

#[derive(Default)]
struct GraphBuilder {
	data: GraphData,
	next_order: HashMap<u32, u32>,
}

impl GraphBuilder {
	fn host(&mut self, host: &HostSpec, cluster: &ClusterSpec, cluster_id: &str) {
		let scope = format!("{}/{}", cluster.name, host.name);
		let host_id = format!("host:{scope}");
		let mut data = NodeData::new(NodeKind::PhysicalHost, &host.name);
		data.vendor = host.vendor.clone().or_else(|| cluster.vendor.clone());
		data.description = host.model.clone();
		self.node(&host_id, in_cluster(data, cluster, cluster_id), HOST_LAYER);
		self.edge(cluster_id, &host_id);

		for switch in &host.virtual_switches {
			let switch_id = format!("vswitch:{scope}/{}", switch.name);
			let kind = match switch.switch_type.as_deref() {
				Some(t) if t.eq_ignore_ascii_case("distributed") => NodeKind::DistributedSwitch,
				_ => NodeKind::VirtualSwitch,
			};
			let data = NodeData::new(kind, &switch.name);
			self.node(&switch_id, in_cluster(data, cluster, cluster_id), SWITCH_LAYER);
			self.edge(&host_id, &switch_id);

			for port_group in &switch.port_groups {
				let pg_id = format!("portgroup:{scope}/{}/{}", switch.name, port_group.name);
				let kind = if kind == NodeKind::DistributedSwitch {
					NodeKind::DvPortGroup
				} else {
					NodeKind::PortGroup
				};
				let mut data = NodeData::new(kind, &port_group.name);
				if port_group.vlan_id > 0 {
					data.tags.push(format!("vlan:{}", port_group.vlan_id));
				}
				self.node(&pg_id, in_cluster(data, cluster, cluster_id), PORTGROUP_LAYER);
				self.edge(&switch_id, &pg_id);
			}
		}

		for datastore in &host.datastores {
			// Datastores are shared between the hosts of one cluster only
			let ds_id = format!("datastore:{}/{datastore}", cluster.name);
			if !self.has_node(&ds_id) {
				let data = NodeData::new(NodeKind::Datastore, datastore);
				self.node(&ds_id, in_cluster(data, cluster, cluster_id), SWITCH_LAYER);
			}
			self.edge(&host_id, &ds_id);
		}

		for vm in &host.vms {
			let vm_id = format!("vm:{scope}/{}", vm.name);
			let kind = if vm.controller {
				NodeKind::ControllerVm
			} else {
				NodeKind::VirtualMachine
			};
			let mut data = NodeData::new(kind, &vm.name);
			data.power_state = Some(vm.power_state);
			data.description = vm.guest_os.clone();
			data.tags = vm.networks.clone();
			self.node(&vm_id, in_cluster(data, cluster, cluster_id), VM_LAYER);
			self.edge(&host_id, &vm_id);
		}
	}

	fn node(&mut self, id: &str, mut data: NodeData, layer: u32) {
		let order = self.next_order.entry(layer).or_insert(0);
		data.layer = Some(layer);
		data.order = Some(*order);
		*order += 1;
		self.data.nodes.push(TopologyNode::new(id, data));
	}

	fn edge(&mut self, source: &str, target: &str) {
		self.data.edges.push(TopologyEdge::new(
			format!("{source}->{target}"),
			source,
			target,
		));
	}

	fn has_node(&self, id: &str) -> bool {
		self.data.nodes.iter().any(|n| n.id == id)
	}

	fn finish(self) -> GraphData {
		self.data
	}
}

fn in_cluster(mut data: NodeData, cluster: &ClusterSpec, cluster_id: &str) -> NodeData {
	data.cluster = Some(cluster.name.clone());
	data.cluster_id = Some(cluster_id.to_string());
	data
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::filter::FilterCriteria;
	use crate::graph::model::RendererType;
	use pretty_assertions::assert_eq;

	const DOC: &str = r#"{
		"clusters": [{
			"name": "Prod",
			"vendor": "Dell",
			"hosts": [
				{
					"name": "esx-01",
					"vms": [
						{ "name": "web-01", "powerState": "poweredOn", "networks": ["VM Network"] },
						{ "name": "old-01", "powerState": "poweredOff" }
					],
					"virtualSwitches": [
						{ "name": "vSwitch0", "portGroups": [{ "name": "VM Network", "vlanId": 20 }] }
					],
					"datastores": ["ds-shared"]
				},
				{ "name": "esx-02", "vendor": "HPE", "datastores": ["ds-shared"] }
			]
		}]
	}"#;

	#[test]
	fn converts_inventory_into_layered_graph() {
		let graph = load_topology(DOC).unwrap();
		let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(
			ids,
			vec![
				"cluster:Prod",
				"host:Prod/esx-01",
				"vswitch:Prod/esx-01/vSwitch0",
				"portgroup:Prod/esx-01/vSwitch0/VM Network",
				"datastore:Prod/ds-shared",
				"vm:Prod/esx-01/web-01",
				"vm:Prod/esx-01/old-01",
				"host:Prod/esx-02",
			]
		);
		assert_eq!(graph.edges.len(), 8);
		assert!(
			graph
				.edges
				.iter()
				.any(|e| e.source == "host:Prod/esx-02" && e.target == "datastore:Prod/ds-shared")
		);
	}

	#[test]
	fn assigns_layers_and_orders() {
		let graph = load_topology(DOC).unwrap();
		let esx02 = graph.nodes.iter().find(|n| n.id == "host:Prod/esx-02").unwrap();
		assert_eq!((esx02.data.layer, esx02.data.order), (Some(1), Some(1)));
		assert_eq!(esx02.data.vendor.as_deref(), Some("HPE"));
		let old = graph.nodes.iter().find(|n| n.id == "vm:Prod/esx-01/old-01").unwrap();
		assert_eq!(old.data.power_state, Some(PowerState::PoweredOff));
		assert_eq!(old.data.cluster.as_deref(), Some("Prod"));
		assert_eq!(old.renderer_type(), RendererType::Vm);
	}

	#[test]
	fn vlan_becomes_a_tag_and_distributed_switches_are_typed() {
		let graph = load_topology(DOC).unwrap();
		let pg = graph
			.nodes
			.iter()
			.find(|n| n.data.kind == NodeKind::PortGroup)
			.unwrap();
		assert_eq!(pg.data.tags, vec!["vlan:20".to_string()]);

		let topology = Topology {
			clusters: vec![ClusterSpec {
				name: "Edge".into(),
				hosts: vec![HostSpec {
					name: "h".into(),
					virtual_switches: vec![SwitchSpec {
						name: "dvs".into(),
						switch_type: Some("Distributed".into()),
						port_groups: vec![PortGroupSpec {
							name: "trunk".into(),
							vlan_id: 0,
						}],
					}],
					..Default::default()
				}],
				..Default::default()
			}],
		};
		let graph = topology_to_graph(&topology);
		let kinds: Vec<NodeKind> = graph.nodes.iter().map(|n| n.data.kind).collect();
		assert_eq!(
			kinds,
			vec![
				NodeKind::Cluster,
				NodeKind::PhysicalHost,
				NodeKind::DistributedSwitch,
				NodeKind::DvPortGroup,
			]
		);
		assert!(graph.nodes[3].data.tags.is_empty());
	}

	#[test]
	fn rejects_malformed_and_empty_documents() {
		assert!(matches!(load_topology("{"), Err(LoadError::Json(_))));
		assert!(matches!(load_topology(r#"{"clusters": []}"#), Err(LoadError::Empty)));
	}

	#[test]
	fn parses_raw_graph_documents() {
		let graph = parse_graph(
			r#"{"nodes":[{"id":"a","data":{"kind":"cluster","name":"A"}}],"edges":[]}"#,
		)
		.unwrap();
		assert_eq!(graph.nodes.len(), 1);
		assert_eq!(graph.nodes[0].data.kind, NodeKind::Cluster);
	}

	#[test]
	fn same_names_in_different_clusters_stay_apart() {
		let doc = r#"{
			"clusters": [
				{ "name": "East", "hosts": [{ "name": "esx-01", "datastores": ["ds-01"] }] },
				{ "name": "West", "hosts": [{ "name": "esx-01", "datastores": ["ds-01"] }] }
			]
		}"#;
		let graph = load_topology(doc).unwrap();
		let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(
			ids,
			vec![
				"cluster:East",
				"host:East/esx-01",
				"datastore:East/ds-01",
				"cluster:West",
				"host:West/esx-01",
				"datastore:West/ds-01",
			]
		);

		let west = FilterCriteria {
			clusters: Some(vec!["West".into()]),
			..Default::default()
		};
		let kept: Vec<&str> = graph
			.nodes
			.iter()
			.filter(|n| west.matches(n))
			.map(|n| n.id.as_str())
			.collect();
		assert_eq!(kept, vec!["cluster:West", "host:West/esx-01", "datastore:West/ds-01"]);
	}
}
