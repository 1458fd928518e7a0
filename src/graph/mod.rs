//! Topology graph engine: data model, filtering, progressive disclosure and
//! the store that ties them together. Nothing in here touches the DOM.

pub mod changes;
pub mod filter;
pub mod loader;
pub mod model;
pub mod store;
pub mod visibility;

pub use changes::{Connection, EdgeChange, NodeChange};
pub use filter::FilterCriteria;
pub use loader::{LoadError, Topology, load_topology, parse_graph, topology_to_graph};
pub use model::{
	GraphData, NodeData, NodeKind, Position, PowerState, RendererType, TopologyEdge,
	TopologyNode, renderer_type_for,
};
pub use store::GraphStore;
pub use visibility::{VisibleGraph, resolve_visible};
