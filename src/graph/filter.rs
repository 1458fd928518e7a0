//! Node filter criteria and the predicates behind them.

use serde::{Deserialize, Serialize};

use super::model::{NodeKind, PowerState, TopologyNode};

/// Active filters. A `None` or empty criterion does not restrict anything.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kinds: Option<Vec<NodeKind>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub vendors: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub clusters: Option<Vec<String>>,
	/// Case-insensitive substring over name, description and tags.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub search: Option<String>,
	/// `Some(false)` hides powered-off virtual machines.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub show_powered_off: Option<bool>,
}

impl FilterCriteria {
	/// Shallow merge: every criterion set in `patch` replaces ours.
	pub fn merge(&mut self, patch: FilterCriteria) {
		let FilterCriteria {
			kinds,
			vendors,
			clusters,
			search,
			show_powered_off,
		} = patch;
		if kinds.is_some() {
			self.kinds = kinds;
		}
		if vendors.is_some() {
			self.vendors = vendors;
		}
		if clusters.is_some() {
			self.clusters = clusters;
		}
		if search.is_some() {
			self.search = search;
		}
		if show_powered_off.is_some() {
			self.show_powered_off = show_powered_off;
		}
	}

	/// True when no criterion restricts anything.
	pub fn is_empty(&self) -> bool {
		active(&self.kinds).is_none()
			&& active(&self.vendors).is_none()
			&& active(&self.clusters).is_none()
			&& self.search_needle().is_none()
			&& self.show_powered_off != Some(false)
	}

	/// Conjunction of every active predicate.
	pub fn matches(&self, node: &TopologyNode) -> bool {
		self.matches_kind(node)
			&& self.matches_vendor(node)
			&& self.matches_cluster(node)
			&& self.matches_search(node)
			&& self.matches_power_state(node)
	}

	fn matches_kind(&self, node: &TopologyNode) -> bool {
		active(&self.kinds).is_none_or(|kinds| kinds.contains(&node.data.kind))
	}

	fn matches_vendor(&self, node: &TopologyNode) -> bool {
		active(&self.vendors).is_none_or(|vendors| {
			node.data
				.vendor
				.as_ref()
				.is_some_and(|vendor| vendors.contains(vendor))
		})
	}

	fn matches_cluster(&self, node: &TopologyNode) -> bool {
		active(&self.clusters).is_none_or(|clusters| {
			[&node.data.cluster, &node.data.cluster_id]
				.into_iter()
				.flatten()
				.any(|cluster| clusters.contains(cluster))
		})
	}

	fn matches_search(&self, node: &TopologyNode) -> bool {
		let Some(needle) = self.search_needle() else {
			return true;
		};
		let data = &node.data;
		data.name.to_lowercase().contains(&needle)
			|| data
				.description
				.as_ref()
				.is_some_and(|d| d.to_lowercase().contains(&needle))
			|| data.tags.iter().any(|t| t.to_lowercase().contains(&needle))
	}

	fn matches_power_state(&self, node: &TopologyNode) -> bool {
		self.show_powered_off != Some(false)
			|| !node.data.kind.is_virtual_machine()
			|| node.data.power_state != Some(PowerState::PoweredOff)
	}

	fn search_needle(&self) -> Option<String> {
		self.search
			.as_deref()
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(str::to_lowercase)
	}
}

fn active<T>(list: &Option<Vec<T>>) -> Option<&Vec<T>> {
	list.as_ref().filter(|l| !l.is_empty())
}
