use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

/// A subject in the topic map, positioned in logical (pre-projection) units.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TopicNode {
	pub id: String,
	pub label: String,
	/// Site path the node navigates to, without the leading slash.
	pub slug: String,
	pub x: f64,
	pub y: f64,
	/// Block edge length at scale 1.
	pub size: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TopicEdge {
	pub source: String,
	pub target: String,
}

/// Node and edge lists of one graph instance. The first node is the center.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphData {
	pub nodes: Vec<TopicNode>,
	#[serde(default)]
	pub edges: Vec<TopicEdge>,
}

#[derive(Debug, Error)]
pub enum GraphDataError {
	#[error("invalid graph json: {0}")]
	Parse(#[from] serde_json::Error),
	#[error("graph has no nodes")]
	Empty,
	#[error("duplicate node id `{0}`")]
	DuplicateNode(String),
	#[error("node `{id}` has invalid size {size}")]
	InvalidSize { id: String, size: f64 },
}

impl GraphData {
	/// Parse and validate a dataset. Edges pointing at unknown ids are kept;
	/// the renderer skips them.
	pub fn from_json(json: &str) -> Result<Self, GraphDataError> {
		let data: GraphData = serde_json::from_str(json)?;
		data.validate()?;
		Ok(data)
	}

	pub fn validate(&self) -> Result<(), GraphDataError> {
		if self.nodes.is_empty() {
			return Err(GraphDataError::Empty);
		}
		let mut seen = HashSet::with_capacity(self.nodes.len());
		for node in &self.nodes {
			if !seen.insert(node.id.as_str()) {
				return Err(GraphDataError::DuplicateNode(node.id.clone()));
			}
			if !node.size.is_finite() || node.size <= 0.0 {
				return Err(GraphDataError::InvalidSize {
					id: node.id.clone(),
					size: node.size,
				});
			}
		}
		Ok(())
	}

	pub fn center(&self) -> Option<&TopicNode> {
		self.nodes.first()
	}

	pub fn is_center(&self, id: &str) -> bool {
		self.center().is_some_and(|c| c.id == id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MATHEMATICS: &str = include_str!("../../../assets/topics/mathematics.json");

	#[test]
	fn bundled_dataset_loads() {
		let data = GraphData::from_json(MATHEMATICS).expect("dataset parses");
		assert_eq!(data.nodes.len(), 10);
		assert_eq!(data.edges.len(), 20);
		assert_eq!(data.center().map(|n| n.id.as_str()), Some("math"));
		assert!(data.is_center("math"));
		assert!(!data.is_center("logic"));
	}

	#[test]
	fn dangling_edges_are_not_a_load_error() {
		let json = r#"{
			"nodes": [{ "id": "a", "label": "A", "slug": "a", "x": 0, "y": 0, "size": 10 }],
			"edges": [{ "source": "a", "target": "ghost" }]
		}"#;
		let data = GraphData::from_json(json).expect("dangling edge tolerated");
		assert_eq!(data.edges.len(), 1);
	}

	#[test]
	fn rejects_duplicates_and_bad_sizes() {
		let dup = r#"{ "nodes": [
			{ "id": "a", "label": "A", "slug": "a", "x": 0, "y": 0, "size": 10 },
			{ "id": "a", "label": "B", "slug": "b", "x": 1, "y": 1, "size": 10 }
		] }"#;
		assert!(matches!(
			GraphData::from_json(dup),
			Err(GraphDataError::DuplicateNode(id)) if id == "a"
		));

		let zero = r#"{ "nodes": [{ "id": "a", "label": "A", "slug": "a", "x": 0, "y": 0, "size": 0 }] }"#;
		assert!(matches!(
			GraphData::from_json(zero),
			Err(GraphDataError::InvalidSize { .. })
		));

		assert!(matches!(
			GraphData::from_json(r#"{ "nodes": [] }"#),
			Err(GraphDataError::Empty)
		));
		assert!(matches!(
			GraphData::from_json("not json"),
			Err(GraphDataError::Parse(_))
		));
	}
}
