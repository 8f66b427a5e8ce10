//! Tests for ChainNode and the Node capability

use crate::edge::EdgeType;
use crate::error::PipelineError;
use crate::node::{ChainNode, Node, NodeId, StageKind};
use crate::nodes::{SourceStage, WindowStage};
use std::time::Duration;

fn inserted_source(id: usize) -> SourceStage {
  let mut source = SourceStage::stream("cpu").unwrap();
  source.chain_mut().assign_id(NodeId(id));
  source
}

#[test]
fn test_chain_node_rejects_empty_name() {
  let err = ChainNode::new("", EdgeType::Stream, EdgeType::Batch).unwrap_err();
  assert_eq!(err, PipelineError::InvalidName(String::new()));

  let err = ChainNode::new("   ", EdgeType::Stream, EdgeType::Batch).unwrap_err();
  assert!(matches!(err, PipelineError::InvalidName(_)));
}

#[test]
fn test_chain_node_accessors() {
  let node = ChainNode::new("window", EdgeType::Stream, EdgeType::Batch).unwrap();
  assert_eq!(node.name(), "window");
  assert_eq!(node.wants(), EdgeType::Stream);
  assert_eq!(node.produces(), EdgeType::Batch);
  assert_eq!(node.id(), None);
  assert!(node.parents().is_empty());
}

#[test]
fn test_link_from_matching_edge_records_parent() {
  let parent = inserted_source(3);
  let mut window = WindowStage::new(Duration::from_secs(10), Duration::from_secs(10));

  window.link_from(&parent).unwrap();

  assert_eq!(window.parents(), &[NodeId(3)]);
}

#[test]
fn test_link_from_mismatched_edge_fails_without_recording() {
  let mut parent = SourceStage::batch("cpu").unwrap();
  parent.chain_mut().assign_id(NodeId(0));
  let mut window = WindowStage::new(Duration::from_secs(10), Duration::from_secs(10));

  let err = window.link_from(&parent).unwrap_err();

  assert_eq!(
    err,
    PipelineError::EdgeMismatch {
      parent: "batch".to_string(),
      child: "window".to_string(),
      produces: EdgeType::Batch,
      wants: EdgeType::Stream,
    }
  );
  assert!(window.parents().is_empty());
}

#[test]
fn test_link_from_detached_parent_fails() {
  let parent = SourceStage::stream("cpu").unwrap();
  let mut window = WindowStage::new(Duration::from_secs(1), Duration::from_secs(1));

  let err = window.link_from(&parent).unwrap_err();

  assert_eq!(err, PipelineError::UnattachedParent("stream".to_string()));
}

#[test]
fn test_every_pair_of_edges_links_only_when_equal() {
  let edges = [EdgeType::NoEdge, EdgeType::Stream, EdgeType::Batch, EdgeType::Reduced];
  for produced in edges {
    for wanted in edges {
      let mut parent = ChainNode::new("parent", EdgeType::NoEdge, produced).unwrap();
      parent.assign_id(NodeId(0));
      let parent = Probe(parent);
      let mut child = ChainNode::new("child", wanted, EdgeType::Stream).unwrap();

      let result = child.link_from(&parent);

      if produced == wanted {
        assert!(result.is_ok(), "{produced} -> {wanted} should link");
      } else {
        assert!(
          matches!(result, Err(PipelineError::EdgeMismatch { .. })),
          "{produced} -> {wanted} should be rejected"
        );
      }
    }
  }
}

#[test]
fn test_stage_kind_names() {
  assert_eq!(StageKind::Map.as_str(), "map");
  assert_eq!(StageKind::Reduce.as_str(), "reduce");
  assert_eq!(NodeId(7).to_string(), "#7");
}

/// Minimal stage wrapping a bare chain node.
#[derive(Debug)]
struct Probe(ChainNode);

impl Node for Probe {
  fn chain(&self) -> &ChainNode {
    &self.0
  }

  fn chain_mut(&mut self) -> &mut ChainNode {
    &mut self.0
  }

  fn kind(&self) -> StageKind {
    StageKind::Source
  }

  fn as_any(&self) -> &dyn std::any::Any {
    self
  }

  fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
    self
  }
}
