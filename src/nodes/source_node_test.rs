//! # Source Stage Test Suite

use crate::edge::EdgeType;
use crate::error::PipelineError;
use crate::node::{Node, StageKind};
use crate::nodes::source_node::SourceStage;

#[test]
fn test_stream_source() {
  let source = SourceStage::stream("cpu").unwrap();
  assert_eq!(source.name(), "stream");
  assert_eq!(source.measurement(), "cpu");
  assert_eq!(source.wants(), EdgeType::NoEdge);
  assert_eq!(source.produces(), EdgeType::Stream);
  assert_eq!(source.kind(), StageKind::Source);
}

#[test]
fn test_batch_source() {
  let source = SourceStage::batch("mem").unwrap();
  assert_eq!(source.name(), "batch");
  assert_eq!(source.produces(), EdgeType::Batch);
}

#[test]
fn test_source_requires_measurement() {
  assert_eq!(
    SourceStage::stream("").unwrap_err(),
    PipelineError::InvalidName(String::new())
  );
  assert!(SourceStage::batch(" ").is_err());
}
