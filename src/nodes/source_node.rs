//! Root stages: the place data enters a pipeline.

use crate::edge::EdgeType;
use crate::error::PipelineError;
use crate::node::{ChainNode, StageKind, impl_node};

/// A pipeline root producing either a stream or batches.
#[derive(Clone, Debug)]
pub struct SourceStage {
  chain: ChainNode,
  measurement: String,
}

impl SourceStage {
  /// Creates a root emitting individual points of `measurement`.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::InvalidName`] if `measurement` is empty.
  pub fn stream(measurement: impl Into<String>) -> Result<Self, PipelineError> {
    Self::new("stream", measurement.into(), EdgeType::Stream)
  }

  /// Creates a root emitting batches of `measurement`.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::InvalidName`] if `measurement` is empty.
  pub fn batch(measurement: impl Into<String>) -> Result<Self, PipelineError> {
    Self::new("batch", measurement.into(), EdgeType::Batch)
  }

  fn new(
    name: &'static str,
    measurement: String,
    produces: EdgeType,
  ) -> Result<Self, PipelineError> {
    if measurement.trim().is_empty() {
      return Err(PipelineError::InvalidName(measurement));
    }
    Ok(Self {
      chain: ChainNode::named(name, EdgeType::NoEdge, produces),
      measurement,
    })
  }

  /// Returns the measurement this source reads.
  pub fn measurement(&self) -> &str {
    &self.measurement
  }
}

impl_node!(SourceStage, StageKind::Source);
