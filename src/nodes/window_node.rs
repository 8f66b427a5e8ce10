//! Window declaration: turns a stream into periodic batches.
//!
//! Only the declaration lives here. How windows are filled and when they fire
//! belongs to the runtime that executes the pipeline.

use crate::edge::EdgeType;
use crate::node::{ChainNode, StageKind, impl_node};
use std::time::Duration;

/// Groups a stream into batches of `period`, emitted every `every`.
#[derive(Clone, Debug)]
pub struct WindowStage {
  chain: ChainNode,
  period: Duration,
  every: Duration,
}

impl WindowStage {
  /// Creates a window stage.
  pub fn new(period: Duration, every: Duration) -> Self {
    Self {
      chain: ChainNode::named("window", EdgeType::Stream, EdgeType::Batch),
      period,
      every,
    }
  }

  /// Returns the window length.
  pub fn period(&self) -> Duration {
    self.period
  }

  /// Returns how often a window is emitted.
  pub fn every(&self) -> Duration {
    self.every
  }
}

impl_node!(WindowStage, StageKind::Window);
