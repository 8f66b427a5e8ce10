//! # Reduce Stage
//!
//! Applies a reduce function once over every map output of a window. The stage
//! wants [`PRE_REDUCE_EDGE`] and produces whatever edge the pipeline author asks
//! for.
//!
//! ## Point Times
//!
//! By default every reduced value is stamped with the window's time. Calling
//! [`ReduceStage::use_point_times`] asks the runtime to stamp values picked by a
//! *selector* (first, last, top, ...) with the time of the selected point
//! instead. *Aggregators* (sum, mean, ...) have no single source point and keep
//! the window time regardless of the flag. The stage only carries the flag; the
//! category comes from the function. See [`crate::time::emit_time`].

use crate::edge::{EdgeType, PRE_REDUCE_EDGE};
use crate::error::PipelineError;
use crate::functions::{ReduceCategory, ReduceFn};
use crate::node::{ChainNode, NodeId, StageKind, impl_node};
use std::fmt;

/// An aggregation or selection stage.
#[derive(Clone)]
pub struct ReduceStage {
  chain: ChainNode,
  reduce: ReduceFn,
  point_times: bool,
}

impl ReduceStage {
  /// Creates a reduce stage producing `produces`.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::InvalidFunction`] if the function has an empty name.
  pub fn new(reduce: ReduceFn, produces: EdgeType) -> Result<Self, PipelineError> {
    if reduce.name().trim().is_empty() {
      return Err(PipelineError::InvalidFunction(
        "reduce function has no name".to_string(),
      ));
    }
    Ok(Self {
      chain: ChainNode::named("reduce", PRE_REDUCE_EDGE, produces),
      reduce,
      point_times: false,
    })
  }

  /// Stamps selected values with the selected point's time instead of the
  /// window time. Has no effect for aggregators. Idempotent.
  pub fn use_point_times(&mut self) -> &mut Self {
    self.point_times = true;
    self
  }

  /// Returns whether point times were requested.
  pub fn point_times(&self) -> bool {
    self.point_times
  }

  /// Returns the reduce function for the runtime to invoke.
  pub fn reduce_function(&self) -> &ReduceFn {
    &self.reduce
  }

  /// Returns the stage this one was linked from, if any.
  pub(crate) fn map_parent(&self) -> Option<NodeId> {
    self.chain.parents().first().copied()
  }

  /// Returns the category declared by the reduce function.
  pub fn category(&self) -> ReduceCategory {
    self.reduce.category()
  }
}

impl fmt::Debug for ReduceStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ReduceStage")
      .field("chain", &self.chain)
      .field("reduce", &self.reduce.name())
      .field("category", &self.reduce.category())
      .field("point_times", &self.point_times)
      .finish()
  }
}

impl_node!(ReduceStage, StageKind::Reduce);
