//! # Map Stage
//!
//! Applies a map function independently to each partition of the data reaching
//! it. A map stage always feeds a reduce stage, so its produced edge is fixed to
//! [`PRE_REDUCE_EDGE`]; only the wanted edge is chosen by the caller, and it is
//! validated when the stage is linked, not here.
//!
//! The map function is set once at construction and never replaced.

use crate::edge::{EdgeType, PRE_REDUCE_EDGE};
use crate::error::PipelineError;
use crate::functions::MapFn;
use crate::node::{ChainNode, StageKind, impl_node};
use std::fmt;

/// A per-partition transform stage.
#[derive(Clone)]
pub struct MapStage {
  chain: ChainNode,
  map: MapFn,
}

impl MapStage {
  /// Creates a map stage wanting `wants`.
  ///
  /// The function is stored as-is; checking it against the payload of the
  /// incoming edge is left to the runtime.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::InvalidFunction`] if the function has an empty name.
  pub fn new(wants: EdgeType, map: MapFn) -> Result<Self, PipelineError> {
    if map.name().trim().is_empty() {
      return Err(PipelineError::InvalidFunction(
        "map function has no name".to_string(),
      ));
    }
    Ok(Self {
      chain: ChainNode::named("map", wants, PRE_REDUCE_EDGE),
      map,
    })
  }

  /// Returns the map function for the runtime to invoke.
  pub fn map_function(&self) -> &MapFn {
    &self.map
  }
}

impl fmt::Debug for MapStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MapStage")
      .field("chain", &self.chain)
      .field("map", &self.map.name())
      .finish()
  }
}

impl_node!(MapStage, StageKind::Map);
