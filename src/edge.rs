//! # Edge Types
//!
//! Every stage declares the shape of data it *wants* on its input edge and the
//! shape it *produces* on its output edge. Attaching a stage to a parent is only
//! legal when the parent's produced edge equals the child's wanted edge; there
//! is no implicit coercion between edge types.
//!
//! ```rust
//! use chainweave::edge::EdgeType;
//!
//! assert!(EdgeType::is_compatible(EdgeType::Batch, EdgeType::Batch));
//! assert!(!EdgeType::is_compatible(EdgeType::Stream, EdgeType::Batch));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// The unit of data carried by a connection between two stages.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
  /// No upstream edge. Only root stages want this.
  NoEdge,
  /// Unbounded sequence of individual points.
  Stream,
  /// Bounded, time-ordered collection of points (one window).
  Batch,
  /// Per-partition map output awaiting a reduce stage.
  #[serde(rename = "reduce")]
  Reduced,
}

/// The edge a map stage always produces and a reduce stage always wants.
pub const PRE_REDUCE_EDGE: EdgeType = EdgeType::Reduced;

impl EdgeType {
  /// Returns whether a stage producing `produced` may feed a stage wanting `wanted`.
  #[inline]
  pub fn is_compatible(produced: EdgeType, wanted: EdgeType) -> bool {
    produced == wanted
  }

  /// Returns the lowercase name used in diagnostics.
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::NoEdge => "noedge",
      Self::Stream => "stream",
      Self::Batch => "batch",
      Self::Reduced => "reduce",
    }
  }
}

impl fmt::Display for EdgeType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
