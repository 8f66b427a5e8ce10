//! # Pipeline Stages
//!
//! Concrete [`Node`](crate::node::Node) variants.
//!
//! | stage | wants | produces |
//! |-------|-------|----------|
//! | [`SourceStage`] | `noedge` | `stream` or `batch` |
//! | [`WindowStage`] | `stream` | `batch` |
//! | [`MapStage`] | upstream edge | `reduce` |
//! | [`ReduceStage`] | `reduce` | caller-chosen |

pub mod map_node;
pub mod reduce_node;
pub mod source_node;
pub mod window_node;

pub use map_node::MapStage;
pub use reduce_node::ReduceStage;
pub use source_node::SourceStage;
pub use window_node::WindowStage;

#[cfg(test)]
mod source_node_test;
