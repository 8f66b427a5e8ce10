//! # ChainWeave
//!
//! Typed-edge chaining for declarative stream and batch pipelines, centred on
//! the map/reduce stage pair.
//!
//! A pipeline is a graph of stages. Every stage declares the edge type it wants
//! and the edge type it produces, and a stage can only be attached below a
//! parent whose produced edge matches. Map/reduce is always attached as a pair:
//! the map stage runs once per partition, the reduce stage runs once per window
//! over every map output.
//!
//! ## Quick Start
//!
//! ```rust
//! use chainweave::edge::EdgeType;
//! use chainweave::functions::{FunctionArgs, FunctionRegistry};
//! use chainweave::pipeline::PipelineBuilder;
//! use std::time::Duration;
//!
//! let registry = FunctionRegistry::with_builtins();
//! let mut builder = PipelineBuilder::new("requests");
//! let source = builder.stream("http").unwrap();
//! let window = builder
//!   .window(source, Duration::from_secs(60), Duration::from_secs(60))
//!   .unwrap();
//!
//! let top = registry
//!   .lookup("top", &FunctionArgs::field("latency").with_limit(3))
//!   .unwrap();
//! let stages = builder.map_reduce_info(window, top).unwrap();
//! builder.reduce_stage_mut(stages.reduce).unwrap().use_point_times();
//!
//! let pipeline = builder.build().unwrap();
//! assert_eq!(pipeline.node(stages.map).unwrap().wants(), EdgeType::Batch);
//! ```

#![deny(missing_docs)]

/// Edge types and their compatibility rule.
pub mod edge;
/// Pipeline construction, execution and function errors.
pub mod error;
/// Map/reduce runtime.
pub mod execution;
/// Map and reduce function contracts, registry and built-ins.
pub mod functions;
/// Chain node base and the `Node` capability.
pub mod node;
/// Concrete pipeline stages.
pub mod nodes;
/// Splitting windows into partitions.
pub mod partitioning;
/// Pipeline builder and finalized pipeline.
pub mod pipeline;
/// Points and batches.
pub mod point;
/// Timestamp policy for reduced values.
pub mod time;

pub use edge::{EdgeType, PRE_REDUCE_EDGE};
pub use error::{ExecutionError, FunctionError, PipelineError};
pub use node::{ChainNode, Node, NodeId, StageKind};
pub use pipeline::{MapReduceStages, Pipeline, PipelineBuilder};

#[cfg(test)]
mod node_test;
#[cfg(test)]
mod pipeline_test;
