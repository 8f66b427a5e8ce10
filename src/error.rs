//! # Error Types
//!
//! Errors raised while declaring a pipeline ([`PipelineError`]), inside a user
//! supplied map or reduce function ([`FunctionError`]), and while the map/reduce
//! runtime processes a window ([`ExecutionError`]).
//!
//! Every [`PipelineError`] is a construction-time error: it is fatal to pipeline
//! assembly and there is nothing to retry. Construction of a stage is atomic, so
//! a failed call never leaves a partially linked stage behind.

use crate::edge::EdgeType;
use crate::node::NodeId;
use thiserror::Error;

/// Error raised while building a pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
  /// The parent's produced edge does not equal the child's wanted edge.
  #[error("edge mismatch: {child} wants a {wants} edge but {parent} produces a {produces} edge")]
  EdgeMismatch {
    /// Name of the upstream stage.
    parent: String,
    /// Name of the stage being attached.
    child: String,
    /// Edge type produced by the parent.
    produces: EdgeType,
    /// Edge type wanted by the child.
    wants: EdgeType,
  },
  /// A required map or reduce function is missing or malformed.
  #[error("invalid function: {0}")]
  InvalidFunction(String),
  /// A stage was given an empty name.
  #[error("invalid stage name: {0:?}")]
  InvalidName(String),
  /// No stage with this id exists in the pipeline.
  #[error("unknown node: {0}")]
  UnknownNode(NodeId),
  /// The parent stage has not been inserted into a pipeline yet.
  #[error("cannot link from {0}: it is not part of a pipeline")]
  UnattachedParent(String),
  /// The stage was already linked to a parent before being added.
  #[error("stage {0} is already linked; add it to a pipeline before linking")]
  AlreadyLinked(String),
  /// A reduce stage has no map stage above it.
  #[error("reduce stage {0} has no map parent")]
  MissingMapParent(NodeId),
  /// The stage exists but is not of the requested kind.
  #[error("node {id} is not a {expected} stage")]
  WrongStageKind {
    /// The offending stage.
    id: NodeId,
    /// The kind the caller asked for.
    expected: &'static str,
  },
  /// `build` was called before any stage was declared.
  #[error("pipeline {0:?} has no stages")]
  EmptyPipeline(String),
}

/// Error returned by a map or reduce function.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FunctionError {
  /// A reduce function received a partial it does not understand.
  #[error("{function} received a partial of an unexpected type")]
  UnexpectedPartial {
    /// Name of the reduce function.
    function: String,
  },
  /// Any other function-specific failure.
  #[error("{0}")]
  Failed(String),
}

/// Error raised by the map/reduce runtime while processing a window.
#[derive(Error, Debug)]
pub enum ExecutionError {
  /// A map invocation failed on one partition.
  #[error("map function {function} failed on partition {partition}: {source}")]
  Map {
    /// Name of the map function.
    function: String,
    /// Index of the partition within the window.
    partition: usize,
    /// Underlying function error.
    #[source]
    source: FunctionError,
  },
  /// The reduce invocation failed.
  #[error("reduce function {function} failed: {source}")]
  Reduce {
    /// Name of the reduce function.
    function: String,
    /// Underlying function error.
    #[source]
    source: FunctionError,
  },
  /// A map task panicked or was cancelled.
  #[error("map task failed: {0}")]
  Task(String),
}
