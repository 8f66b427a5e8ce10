//! # Pipeline
//!
//! [`PipelineBuilder`] declares a pipeline stage by stage; [`Pipeline`] is the
//! immutable result.
//!
//! The builder owns every stage in an arena indexed by [`NodeId`]. Each attach
//! call builds the new stage, links it to its parent through
//! [`Node::link_from`], and only then inserts it, so a failed attach leaves the
//! builder unchanged.
//!
//! Stage configuration (for example [`ReduceStage::use_point_times`]) is only
//! reachable through the builder. Once [`PipelineBuilder::build`] returns, the
//! graph can no longer change.
//!
//! Construction is synchronous and performs no I/O. The builder has no internal
//! locking; share it across threads only behind external synchronisation.
//!
//! ## Example
//!
//! ```rust
//! use chainweave::edge::EdgeType;
//! use chainweave::functions::builtin;
//! use chainweave::pipeline::PipelineBuilder;
//! use std::time::Duration;
//!
//! let mut builder = PipelineBuilder::new("cpu_usage");
//! let source = builder.stream("cpu").unwrap();
//! let window = builder
//!   .window(source, Duration::from_secs(10), Duration::from_secs(10))
//!   .unwrap();
//!
//! let first = builtin::first("value");
//! let stages = builder
//!   .map_reduce(window, first.map, first.reduce, EdgeType::Stream)
//!   .unwrap();
//! builder.reduce_stage_mut(stages.reduce).unwrap().use_point_times();
//!
//! let pipeline = builder.build().unwrap();
//! assert!(pipeline.reduce_stage(stages.reduce).unwrap().point_times());
//! ```

use crate::edge::EdgeType;
use crate::error::PipelineError;
use crate::execution::{ExecutorConfig, MapReduceExecutor};
use crate::functions::{MapFn, MapReduceInfo, ReduceFn};
use crate::node::{Node, NodeId, StageKind};
use crate::nodes::{MapStage, ReduceStage, SourceStage, WindowStage};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Ids of the two stages created by [`PipelineBuilder::map_reduce`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MapReduceStages {
  /// The map stage.
  pub map: NodeId,
  /// The reduce stage, a child of `map`.
  pub reduce: NodeId,
}

/// Stage storage shared by the builder and the built pipeline.
#[derive(Default)]
struct Arena {
  nodes: Vec<Box<dyn Node>>,
  children: Vec<Vec<NodeId>>,
}

impl Arena {
  fn get(&self, id: NodeId) -> Result<&dyn Node, PipelineError> {
    self
      .nodes
      .get(id.0)
      .map(|n| &**n)
      .ok_or(PipelineError::UnknownNode(id))
  }

  fn get_mut(&mut self, id: NodeId) -> Result<&mut (dyn Node + 'static), PipelineError> {
    self
      .nodes
      .get_mut(id.0)
      .map(|n| &mut **n)
      .ok_or(PipelineError::UnknownNode(id))
  }

  fn downcast<T: Node>(&self, id: NodeId, expected: StageKind) -> Result<&T, PipelineError> {
    self
      .get(id)?
      .as_any()
      .downcast_ref::<T>()
      .ok_or(PipelineError::WrongStageKind {
        id,
        expected: expected.as_str(),
      })
  }

  fn insert(&mut self, mut node: Box<dyn Node>) -> NodeId {
    let id = NodeId(self.nodes.len());
    node.chain_mut().assign_id(id);
    for parent in node.parents() {
      self.children[parent.0].push(id);
    }
    debug!(
      id = %id,
      stage = node.name(),
      wants = %node.wants(),
      produces = %node.produces(),
      "added stage"
    );
    self.nodes.push(node);
    self.children.push(Vec::new());
    id
  }

  /// Links `node` to `parent` and inserts it. `node` must not be linked yet.
  fn attach(&mut self, parent: NodeId, mut node: Box<dyn Node>) -> Result<NodeId, PipelineError> {
    if !node.parents().is_empty() {
      return Err(PipelineError::AlreadyLinked(node.name().to_string()));
    }
    node.link_from(self.get(parent)?)?;
    Ok(self.insert(node))
  }
}

/// Builder for a pipeline of typed stages.
pub struct PipelineBuilder {
  name: String,
  arena: Arena,
}

impl PipelineBuilder {
  /// Creates an empty builder.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      arena: Arena::default(),
    }
  }

  /// Adds a root stage emitting a stream of `measurement`.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::InvalidName`] if `measurement` is empty.
  pub fn stream(&mut self, measurement: impl Into<String>) -> Result<NodeId, PipelineError> {
    let source = SourceStage::stream(measurement)?;
    Ok(self.arena.insert(Box::new(source)))
  }

  /// Adds a root stage emitting batches of `measurement`.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::InvalidName`] if `measurement` is empty.
  pub fn batch(&mut self, measurement: impl Into<String>) -> Result<NodeId, PipelineError> {
    let source = SourceStage::batch(measurement)?;
    Ok(self.arena.insert(Box::new(source)))
  }

  /// Attaches a window stage to `parent`.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::EdgeMismatch`] unless `parent` produces a stream.
  pub fn window(
    &mut self,
    parent: NodeId,
    period: Duration,
    every: Duration,
  ) -> Result<NodeId, PipelineError> {
    self.add_stage(parent, WindowStage::new(period, every))
  }

  /// Links `stage` to `parent` and adds it to the pipeline.
  ///
  /// Nothing is added if linking fails.
  ///
  /// # Errors
  ///
  /// - [`PipelineError::AlreadyLinked`] if `stage` already has parents
  /// - [`PipelineError::UnknownNode`] if `parent` does not exist
  /// - [`PipelineError::EdgeMismatch`] if the edge types differ
  pub fn add_stage<N: Node>(&mut self, parent: NodeId, stage: N) -> Result<NodeId, PipelineError> {
    self.arena.attach(parent, Box::new(stage))
  }

  /// Attaches a map stage and a reduce stage below `parent`.
  ///
  /// The map stage wants whatever `parent` produces; the reduce stage wants the
  /// map stage's pre-reduce edge and produces `produces`. Both stages are added
  /// or neither is.
  ///
  /// # Errors
  ///
  /// - [`PipelineError::UnknownNode`] if `parent` does not exist
  /// - [`PipelineError::InvalidFunction`] if either function is malformed
  /// - [`PipelineError::EdgeMismatch`] if either link fails
  pub fn map_reduce(
    &mut self,
    parent: NodeId,
    map: MapFn,
    reduce: ReduceFn,
    produces: EdgeType,
  ) -> Result<MapReduceStages, PipelineError> {
    let upstream = self.arena.get(parent)?;
    let mut map_stage = MapStage::new(upstream.produces(), map)?;
    let mut reduce_stage = ReduceStage::new(reduce, produces)?;

    map_stage.link_from(upstream)?;
    let map = self.arena.insert(Box::new(map_stage));
    let linked = match self.arena.get(map) {
      Ok(map_node) => reduce_stage.link_from(map_node),
      Err(e) => Err(e),
    };
    if let Err(e) = linked {
      self.remove_last(map);
      return Err(e);
    }
    let reduce = self.arena.insert(Box::new(reduce_stage));
    Ok(MapReduceStages { map, reduce })
  }

  /// Attaches a map/reduce pair built by a function registry.
  ///
  /// # Errors
  ///
  /// See [`PipelineBuilder::map_reduce`].
  pub fn map_reduce_info(
    &mut self,
    parent: NodeId,
    info: MapReduceInfo,
  ) -> Result<MapReduceStages, PipelineError> {
    self.map_reduce(parent, info.map, info.reduce, info.edge)
  }

  /// Returns a stage.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::UnknownNode`] if `id` does not exist.
  pub fn node(&self, id: NodeId) -> Result<&dyn Node, PipelineError> {
    self.arena.get(id)
  }

  /// Returns a map stage.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::WrongStageKind`] if `id` is not a map stage.
  pub fn map_stage(&self, id: NodeId) -> Result<&MapStage, PipelineError> {
    self.arena.downcast(id, StageKind::Map)
  }

  /// Returns a reduce stage.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::WrongStageKind`] if `id` is not a reduce stage.
  pub fn reduce_stage(&self, id: NodeId) -> Result<&ReduceStage, PipelineError> {
    self.arena.downcast(id, StageKind::Reduce)
  }

  /// Returns a reduce stage for configuration before the pipeline is built.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::WrongStageKind`] if `id` is not a reduce stage.
  pub fn reduce_stage_mut(&mut self, id: NodeId) -> Result<&mut ReduceStage, PipelineError> {
    self
      .arena
      .get_mut(id)?
      .as_any_mut()
      .downcast_mut::<ReduceStage>()
      .ok_or(PipelineError::WrongStageKind {
        id,
        expected: StageKind::Reduce.as_str(),
      })
  }

  /// Returns the number of stages declared so far.
  pub fn len(&self) -> usize {
    self.arena.nodes.len()
  }

  /// Returns whether no stage has been declared.
  pub fn is_empty(&self) -> bool {
    self.arena.nodes.is_empty()
  }

  /// Finalizes the pipeline.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::EmptyPipeline`] if no stage was declared.
  pub fn build(self) -> Result<Pipeline, PipelineError> {
    if self.arena.nodes.is_empty() {
      return Err(PipelineError::EmptyPipeline(self.name));
    }
    debug!(pipeline = %self.name, stages = self.arena.nodes.len(), "built pipeline");
    Ok(Pipeline {
      name: self.name,
      arena: self.arena,
    })
  }

  /// Undoes the most recent insert of `id`.
  fn remove_last(&mut self, id: NodeId) {
    if let Some(node) = self.arena.nodes.pop() {
      for parent in node.parents() {
        self.arena.children[parent.0].retain(|child| *child != id);
      }
      self.arena.children.pop();
    }
  }
}

impl fmt::Debug for PipelineBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PipelineBuilder")
      .field("name", &self.name)
      .field("stages", &self.arena.nodes)
      .finish()
  }
}

/// A finalized, immutable pipeline.
pub struct Pipeline {
  name: String,
  arena: Arena,
}

impl Pipeline {
  /// Returns the pipeline name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Returns the number of stages.
  pub fn len(&self) -> usize {
    self.arena.nodes.len()
  }

  /// Always false: a built pipeline has at least one stage.
  pub fn is_empty(&self) -> bool {
    self.arena.nodes.is_empty()
  }

  /// Returns a stage.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::UnknownNode`] if `id` does not exist.
  pub fn node(&self, id: NodeId) -> Result<&dyn Node, PipelineError> {
    self.arena.get(id)
  }

  /// Returns a map stage.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::WrongStageKind`] if `id` is not a map stage.
  pub fn map_stage(&self, id: NodeId) -> Result<&MapStage, PipelineError> {
    self.arena.downcast(id, StageKind::Map)
  }

  /// Returns a reduce stage.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::WrongStageKind`] if `id` is not a reduce stage.
  pub fn reduce_stage(&self, id: NodeId) -> Result<&ReduceStage, PipelineError> {
    self.arena.downcast(id, StageKind::Reduce)
  }

  /// Returns the children of `id` in attach order.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::UnknownNode`] if `id` does not exist.
  pub fn children(&self, id: NodeId) -> Result<&[NodeId], PipelineError> {
    self
      .arena
      .children
      .get(id.0)
      .map(Vec::as_slice)
      .ok_or(PipelineError::UnknownNode(id))
  }

  /// Returns the ids of the root stages.
  pub fn sources(&self) -> impl Iterator<Item = NodeId> + '_ {
    self
      .arena
      .nodes
      .iter()
      .filter(|n| n.parents().is_empty())
      .filter_map(|n| n.id())
  }

  /// Returns every stage with parents before children.
  ///
  /// Stages are only ever linked to stages inserted before them, so insertion
  /// order is already a topological order.
  pub fn walk(&self) -> impl Iterator<Item = &dyn Node> + '_ {
    self.arena.nodes.iter().map(|n| &**n)
  }

  /// Creates the runtime for the map/reduce pair ending at `reduce`.
  ///
  /// # Errors
  ///
  /// - [`PipelineError::WrongStageKind`] if `reduce` is not a reduce stage or its
  ///   parent is not a map stage
  /// - [`PipelineError::MissingMapParent`] if the reduce stage has no parent
  pub fn executor(
    &self,
    reduce: NodeId,
    config: ExecutorConfig,
  ) -> Result<MapReduceExecutor, PipelineError> {
    let reduce_stage = self.reduce_stage(reduce)?;
    let map = reduce_stage
      .map_parent()
      .ok_or(PipelineError::MissingMapParent(reduce))?;
    let map_stage = self.map_stage(map)?;
    Ok(MapReduceExecutor::new(map_stage, reduce_stage, config))
  }
}

impl fmt::Debug for Pipeline {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Pipeline")
      .field("name", &self.name)
      .field("stages", &self.arena.nodes)
      .finish()
  }
}
