//! # Chain Nodes
//!
//! Every pipeline stage embeds a [`ChainNode`], which records the stage's name,
//! the edge type it wants, the edge type it produces, and the ids of the stages
//! it was linked from. The pipeline owns every stage; a stage only remembers its
//! parents by [`NodeId`], never by reference.
//!
//! [`Node::link_from`] is the single validation point for the structure of a
//! pipeline: every stage-to-stage attachment goes through it, and it rejects any
//! attachment whose edge types differ.
//!
//! ## Stage Kinds
//!
//! - **Source**: root of a pipeline, wants [`EdgeType::NoEdge`]
//! - **Window**: groups a stream into batches
//! - **Map**: per-partition transform feeding a reduce
//! - **Reduce**: single aggregation or selection over all map outputs

use crate::edge::EdgeType;
use crate::error::PipelineError;
use std::any::Any;
use std::fmt;
use tracing::trace;

/// Position of a stage inside a pipeline's arena.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
  /// Returns the raw index.
  #[inline]
  pub const fn index(self) -> usize {
    self.0
  }
}

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// The concrete variant behind a [`Node`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StageKind {
  /// A root stage.
  Source,
  /// A window declaration.
  Window,
  /// A map stage.
  Map,
  /// A reduce stage.
  Reduce,
}

impl StageKind {
  /// Returns the lowercase kind name.
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Source => "source",
      Self::Window => "window",
      Self::Map => "map",
      Self::Reduce => "reduce",
    }
  }
}

/// Structural state shared by every stage.
#[derive(Clone, Debug)]
pub struct ChainNode {
  name: String,
  id: Option<NodeId>,
  wants: EdgeType,
  produces: EdgeType,
  parents: Vec<NodeId>,
}

impl ChainNode {
  /// Creates a detached chain node.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::InvalidName`] if `name` is empty or only whitespace.
  pub fn new(
    name: impl Into<String>,
    wants: EdgeType,
    produces: EdgeType,
  ) -> Result<Self, PipelineError> {
    let name = name.into();
    if name.trim().is_empty() {
      return Err(PipelineError::InvalidName(name));
    }
    Ok(Self {
      name,
      id: None,
      wants,
      produces,
      parents: Vec::new(),
    })
  }

  /// Creates a detached chain node for a stage with a fixed, non-empty name.
  pub(crate) fn named(name: &'static str, wants: EdgeType, produces: EdgeType) -> Self {
    Self {
      name: name.to_string(),
      id: None,
      wants,
      produces,
      parents: Vec::new(),
    }
  }

  /// Returns the stage name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Returns the id assigned when the stage was inserted, if any.
  pub fn id(&self) -> Option<NodeId> {
    self.id
  }

  /// Returns the edge type this stage accepts.
  pub fn wants(&self) -> EdgeType {
    self.wants
  }

  /// Returns the edge type this stage emits.
  pub fn produces(&self) -> EdgeType {
    self.produces
  }

  /// Returns the ids of the stages this one was linked from.
  pub fn parents(&self) -> &[NodeId] {
    &self.parents
  }

  pub(crate) fn assign_id(&mut self, id: NodeId) {
    self.id = Some(id);
  }

  /// Links this stage to `parent`.
  ///
  /// # Errors
  ///
  /// - [`PipelineError::EdgeMismatch`] if `parent.produces()` differs from `self.wants()`
  /// - [`PipelineError::UnattachedParent`] if `parent` has no id yet
  pub fn link_from(&mut self, parent: &dyn Node) -> Result<(), PipelineError> {
    if !EdgeType::is_compatible(parent.produces(), self.wants) {
      return Err(PipelineError::EdgeMismatch {
        parent: parent.name().to_string(),
        child: self.name.clone(),
        produces: parent.produces(),
        wants: self.wants,
      });
    }
    let parent_id = parent
      .id()
      .ok_or_else(|| PipelineError::UnattachedParent(parent.name().to_string()))?;
    trace!(
      parent = parent.name(),
      child = %self.name,
      edge = %self.wants,
      "linked stage"
    );
    self.parents.push(parent_id);
    Ok(())
  }
}

/// Capability shared by every pipeline stage.
///
/// Implementors only supply access to their embedded [`ChainNode`], their kind,
/// and `Any` views for downcasting; the rest is provided.
pub trait Node: Any + Send + Sync + fmt::Debug {
  /// Returns the embedded chain node.
  fn chain(&self) -> &ChainNode;

  /// Returns the embedded chain node mutably.
  fn chain_mut(&mut self) -> &mut ChainNode;

  /// Returns which variant this stage is.
  fn kind(&self) -> StageKind;

  /// Returns `self` as `Any` for downcasting to the concrete stage.
  fn as_any(&self) -> &dyn Any;

  /// Returns `self` as mutable `Any` for downcasting to the concrete stage.
  fn as_any_mut(&mut self) -> &mut dyn Any;

  /// Returns the stage name.
  fn name(&self) -> &str {
    self.chain().name()
  }

  /// Returns the pipeline id, once inserted.
  fn id(&self) -> Option<NodeId> {
    self.chain().id()
  }

  /// Returns the wanted edge type.
  fn wants(&self) -> EdgeType {
    self.chain().wants()
  }

  /// Returns the produced edge type.
  fn produces(&self) -> EdgeType {
    self.chain().produces()
  }

  /// Returns the parent ids.
  fn parents(&self) -> &[NodeId] {
    self.chain().parents()
  }

  /// Links this stage to `parent`. See [`ChainNode::link_from`].
  fn link_from(&mut self, parent: &dyn Node) -> Result<(), PipelineError> {
    self.chain_mut().link_from(parent)
  }
}

/// Implements the boilerplate half of [`Node`] for a stage with a `chain` field.
macro_rules! impl_node {
  ($ty:ty, $kind:expr) => {
    impl $crate::node::Node for $ty {
      fn chain(&self) -> &$crate::node::ChainNode {
        &self.chain
      }

      fn chain_mut(&mut self) -> &mut $crate::node::ChainNode {
        &mut self.chain
      }

      fn kind(&self) -> $crate::node::StageKind {
        $kind
      }

      fn as_any(&self) -> &dyn ::std::any::Any {
        self
      }

      fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
        self
      }
    }
  };
}

pub(crate) use impl_node;
