//! # Map/Reduce Functions
//!
//! Contracts for the user logic carried by map and reduce stages.
//!
//! A [`MapFunction`] is applied independently to each partition of a window and
//! returns an opaque [`Partial`]. A [`ReduceFunction`] receives every partial of
//! the window at once and returns the reduced values. The two halves of a pair
//! agree privately on the concrete partial type; the runtime never looks inside.
//!
//! Each reduce function declares a [`ReduceCategory`]. The runtime uses it to
//! decide which timestamp a reduced value is emitted with (see [`crate::time`]).
//!
//! ## Closure Adapters
//!
//! ```rust
//! use chainweave::functions::{Partial, ReduceCategory, ReducedValue, map_function, reduce_function};
//! use std::sync::Arc;
//!
//! let map = map_function("len", |partition| Ok(Arc::new(partition.len()) as Partial));
//! let reduce = reduce_function("len", ReduceCategory::Aggregator, |partials| {
//!   let total: usize = partials
//!     .into_iter()
//!     .filter_map(|p| p.downcast::<usize>().ok())
//!     .map(|n| *n)
//!     .sum();
//!   Ok(vec![ReducedValue::new(total as f64)])
//! });
//! ```

pub mod builtin;
pub mod registry;

pub use registry::{FunctionArgs, FunctionFactory, FunctionRegistry};

use crate::edge::EdgeType;
use crate::error::FunctionError;
use crate::point::Point;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Opaque per-partition output of a map function.
pub type Partial = Arc<dyn Any + Send + Sync>;

/// Shared handle to a map function.
pub type MapFn = Arc<dyn MapFunction>;

/// Shared handle to a reduce function.
pub type ReduceFn = Arc<dyn ReduceFunction>;

/// Whether a reduce function picks existing points or computes new values.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReduceCategory {
  /// Outputs existing input points unchanged (first, last, top, ...).
  Selector,
  /// Computes values with no single corresponding input point (sum, mean, ...).
  Aggregator,
}

/// One value produced by a reduce function.
#[derive(Clone, Debug, PartialEq)]
pub struct ReducedValue {
  /// The value.
  pub value: f64,
  /// Tags of the selected point, if any.
  pub tags: BTreeMap<String, String>,
  /// Original time of the selected point. Only selectors set this.
  pub point_time: Option<DateTime<Utc>>,
}

impl ReducedValue {
  /// Creates an aggregated value with no point time.
  pub fn new(value: f64) -> Self {
    Self {
      value,
      tags: BTreeMap::new(),
      point_time: None,
    }
  }

  /// Creates a value selected from `point`, keeping its time and tags.
  pub fn selected(point: &Point, value: f64) -> Self {
    Self {
      value,
      tags: point.tags.clone(),
      point_time: Some(point.time),
    }
  }
}

/// Per-partition transform.
///
/// Implementations must be safe to invoke concurrently, once per partition, with
/// no shared mutable state between invocations.
#[async_trait]
pub trait MapFunction: Send + Sync {
  /// Returns the function name.
  fn name(&self) -> &str;

  /// Maps one partition to a partial result.
  async fn apply(&self, partition: Vec<Point>) -> Result<Partial, FunctionError>;
}

/// Aggregation or selection over every partial of a window.
#[async_trait]
pub trait ReduceFunction: Send + Sync {
  /// Returns the function name. Also used as the output field name.
  fn name(&self) -> &str;

  /// Returns whether this function selects points or aggregates them.
  fn category(&self) -> ReduceCategory;

  /// Reduces the partials of one window.
  ///
  /// An empty result means the window produced nothing (e.g. no point carried
  /// the requested field).
  async fn apply(&self, partials: Vec<Partial>) -> Result<Vec<ReducedValue>, FunctionError>;
}

/// Wrapper type that implements MapFunction for closures.
struct MapFunctionWrapper<F> {
  name: String,
  function: F,
}

#[async_trait]
impl<F> MapFunction for MapFunctionWrapper<F>
where
  F: Fn(Vec<Point>) -> Result<Partial, FunctionError> + Send + Sync,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn apply(&self, partition: Vec<Point>) -> Result<Partial, FunctionError> {
    (self.function)(partition)
  }
}

/// Wrapper type that implements ReduceFunction for closures.
struct ReduceFunctionWrapper<F> {
  name: String,
  category: ReduceCategory,
  function: F,
}

#[async_trait]
impl<F> ReduceFunction for ReduceFunctionWrapper<F>
where
  F: Fn(Vec<Partial>) -> Result<Vec<ReducedValue>, FunctionError> + Send + Sync,
{
  fn name(&self) -> &str {
    &self.name
  }

  fn category(&self) -> ReduceCategory {
    self.category
  }

  async fn apply(&self, partials: Vec<Partial>) -> Result<Vec<ReducedValue>, FunctionError> {
    (self.function)(partials)
  }
}

/// Creates a [`MapFn`] from a closure.
pub fn map_function<F>(name: impl Into<String>, function: F) -> MapFn
where
  F: Fn(Vec<Point>) -> Result<Partial, FunctionError> + Send + Sync + 'static,
{
  Arc::new(MapFunctionWrapper {
    name: name.into(),
    function,
  })
}

/// Creates a [`ReduceFn`] from a closure.
pub fn reduce_function<F>(name: impl Into<String>, category: ReduceCategory, function: F) -> ReduceFn
where
  F: Fn(Vec<Partial>) -> Result<Vec<ReducedValue>, FunctionError> + Send + Sync + 'static,
{
  Arc::new(ReduceFunctionWrapper {
    name: name.into(),
    category,
    function,
  })
}

/// A matched map/reduce pair and the edge type its reduce stage produces.
#[derive(Clone)]
pub struct MapReduceInfo {
  /// The map half.
  pub map: MapFn,
  /// The reduce half.
  pub reduce: ReduceFn,
  /// Edge type the reduce stage produces.
  pub edge: EdgeType,
}

impl MapReduceInfo {
  /// Pairs `map` and `reduce`; results continue downstream as a stream.
  pub fn new(map: MapFn, reduce: ReduceFn) -> Self {
    Self {
      map,
      reduce,
      edge: EdgeType::Stream,
    }
  }

  /// Sets the edge type the reduce stage produces.
  pub fn with_edge(mut self, edge: EdgeType) -> Self {
    self.edge = edge;
    self
  }

  /// Returns the reduce function's category.
  pub fn category(&self) -> ReduceCategory {
    self.reduce.category()
  }
}

impl fmt::Debug for MapReduceInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MapReduceInfo")
      .field("map", &self.map.name())
      .field("reduce", &self.reduce.name())
      .field("category", &self.reduce.category())
      .field("edge", &self.edge)
      .finish()
  }
}

#[cfg(test)]
mod registry_test;
