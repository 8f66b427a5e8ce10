//! # Map/Reduce Execution
//!
//! Runs one map/reduce pair over windowed batches.
//!
//! For every window the executor:
//!
//! 1. splits the batch into partitions ([`PartitionStrategy`])
//! 2. spawns one map task per partition, at most `max_concurrent_maps` at a time
//! 3. waits for every map task of the window to finish
//! 4. invokes the reduce function exactly once with all partials
//! 5. stamps each reduced value via [`emit_time`]
//!
//! Map tasks of one window may run in parallel. The reduce for a window never
//! starts before all of that window's map tasks have completed, and windows are
//! processed one after another.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chainweave::execution::{ExecutorConfig, MapReduceExecutor};
//! use chainweave::edge::EdgeType;
//! use chainweave::functions::builtin;
//! use chainweave::nodes::{MapStage, ReduceStage};
//! use chainweave::point::Batch;
//! use chrono::Utc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let sum = builtin::sum("value");
//! let map = MapStage::new(EdgeType::Batch, sum.map)?;
//! let reduce = ReduceStage::new(sum.reduce, EdgeType::Stream)?;
//!
//! let executor = MapReduceExecutor::new(&map, &reduce, ExecutorConfig::default());
//! let reduced = executor.reduce_window(&Batch::new("cpu", Utc::now())).await?;
//! assert!(reduced.points.is_empty());
//! # Ok(())
//! # }
//! ```

use crate::error::ExecutionError;
use crate::functions::{MapFn, Partial, ReduceCategory, ReduceFn};
use crate::nodes::{MapStage, ReduceStage};
use crate::partitioning::PartitionStrategy;
use crate::point::{Batch, Point};
use crate::time::emit_time;
use async_stream::stream;
use futures::{StreamExt, TryStreamExt, stream as futures_stream};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tracing::{debug, trace};

/// Stream of reduced windows.
pub type ReducedStream = Pin<Box<dyn Stream<Item = Result<Batch, ExecutionError>> + Send>>;

/// Runtime settings for a [`MapReduceExecutor`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
  /// How each window is split among map tasks.
  pub partitioning: PartitionStrategy,
  /// Upper bound on map tasks running at once for one window. `0` is treated as `1`.
  pub max_concurrent_maps: usize,
}

impl ExecutorConfig {
  /// Creates the default configuration.
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the partitioning strategy.
  pub fn with_partitioning(mut self, partitioning: PartitionStrategy) -> Self {
    self.partitioning = partitioning;
    self
  }

  /// Sets the map concurrency bound.
  pub fn with_max_concurrent_maps(mut self, n: usize) -> Self {
    self.max_concurrent_maps = n;
    self
  }
}

impl Default for ExecutorConfig {
  fn default() -> Self {
    Self {
      partitioning: PartitionStrategy::default(),
      max_concurrent_maps: 8,
    }
  }
}

/// A spawned map task, aborted if dropped before it completes.
struct MapTask<T>(JoinHandle<T>);

impl<T> Drop for MapTask<T> {
  fn drop(&mut self) {
    self.0.abort();
  }
}

/// Executes one map stage and the reduce stage that follows it.
#[derive(Clone)]
pub struct MapReduceExecutor {
  map: MapFn,
  reduce: ReduceFn,
  point_times: bool,
  config: ExecutorConfig,
}

impl MapReduceExecutor {
  /// Creates an executor for `map` followed by `reduce`.
  pub fn new(map: &MapStage, reduce: &ReduceStage, config: ExecutorConfig) -> Self {
    debug!(
      map = map.map_function().name(),
      reduce = reduce.reduce_function().name(),
      category = ?reduce.category(),
      point_times = reduce.point_times(),
      "created map/reduce executor"
    );
    Self {
      map: map.map_function().clone(),
      reduce: reduce.reduce_function().clone(),
      point_times: reduce.point_times(),
      config,
    }
  }

  /// Returns the executor's configuration.
  pub fn config(&self) -> &ExecutorConfig {
    &self.config
  }

  /// Reduces one window.
  ///
  /// The output batch keeps the input's name, tags and window time. Each point
  /// carries one field named after the reduce function.
  ///
  /// # Errors
  ///
  /// - [`ExecutionError::Map`] if any partition fails to map; the reduce is not run
  /// - [`ExecutionError::Task`] if a map task panics
  /// - [`ExecutionError::Reduce`] if the reduce function fails
  pub async fn reduce_window(&self, batch: &Batch) -> Result<Batch, ExecutionError> {
    let partitions = self.config.partitioning.split(batch);
    trace!(
      batch = %batch.name,
      points = batch.len(),
      partitions = partitions.len(),
      "mapping window"
    );

    let partials = self.map_partitions(partitions).await?;

    let reduced = self
      .reduce
      .apply(partials)
      .await
      .map_err(|source| ExecutionError::Reduce {
        function: self.reduce.name().to_string(),
        source,
      })?;

    let category = self.reduce.category();
    let field = self.reduce.name().to_string();
    let points = reduced
      .into_iter()
      .map(|value| Point {
        time: emit_time(category, self.point_times, batch.tmax, value.point_time),
        tags: value.tags,
        fields: [(field.clone(), value.value)].into_iter().collect(),
      })
      .collect::<Vec<_>>();

    debug!(
      batch = %batch.name,
      tmax = %batch.tmax,
      values = points.len(),
      point_times = self.point_times && category == ReduceCategory::Selector,
      "reduced window"
    );

    Ok(Batch {
      name: batch.name.clone(),
      tmax: batch.tmax,
      tags: batch.tags.clone(),
      points,
    })
  }

  /// Runs the map function over every partition and returns the partials in
  /// partition order once all of them are done.
  ///
  /// On the first failure the window's remaining map tasks are aborted.
  async fn map_partitions(&self, partitions: Vec<Vec<Point>>) -> Result<Vec<Partial>, ExecutionError> {
    let limit = self.config.max_concurrent_maps.max(1);
    futures_stream::iter(partitions.into_iter().enumerate())
      .map(|(index, partition)| {
        let map = self.map.clone();
        async move {
          let mut task = MapTask(tokio::spawn(async move {
            let result = map.apply(partition).await;
            (map, result)
          }));
          match (&mut task.0).await {
            Ok((map, result)) => result.map_err(|source| ExecutionError::Map {
              function: map.name().to_string(),
              partition: index,
              source,
            }),
            Err(e) => Err(ExecutionError::Task(e.to_string())),
          }
        }
      })
      .buffered(limit)
      .try_collect()
      .await
  }

  /// Reduces every batch of `input` in order.
  ///
  /// An error is yielded in place of the failed window; later windows are still
  /// processed.
  pub fn run<S>(self, input: S) -> ReducedStream
  where
    S: Stream<Item = Batch> + Send + 'static,
  {
    Box::pin(stream! {
      let mut input = Box::pin(input);
      while let Some(batch) = input.next().await {
        yield self.reduce_window(&batch).await;
      }
    })
  }
}
