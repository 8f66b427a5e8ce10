//! A small set of built-in map/reduce pairs.
//!
//! Aggregators: [`sum`], [`count`], [`mean`].
//! Selectors: [`first`], [`last`], [`max`], [`min`], [`top`], [`bottom`].
//!
//! Every function reads a single numeric field. Points without that field are
//! skipped. A window in which no point carries the field reduces to nothing.

use crate::error::{FunctionError, PipelineError};
use crate::functions::{MapReduceInfo, Partial, ReduceCategory, ReducedValue};
use crate::functions::{MapFunction, ReduceFunction};
use crate::point::Point;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Sums `field` over the window.
pub fn sum(field: impl Into<String>) -> MapReduceInfo {
  aggregate(AggregateKind::Sum, field.into())
}

/// Counts the points carrying `field`.
pub fn count(field: impl Into<String>) -> MapReduceInfo {
  aggregate(AggregateKind::Count, field.into())
}

/// Averages `field` over the window.
pub fn mean(field: impl Into<String>) -> MapReduceInfo {
  aggregate(AggregateKind::Mean, field.into())
}

/// Selects the earliest point carrying `field`.
pub fn first(field: impl Into<String>) -> MapReduceInfo {
  select(SelectorKind::First, field.into())
}

/// Selects the latest point carrying `field`.
pub fn last(field: impl Into<String>) -> MapReduceInfo {
  select(SelectorKind::Last, field.into())
}

/// Selects the point with the largest `field`; ties go to the earliest point.
pub fn max(field: impl Into<String>) -> MapReduceInfo {
  select(SelectorKind::Max, field.into())
}

/// Selects the point with the smallest `field`; ties go to the earliest point.
pub fn min(field: impl Into<String>) -> MapReduceInfo {
  select(SelectorKind::Min, field.into())
}

/// Selects the `k` points with the largest `field`, largest first.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidFunction`] if `k` is zero.
pub fn top(k: usize, field: impl Into<String>) -> Result<MapReduceInfo, PipelineError> {
  ranked("top", k, field.into(), true)
}

/// Selects the `k` points with the smallest `field`, smallest first.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidFunction`] if `k` is zero.
pub fn bottom(k: usize, field: impl Into<String>) -> Result<MapReduceInfo, PipelineError> {
  ranked("bottom", k, field.into(), false)
}

fn aggregate(kind: AggregateKind, field: String) -> MapReduceInfo {
  let function = Arc::new(Aggregate { kind, field });
  MapReduceInfo::new(function.clone(), function)
}

fn select(kind: SelectorKind, field: String) -> MapReduceInfo {
  let function = Arc::new(Selector { kind, field });
  MapReduceInfo::new(function.clone(), function)
}

fn ranked(
  name: &'static str,
  k: usize,
  field: String,
  largest: bool,
) -> Result<MapReduceInfo, PipelineError> {
  if k == 0 {
    return Err(PipelineError::InvalidFunction(format!(
      "{name} requires a positive number of points"
    )));
  }
  let function = Arc::new(Ranked {
    name,
    k,
    field,
    largest,
  });
  Ok(MapReduceInfo::new(function.clone(), function))
}

/// A point picked by a selector, reduced to what the reduce half needs.
#[derive(Clone, Debug, PartialEq)]
struct Candidate {
  time: DateTime<Utc>,
  value: f64,
  tags: BTreeMap<String, String>,
}

impl Candidate {
  fn from_point(point: &Point, field: &str) -> Option<Self> {
    point.field(field).map(|value| Self {
      time: point.time,
      value,
      tags: point.tags.clone(),
    })
  }

  fn into_reduced(self) -> ReducedValue {
    ReducedValue {
      value: self.value,
      tags: self.tags,
      point_time: Some(self.time),
    }
  }
}

fn downcast<T: Send + Sync + 'static>(partial: Partial, function: &str) -> Result<Arc<T>, FunctionError> {
  partial
    .downcast::<T>()
    .map_err(|_| FunctionError::UnexpectedPartial {
      function: function.to_string(),
    })
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AggregateKind {
  Sum,
  Count,
  Mean,
}

impl AggregateKind {
  fn name(self) -> &'static str {
    match self {
      Self::Sum => "sum",
      Self::Count => "count",
      Self::Mean => "mean",
    }
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Accumulator {
  sum: f64,
  count: u64,
}

struct Aggregate {
  kind: AggregateKind,
  field: String,
}

#[async_trait]
impl MapFunction for Aggregate {
  fn name(&self) -> &str {
    self.kind.name()
  }

  async fn apply(&self, partition: Vec<Point>) -> Result<Partial, FunctionError> {
    let acc = partition
      .iter()
      .filter_map(|p| p.field(&self.field))
      .fold(Accumulator::default(), |acc, v| Accumulator {
        sum: acc.sum + v,
        count: acc.count + 1,
      });
    Ok(Arc::new(acc))
  }
}

#[async_trait]
impl ReduceFunction for Aggregate {
  fn name(&self) -> &str {
    self.kind.name()
  }

  fn category(&self) -> ReduceCategory {
    ReduceCategory::Aggregator
  }

  async fn apply(&self, partials: Vec<Partial>) -> Result<Vec<ReducedValue>, FunctionError> {
    let mut total = Accumulator::default();
    for partial in partials {
      let acc = downcast::<Accumulator>(partial, self.kind.name())?;
      total.sum += acc.sum;
      total.count += acc.count;
    }
    if total.count == 0 {
      return Ok(Vec::new());
    }
    let value = match self.kind {
      AggregateKind::Sum => total.sum,
      AggregateKind::Count => total.count as f64,
      AggregateKind::Mean => total.sum / total.count as f64,
    };
    Ok(vec![ReducedValue::new(value)])
  }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SelectorKind {
  First,
  Last,
  Max,
  Min,
}

impl SelectorKind {
  fn name(self) -> &'static str {
    match self {
      Self::First => "first",
      Self::Last => "last",
      Self::Max => "max",
      Self::Min => "min",
    }
  }

  /// Returns whether `candidate` should replace `current`.
  fn prefers(self, candidate: &Candidate, current: &Candidate) -> bool {
    match self {
      Self::First => candidate.time < current.time,
      Self::Last => candidate.time > current.time,
      Self::Max => match candidate.value.total_cmp(&current.value) {
        Ordering::Greater => true,
        Ordering::Equal => candidate.time < current.time,
        Ordering::Less => false,
      },
      Self::Min => match candidate.value.total_cmp(&current.value) {
        Ordering::Less => true,
        Ordering::Equal => candidate.time < current.time,
        Ordering::Greater => false,
      },
    }
  }

  fn pick(self, candidates: impl IntoIterator<Item = Candidate>) -> Option<Candidate> {
    candidates.into_iter().fold(None, |best, candidate| match best {
      Some(current) if !self.prefers(&candidate, &current) => Some(current),
      _ => Some(candidate),
    })
  }
}

struct Selector {
  kind: SelectorKind,
  field: String,
}

#[async_trait]
impl MapFunction for Selector {
  fn name(&self) -> &str {
    self.kind.name()
  }

  async fn apply(&self, partition: Vec<Point>) -> Result<Partial, FunctionError> {
    let picked = self.kind.pick(
      partition
        .iter()
        .filter_map(|p| Candidate::from_point(p, &self.field)),
    );
    Ok(Arc::new(picked))
  }
}

#[async_trait]
impl ReduceFunction for Selector {
  fn name(&self) -> &str {
    self.kind.name()
  }

  fn category(&self) -> ReduceCategory {
    ReduceCategory::Selector
  }

  async fn apply(&self, partials: Vec<Partial>) -> Result<Vec<ReducedValue>, FunctionError> {
    let mut candidates = Vec::with_capacity(partials.len());
    for partial in partials {
      let picked = downcast::<Option<Candidate>>(partial, self.kind.name())?;
      if let Some(candidate) = &*picked {
        candidates.push(candidate.clone());
      }
    }
    Ok(
      self
        .kind
        .pick(candidates)
        .map(Candidate::into_reduced)
        .into_iter()
        .collect(),
    )
  }
}

struct Ranked {
  name: &'static str,
  k: usize,
  field: String,
  largest: bool,
}

impl Ranked {
  fn rank(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
      let by_value = if self.largest {
        b.value.total_cmp(&a.value)
      } else {
        a.value.total_cmp(&b.value)
      };
      by_value.then(a.time.cmp(&b.time))
    });
    candidates.truncate(self.k);
    candidates
  }
}

#[async_trait]
impl MapFunction for Ranked {
  fn name(&self) -> &str {
    self.name
  }

  async fn apply(&self, partition: Vec<Point>) -> Result<Partial, FunctionError> {
    let candidates = partition
      .iter()
      .filter_map(|p| Candidate::from_point(p, &self.field))
      .collect();
    Ok(Arc::new(self.rank(candidates)))
  }
}

#[async_trait]
impl ReduceFunction for Ranked {
  fn name(&self) -> &str {
    self.name
  }

  fn category(&self) -> ReduceCategory {
    ReduceCategory::Selector
  }

  async fn apply(&self, partials: Vec<Partial>) -> Result<Vec<ReducedValue>, FunctionError> {
    let mut candidates = Vec::new();
    for partial in partials {
      let ranked = downcast::<Vec<Candidate>>(partial, self.name)?;
      candidates.extend(ranked.iter().cloned());
    }
    Ok(
      self
        .rank(candidates)
        .into_iter()
        .map(Candidate::into_reduced)
        .collect(),
    )
  }
}
