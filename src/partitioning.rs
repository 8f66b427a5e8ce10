//! # Partitioning
//!
//! Splits a window into the partitions a map stage processes independently.
//!
//! ## Usage
//!
//! ```rust
//! use chainweave::partitioning::PartitionStrategy;
//! use chainweave::point::{Batch, Point};
//! use chrono::Utc;
//!
//! let now = Utc::now();
//! let batch = Batch::new("cpu", now).with_points([
//!   Point::new(now).with_tag("host", "a"),
//!   Point::new(now).with_tag("host", "b"),
//!   Point::new(now).with_tag("host", "a"),
//! ]);
//!
//! let partitions = PartitionStrategy::ByTag("host".to_string()).split(&batch);
//! assert_eq!(partitions.len(), 2);
//! assert_eq!(partitions[0].len(), 2);
//! ```

use crate::point::{Batch, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Partition key that determines which partition handles a point.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PartitionKey(pub String);

impl PartitionKey {
  /// Creates a new partition key from a string.
  pub fn new(s: String) -> Self {
    Self(s)
  }

  /// Returns the key of `point` for `tag`; a missing tag maps to the empty key.
  pub fn of(point: &Point, tag: &str) -> Self {
    Self(point.tag(tag).unwrap_or_default().to_string())
  }

  /// Returns the key as a string slice.
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<String> for PartitionKey {
  fn from(s: String) -> Self {
    Self(s)
  }
}

impl From<&str> for PartitionKey {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

/// How a window is divided among map invocations.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
  /// The whole window is one partition.
  Single,
  /// Up to `n` contiguous chunks of near-equal size. `0` is treated as `1`.
  Chunks(usize),
  /// One partition per distinct value of a tag, in first-seen order.
  ByTag(String),
}

impl Default for PartitionStrategy {
  fn default() -> Self {
    Self::Chunks(4)
  }
}

impl PartitionStrategy {
  /// Splits the points of `batch`. An empty batch yields no partitions.
  pub fn split(&self, batch: &Batch) -> Vec<Vec<Point>> {
    if batch.is_empty() {
      return Vec::new();
    }
    match self {
      Self::Single => vec![batch.points.clone()],
      Self::Chunks(n) => {
        let n = (*n).clamp(1, batch.len());
        let size = batch.len().div_ceil(n);
        batch.points.chunks(size).map(<[Point]>::to_vec).collect()
      }
      Self::ByTag(tag) => {
        let mut index: HashMap<PartitionKey, usize> = HashMap::new();
        let mut partitions: Vec<Vec<Point>> = Vec::new();
        for point in &batch.points {
          let slot = *index.entry(PartitionKey::of(point, tag)).or_insert_with(|| {
            partitions.push(Vec::new());
            partitions.len() - 1
          });
          partitions[slot].push(point.clone());
        }
        partitions
      }
    }
  }
}
