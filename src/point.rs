//! Data points and the windowed batches that map/reduce stages consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single timestamped observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
  /// When the observation was made.
  pub time: DateTime<Utc>,
  /// Indexed string metadata.
  #[serde(default)]
  pub tags: BTreeMap<String, String>,
  /// Numeric values keyed by field name.
  #[serde(default)]
  pub fields: BTreeMap<String, f64>,
}

impl Point {
  /// Creates a point with no tags or fields.
  pub fn new(time: DateTime<Utc>) -> Self {
    Self {
      time,
      tags: BTreeMap::new(),
      fields: BTreeMap::new(),
    }
  }

  /// Adds a field.
  pub fn with_field(mut self, name: impl Into<String>, value: f64) -> Self {
    self.fields.insert(name.into(), value);
    self
  }

  /// Adds a tag.
  pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.tags.insert(key.into(), value.into());
    self
  }

  /// Returns the value of `field`, if present.
  pub fn field(&self, field: &str) -> Option<f64> {
    self.fields.get(field).copied()
  }

  /// Returns the value of `tag`, if present.
  pub fn tag(&self, tag: &str) -> Option<&str> {
    self.tags.get(tag).map(String::as_str)
  }
}

/// A bounded, time-ordered group of points: one window.
///
/// `tmax` is the window's timestamp. Aggregated results are always stamped with
/// it; selected results are stamped with it unless point times were requested.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Batch {
  /// Measurement name.
  pub name: String,
  /// Window timestamp.
  pub tmax: DateTime<Utc>,
  /// Tags shared by the whole batch.
  #[serde(default)]
  pub tags: BTreeMap<String, String>,
  /// The points in the window.
  #[serde(default)]
  pub points: Vec<Point>,
}

impl Batch {
  /// Creates an empty batch.
  pub fn new(name: impl Into<String>, tmax: DateTime<Utc>) -> Self {
    Self {
      name: name.into(),
      tmax,
      tags: BTreeMap::new(),
      points: Vec::new(),
    }
  }

  /// Appends points.
  pub fn with_points(mut self, points: impl IntoIterator<Item = Point>) -> Self {
    self.points.extend(points);
    self
  }

  /// Adds a batch-level tag.
  pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.tags.insert(key.into(), value.into());
    self
  }

  /// Returns the number of points.
  pub fn len(&self) -> usize {
    self.points.len()
  }

  /// Returns whether the batch holds no points.
  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }
}
