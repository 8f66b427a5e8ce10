//! Timestamp policy for reduce output.
//!
//! A reduce stage emits one or more values per window. Which timestamp each
//! value carries depends on two things:
//!
//! - the reduce function's [`ReduceCategory`], declared by the function itself
//! - the reduce stage's point-times flag, set with
//!   [`ReduceStage::use_point_times`](crate::nodes::reduce_node::ReduceStage::use_point_times)
//!
//! | category   | point times | emitted time             |
//! |------------|-------------|--------------------------|
//! | aggregator | either      | window time              |
//! | selector   | false       | window time              |
//! | selector   | true        | time of the selected point |
//!
//! The flag has no effect on aggregators. A selector that reports no point time
//! for a value falls back to the window time.

use crate::functions::ReduceCategory;
use chrono::{DateTime, Utc};

/// Returns the timestamp a reduced value is emitted with.
///
/// # Example
///
/// ```rust
/// use chainweave::functions::ReduceCategory;
/// use chainweave::time::emit_time;
/// use chrono::{TimeZone, Utc};
///
/// let window = Utc.timestamp_opt(100, 0).unwrap();
/// let point = Utc.timestamp_opt(42, 0).unwrap();
///
/// assert_eq!(emit_time(ReduceCategory::Selector, true, window, Some(point)), point);
/// assert_eq!(emit_time(ReduceCategory::Selector, false, window, Some(point)), window);
/// assert_eq!(emit_time(ReduceCategory::Aggregator, true, window, Some(point)), window);
/// ```
#[inline]
pub fn emit_time(
  category: ReduceCategory,
  point_times: bool,
  window_time: DateTime<Utc>,
  point_time: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
  match (category, point_times, point_time) {
    (ReduceCategory::Selector, true, Some(selected)) => selected,
    _ => window_time,
  }
}
