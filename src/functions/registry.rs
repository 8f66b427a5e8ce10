//! # Function Registry
//!
//! Maps function names to factories that build a [`MapReduceInfo`], and answers
//! whether a named reduce function is a selector or an aggregator.
//!
//! The category is registered alongside the factory so callers can ask for it
//! without building the function, and every built function must report the same
//! category through [`ReduceFunction::category`](super::ReduceFunction::category);
//! [`FunctionRegistry::lookup`] rejects a factory that disagrees.
//!
//! ```rust
//! use chainweave::functions::{FunctionArgs, FunctionRegistry, ReduceCategory};
//!
//! let registry = FunctionRegistry::with_builtins();
//! assert_eq!(registry.category("first"), Some(ReduceCategory::Selector));
//! assert_eq!(registry.category("sum"), Some(ReduceCategory::Aggregator));
//!
//! let info = registry.lookup("sum", &FunctionArgs::field("value")).unwrap();
//! assert_eq!(info.reduce.name(), "sum");
//! ```

use crate::error::PipelineError;
use crate::functions::builtin;
use crate::functions::{MapReduceInfo, ReduceCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Arguments passed to a registered factory.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FunctionArgs {
  /// Field the function reads.
  pub field: String,
  /// Number of points for ranked selectors such as `top`.
  #[serde(default)]
  pub limit: Option<usize>,
}

impl FunctionArgs {
  /// Arguments naming only a field.
  pub fn field(field: impl Into<String>) -> Self {
    Self {
      field: field.into(),
      limit: None,
    }
  }

  /// Sets the point limit.
  pub fn with_limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }
}

/// Builds a map/reduce pair from arguments.
pub type FunctionFactory =
  Arc<dyn Fn(&FunctionArgs) -> Result<MapReduceInfo, PipelineError> + Send + Sync>;

#[derive(Clone)]
struct Entry {
  category: ReduceCategory,
  factory: FunctionFactory,
}

/// Named map/reduce functions and their categories.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
  entries: BTreeMap<String, Entry>,
}

impl FunctionRegistry {
  /// Creates an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a registry holding the built-in functions.
  pub fn with_builtins() -> Self {
    let mut registry = Self::new();
    registry.register("sum", ReduceCategory::Aggregator, |args| Ok(builtin::sum(&args.field)));
    registry.register("count", ReduceCategory::Aggregator, |args| {
      Ok(builtin::count(&args.field))
    });
    registry.register("mean", ReduceCategory::Aggregator, |args| {
      Ok(builtin::mean(&args.field))
    });
    registry.register("first", ReduceCategory::Selector, |args| {
      Ok(builtin::first(&args.field))
    });
    registry.register("last", ReduceCategory::Selector, |args| Ok(builtin::last(&args.field)));
    registry.register("max", ReduceCategory::Selector, |args| Ok(builtin::max(&args.field)));
    registry.register("min", ReduceCategory::Selector, |args| Ok(builtin::min(&args.field)));
    registry.register("top", ReduceCategory::Selector, |args| {
      builtin::top(required_limit("top", args)?, &args.field)
    });
    registry.register("bottom", ReduceCategory::Selector, |args| {
      builtin::bottom(required_limit("bottom", args)?, &args.field)
    });
    registry
  }

  /// Registers `factory` under `name`, replacing any earlier registration.
  pub fn register<F>(&mut self, name: impl Into<String>, category: ReduceCategory, factory: F)
  where
    F: Fn(&FunctionArgs) -> Result<MapReduceInfo, PipelineError> + Send + Sync + 'static,
  {
    let name = name.into();
    debug!(function = %name, ?category, "registered map/reduce function");
    self.entries.insert(
      name,
      Entry {
        category,
        factory: Arc::new(factory),
      },
    );
  }

  /// Returns the category of `name`, or `None` if it is not registered.
  pub fn category(&self, name: &str) -> Option<ReduceCategory> {
    self.entries.get(name).map(|e| e.category)
  }

  /// Returns whether `name` is registered.
  pub fn contains(&self, name: &str) -> bool {
    self.entries.contains_key(name)
  }

  /// Returns the registered names in sorted order.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }

  /// Builds the function registered under `name`.
  ///
  /// # Errors
  ///
  /// Returns [`PipelineError::InvalidFunction`] if `name` is not registered, the
  /// field is empty, the factory rejects the arguments, or the built reduce
  /// function reports a category other than the registered one.
  pub fn lookup(&self, name: &str, args: &FunctionArgs) -> Result<MapReduceInfo, PipelineError> {
    let entry = self
      .entries
      .get(name)
      .ok_or_else(|| PipelineError::InvalidFunction(format!("unknown function {name:?}")))?;
    if args.field.trim().is_empty() {
      return Err(PipelineError::InvalidFunction(format!(
        "{name} requires a field name"
      )));
    }
    let info = (entry.factory)(args)?;
    if info.category() != entry.category {
      return Err(PipelineError::InvalidFunction(format!(
        "{name} is registered as {:?} but its reduce function reports {:?}",
        entry.category,
        info.category()
      )));
    }
    Ok(info)
  }
}

impl fmt::Debug for FunctionRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map()
      .entries(self.entries.iter().map(|(name, e)| (name, e.category)))
      .finish()
  }
}

fn required_limit(name: &str, args: &FunctionArgs) -> Result<usize, PipelineError> {
  args
    .limit
    .ok_or_else(|| PipelineError::InvalidFunction(format!("{name} requires a point limit")))
}
