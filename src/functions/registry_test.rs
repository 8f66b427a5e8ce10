//! Tests for the function registry

use crate::edge::EdgeType;
use crate::error::PipelineError;
use crate::functions::registry::{FunctionArgs, FunctionRegistry};
use crate::functions::{MapReduceInfo, ReduceCategory, builtin};

#[test]
fn test_builtins_are_registered_with_categories() {
  let registry = FunctionRegistry::with_builtins();
  let names: Vec<_> = registry.names().collect();
  assert_eq!(
    names,
    vec!["bottom", "count", "first", "last", "max", "mean", "min", "sum", "top"]
  );
  for name in ["sum", "count", "mean"] {
    assert_eq!(registry.category(name), Some(ReduceCategory::Aggregator));
  }
  for name in ["first", "last", "max", "min", "top", "bottom"] {
    assert_eq!(registry.category(name), Some(ReduceCategory::Selector));
  }
  assert_eq!(registry.category("median"), None);
}

#[test]
fn test_lookup_builds_named_pair() {
  let registry = FunctionRegistry::with_builtins();
  let info = registry.lookup("last", &FunctionArgs::field("value")).unwrap();
  assert_eq!(info.map.name(), "last");
  assert_eq!(info.reduce.name(), "last");
  assert_eq!(info.edge, EdgeType::Stream);
}

#[test]
fn test_lookup_unknown_function() {
  let registry = FunctionRegistry::with_builtins();
  let err = registry
    .lookup("median", &FunctionArgs::field("value"))
    .unwrap_err();
  assert!(matches!(err, PipelineError::InvalidFunction(msg) if msg.contains("median")));
}

#[test]
fn test_lookup_requires_field() {
  let registry = FunctionRegistry::with_builtins();
  assert!(matches!(
    registry.lookup("sum", &FunctionArgs::field(" ")),
    Err(PipelineError::InvalidFunction(_))
  ));
}

#[test]
fn test_ranked_lookup_requires_limit() {
  let registry = FunctionRegistry::with_builtins();
  assert!(registry.lookup("top", &FunctionArgs::field("value")).is_err());
  assert!(
    registry
      .lookup("bottom", &FunctionArgs::field("value").with_limit(0))
      .is_err()
  );
  let info = registry
    .lookup("top", &FunctionArgs::field("value").with_limit(2))
    .unwrap();
  assert_eq!(info.category(), ReduceCategory::Selector);
}

#[test]
fn test_register_custom_function() {
  let mut registry = FunctionRegistry::new();
  assert!(!registry.contains("total"));

  registry.register("total", ReduceCategory::Aggregator, |args| {
    Ok(builtin::sum(&args.field).with_edge(EdgeType::Batch))
  });

  assert!(registry.contains("total"));
  let info = registry.lookup("total", &FunctionArgs::field("value")).unwrap();
  assert_eq!(info.edge, EdgeType::Batch);
}

#[test]
fn test_lookup_rejects_category_disagreement() {
  let mut registry = FunctionRegistry::new();
  registry.register("liar", ReduceCategory::Selector, |args| Ok(builtin::sum(&args.field)));

  let err = registry
    .lookup("liar", &FunctionArgs::field("value"))
    .unwrap_err();
  assert!(matches!(err, PipelineError::InvalidFunction(_)));
}

#[test]
fn test_register_replaces_earlier_entry() {
  let mut registry = FunctionRegistry::with_builtins();
  registry.register("sum", ReduceCategory::Selector, |args| -> Result<MapReduceInfo, PipelineError> {
    Ok(builtin::max(&args.field))
  });
  assert_eq!(registry.category("sum"), Some(ReduceCategory::Selector));
  let info = registry.lookup("sum", &FunctionArgs::field("value")).unwrap();
  assert_eq!(info.reduce.name(), "max");
}

#[test]
fn test_function_args_serde() {
  let args: FunctionArgs = serde_json::from_str(r#"{"field":"latency"}"#).unwrap();
  assert_eq!(args, FunctionArgs::field("latency"));
}
