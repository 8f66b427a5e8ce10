//! Tests for PipelineBuilder and Pipeline

use crate::edge::{EdgeType, PRE_REDUCE_EDGE};
use crate::error::PipelineError;
use crate::execution::ExecutorConfig;
use crate::functions::{FunctionArgs, FunctionRegistry, builtin};
use crate::node::{ChainNode, Node, NodeId, StageKind, impl_node};
use crate::nodes::{MapStage, ReduceStage, WindowStage};
use crate::pipeline::PipelineBuilder;
use std::time::Duration;

fn secs(n: u64) -> Duration {
  Duration::from_secs(n)
}

fn windowed() -> (PipelineBuilder, NodeId, NodeId) {
  let mut builder = PipelineBuilder::new("test");
  let source = builder.stream("cpu").unwrap();
  let window = builder.window(source, secs(10), secs(10)).unwrap();
  (builder, source, window)
}

#[test]
fn test_map_reduce_uses_parent_and_pre_reduce_edges() {
  for (edge, parent) in [(EdgeType::Batch, "batch"), (EdgeType::Stream, "stream")] {
    let mut builder = PipelineBuilder::new("test");
    let source = match parent {
      "batch" => builder.batch("cpu").unwrap(),
      _ => builder.stream("cpu").unwrap(),
    };
    let sum = builtin::sum("value");

    let stages = builder
      .map_reduce(source, sum.map, sum.reduce, EdgeType::Stream)
      .unwrap();

    let map = builder.node(stages.map).unwrap();
    let reduce = builder.node(stages.reduce).unwrap();
    assert_eq!(map.wants(), edge);
    assert_eq!(map.produces(), PRE_REDUCE_EDGE);
    assert_eq!(reduce.wants(), map.produces());
    assert_eq!(reduce.produces(), EdgeType::Stream);
    assert_eq!(map.parents(), &[source]);
    assert_eq!(reduce.parents(), &[stages.map]);
  }
}

#[test]
fn test_map_reduce_after_window() {
  let (mut builder, _, window) = windowed();
  let first = builtin::first("value").with_edge(EdgeType::Batch);

  let stages = builder.map_reduce_info(window, first).unwrap();

  assert_eq!(builder.node(stages.map).unwrap().wants(), EdgeType::Batch);
  assert_eq!(builder.node(stages.reduce).unwrap().produces(), EdgeType::Batch);
  assert_eq!(builder.len(), 4);
}

#[test]
fn test_map_reduce_unknown_parent_adds_nothing() {
  let (mut builder, _, _) = windowed();
  let sum = builtin::sum("value");

  let err = builder
    .map_reduce(NodeId(99), sum.map, sum.reduce, EdgeType::Stream)
    .unwrap_err();

  assert_eq!(err, PipelineError::UnknownNode(NodeId(99)));
  assert_eq!(builder.len(), 2);
}

#[test]
fn test_map_stage_wanting_wrong_edge_is_not_attached() {
  let (mut builder, source, _) = windowed();
  let sum = builtin::sum("value");
  let map = MapStage::new(EdgeType::Batch, sum.map).unwrap();

  let err = builder.add_stage(source, map).unwrap_err();

  assert!(matches!(
    err,
    PipelineError::EdgeMismatch {
      produces: EdgeType::Stream,
      wants: EdgeType::Batch,
      ..
    }
  ));
  assert_eq!(builder.len(), 2);
  let pipeline = builder.build().unwrap();
  assert_eq!(pipeline.children(source).unwrap().len(), 1);
}

#[test]
fn test_window_requires_stream_parent() {
  let mut builder = PipelineBuilder::new("test");
  let source = builder.batch("cpu").unwrap();

  let err = builder.window(source, secs(1), secs(1)).unwrap_err();

  assert!(matches!(err, PipelineError::EdgeMismatch { .. }));
  assert_eq!(builder.len(), 1);
}

#[test]
fn test_reduce_stage_mut_configures_point_times() {
  let (mut builder, _, window) = windowed();
  let first = builtin::first("value");
  let stages = builder.map_reduce_info(window, first).unwrap();
  assert!(!builder.reduce_stage(stages.reduce).unwrap().point_times());

  builder.reduce_stage_mut(stages.reduce).unwrap().use_point_times();

  let pipeline = builder.build().unwrap();
  assert!(pipeline.reduce_stage(stages.reduce).unwrap().point_times());
}

#[test]
fn test_wrong_stage_kind() {
  let (mut builder, _, window) = windowed();
  let stages = builder.map_reduce_info(window, builtin::mean("value")).unwrap();

  assert_eq!(
    builder.reduce_stage_mut(stages.map).unwrap_err(),
    PipelineError::WrongStageKind {
      id: stages.map,
      expected: "reduce",
    }
  );
  assert!(builder.map_stage(stages.reduce).is_err());
  assert!(builder.map_stage(stages.map).is_ok());
}

#[test]
fn test_registry_rejection_happens_before_linking() {
  let (mut builder, _, _) = windowed();
  let registry = FunctionRegistry::with_builtins();

  let err = registry
    .lookup("median", &FunctionArgs::field("value"))
    .unwrap_err();

  assert!(matches!(err, PipelineError::InvalidFunction(_)));
  assert_eq!(builder.len(), 2);
  assert!(builder.stream("other").is_ok());
}

#[test]
fn test_build_empty_pipeline_fails() {
  let err = PipelineBuilder::new("nothing").build().unwrap_err();
  assert_eq!(err, PipelineError::EmptyPipeline("nothing".to_string()));
}

#[test]
fn test_walk_visits_parents_first() {
  let (mut builder, source, window) = windowed();
  let other = builder.batch("mem").unwrap();
  builder.map_reduce_info(window, builtin::sum("value")).unwrap();
  builder.map_reduce_info(other, builtin::count("value")).unwrap();
  let pipeline = builder.build().unwrap();

  let order: Vec<_> = pipeline.walk().map(|n| n.id().unwrap()).collect();
  for node in pipeline.walk() {
    let position = order.iter().position(|id| Some(*id) == node.id()).unwrap();
    for parent in node.parents() {
      assert!(order.iter().position(|id| id == parent).unwrap() < position);
    }
  }

  let sources: Vec<_> = pipeline.sources().collect();
  assert_eq!(sources, vec![source, other]);
  let kinds: Vec<_> = pipeline.walk().map(|n| n.kind()).collect();
  assert_eq!(
    kinds,
    vec![
      StageKind::Source,
      StageKind::Window,
      StageKind::Source,
      StageKind::Map,
      StageKind::Reduce,
      StageKind::Map,
      StageKind::Reduce,
    ]
  );
}

#[test]
fn test_children_follow_attach_order() {
  let (mut builder, source, window) = windowed();
  let second = builder
    .add_stage(source, WindowStage::new(secs(60), secs(30)))
    .unwrap();
  let pipeline = builder.build().unwrap();

  assert_eq!(pipeline.children(source).unwrap(), &[window, second]);
  assert!(pipeline.children(second).unwrap().is_empty());
  assert_eq!(pipeline.name(), "test");
}

#[test]
fn test_executor_requires_reduce_stage() {
  let (mut builder, _, window) = windowed();
  let stages = builder.map_reduce_info(window, builtin::sum("value")).unwrap();
  let pipeline = builder.build().unwrap();

  assert!(pipeline.executor(stages.reduce, ExecutorConfig::default()).is_ok());
  assert!(matches!(
    pipeline.executor(window, ExecutorConfig::default()),
    Err(PipelineError::WrongStageKind { .. })
  ));
}

#[test]
fn test_add_stage_rejects_stage_linked_to_same_parent() {
  let mut builder = PipelineBuilder::new("test");
  let source = builder.stream("cpu").unwrap();
  let mut window = WindowStage::new(secs(10), secs(10));
  window.link_from(builder.node(source).unwrap()).unwrap();

  let err = builder.add_stage(source, window).unwrap_err();

  assert_eq!(err, PipelineError::AlreadyLinked("window".to_string()));
  assert_eq!(builder.len(), 1);
  let pipeline = builder.build().unwrap();
  assert!(pipeline.children(source).unwrap().is_empty());
}

#[test]
fn test_add_stage_rejects_stage_linked_in_other_builder() {
  let mut other = PipelineBuilder::new("other");
  other.stream("a").unwrap();
  other.stream("b").unwrap();
  let foreign = other.stream("c").unwrap();
  let mut window = WindowStage::new(secs(10), secs(10));
  window.link_from(other.node(foreign).unwrap()).unwrap();

  let mut builder = PipelineBuilder::new("test");
  let source = builder.stream("cpu").unwrap();
  let err = builder.add_stage(source, window).unwrap_err();

  assert_eq!(err, PipelineError::AlreadyLinked("window".to_string()));
  assert_eq!(builder.len(), 1);
}

/// Stage producing the pre-reduce edge without being a map stage.
#[derive(Debug)]
struct Passthrough {
  chain: ChainNode,
}

impl_node!(Passthrough, StageKind::Window);

#[test]
fn test_executor_requires_map_parent() {
  let (mut builder, _, window) = windowed();
  let passthrough = Passthrough {
    chain: ChainNode::new("passthrough", EdgeType::Batch, PRE_REDUCE_EDGE).unwrap(),
  };
  let parent = builder.add_stage(window, passthrough).unwrap();
  let reduce = ReduceStage::new(builtin::sum("value").reduce, EdgeType::Stream).unwrap();
  let reduce = builder.add_stage(parent, reduce).unwrap();
  let pipeline = builder.build().unwrap();

  assert_eq!(
    pipeline
      .executor(reduce, ExecutorConfig::default())
      .err(),
    Some(PipelineError::WrongStageKind {
      id: parent,
      expected: "map",
    })
  );
}

#[test]
fn test_missing_map_parent_names_reduce_stage() {
  let (mut builder, _, window) = windowed();
  let stages = builder.map_reduce_info(window, builtin::sum("value")).unwrap();
  assert_eq!(
    builder.reduce_stage(stages.reduce).unwrap().map_parent(),
    Some(stages.map)
  );

  let err = PipelineError::MissingMapParent(stages.reduce);
  assert_eq!(err.to_string(), "reduce stage #3 has no map parent");
}
