//! End-to-end middleware stack integration tests.
//!
//! These tests exercise the full public surface together:
//!
//! 1. Phase/priority ordering of absolute entries
//! 2. Relative positioning anchored to named entries
//! 3. Override and duplicate-name semantics
//! 4. Composition order of the resolved handler chain
//! 5. Clone, concat, and plugin application
//! 6. Diagnostics listings (`identify`, `identify_on_resolve`)

use hermes_core::{FnHandler, HandlerContext, SharedHandler, StackError};
use hermes_stack::{
    AbsoluteOptions, DiagnosticsSink, FnMiddleware, MiddlewareStack, Phase, Plugin, Priority,
    RelativeOptions, SharedMiddleware,
};
use std::sync::{Arc, Mutex};

type Stack = MiddlewareStack<String, String>;
type Log = Arc<Mutex<Vec<String>>>;

/// A middleware that does not alter behavior.
fn noop() -> SharedMiddleware<String, String> {
    Arc::new(FnMiddleware::new(
        |next: SharedHandler<String, String>, _ctx: &HandlerContext| next,
    ))
}

/// A middleware that records enter/exit events around its delegate.
fn tracing_middleware(label: &'static str, log: Log) -> SharedMiddleware<String, String> {
    Arc::new(FnMiddleware::new(
        move |next: SharedHandler<String, String>,
              _ctx: &HandlerContext|
              -> SharedHandler<String, String> {
            let log = log.clone();
            Arc::new(FnHandler::new(move |input: String| {
                let log = log.clone();
                let next = next.clone();
                async move {
                    log.lock().unwrap().push(format!("{label}:enter"));
                    let result = next.call(input).await;
                    log.lock().unwrap().push(format!("{label}:exit"));
                    result
                }
            }))
        },
    ))
}

/// The terminal handler standing in for the transport.
fn transport() -> SharedHandler<String, String> {
    Arc::new(FnHandler::new(|input: String| async move {
        Ok(format!("response-to:{input}"))
    }))
}

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn test_absolute_entries_sort_by_phase_then_priority_then_registration() {
    let mut stack = Stack::new();
    stack
        .add(
            noop(),
            AbsoluteOptions::new().name("build-low").phase(Phase::Build).priority(Priority::Low),
        )
        .unwrap();
    stack
        .add(
            noop(),
            AbsoluteOptions::new().name("init-1").phase(Phase::Initialize),
        )
        .unwrap();
    stack
        .add(
            noop(),
            AbsoluteOptions::new()
                .name("build-high")
                .phase(Phase::Build)
                .priority(Priority::High),
        )
        .unwrap();
    stack
        .add(
            noop(),
            AbsoluteOptions::new().name("init-2").phase(Phase::Initialize),
        )
        .unwrap();

    assert_eq!(
        stack.identify(),
        vec![
            "init-1 - initialize",
            "init-2 - initialize",
            "build-high - build",
            "build-low - build",
        ]
    );
}

#[test]
fn test_spec_scenario_relative_insertion_and_override() {
    let mut stack = Stack::new();
    stack
        .add(
            noop(),
            AbsoluteOptions::new().name("C").phase(Phase::Build),
        )
        .unwrap();
    stack
        .add(
            noop(),
            AbsoluteOptions::new().name("A").phase(Phase::Initialize),
        )
        .unwrap();
    stack
        .add(
            noop(),
            AbsoluteOptions::new().name("B").phase(Phase::Serialize),
        )
        .unwrap();
    assert_eq!(
        stack.identify(),
        vec!["A - initialize", "B - serialize", "C - build"]
    );

    stack
        .add_relative_to(noop(), RelativeOptions::before("A").name("X"))
        .unwrap();
    assert_eq!(
        stack.identify(),
        vec!["X - before A", "A - initialize", "B - serialize", "C - build"]
    );

    // Same phase: the override replaces A's middleware in place.
    stack
        .add(
            noop(),
            AbsoluteOptions::new()
                .name("A")
                .phase(Phase::Initialize)
                .overwrite(true),
        )
        .unwrap();
    assert_eq!(
        stack.identify(),
        vec!["X - before A", "A - initialize", "B - serialize", "C - build"]
    );

    // Different phase: the override is rejected and nothing moves.
    let err = stack
        .add(
            noop(),
            AbsoluteOptions::new()
                .name("A")
                .phase(Phase::Serialize)
                .overwrite(true),
        )
        .unwrap_err();
    assert!(matches!(err, StackError::OverrideMismatch { .. }));
    assert_eq!(
        stack.identify(),
        vec!["X - before A", "A - initialize", "B - serialize", "C - build"]
    );
}

#[tokio::test]
async fn test_composed_handler_wraps_in_chain_order() {
    let log = new_log();
    let mut stack = Stack::new();
    stack
        .add(
            tracing_middleware("serialize", log.clone()),
            AbsoluteOptions::new().name("serialize").phase(Phase::Serialize),
        )
        .unwrap();
    stack
        .add(
            tracing_middleware("initialize", log.clone()),
            AbsoluteOptions::new().name("initialize").phase(Phase::Initialize),
        )
        .unwrap();
    stack
        .add_relative_to(
            tracing_middleware("signer", log.clone()),
            RelativeOptions::after("serialize").name("signer"),
        )
        .unwrap();

    let ctx = HandlerContext::new().with_operation("PutRecord");
    let handler = stack.resolve(transport(), &ctx).unwrap();
    let response = handler.call("req".to_string()).await.unwrap();

    assert_eq!(response, "response-to:req");
    assert_eq!(
        log.lock().unwrap().as_slice(),
        [
            "initialize:enter",
            "serialize:enter",
            "signer:enter",
            "signer:exit",
            "serialize:exit",
            "initialize:exit",
        ]
    );
}

#[tokio::test]
async fn test_after_entries_run_in_reverse_registration_order() {
    let log = new_log();
    let mut stack = Stack::new();
    stack
        .add(
            tracing_middleware("anchor", log.clone()),
            AbsoluteOptions::new().name("anchor"),
        )
        .unwrap();
    stack
        .add_relative_to(
            tracing_middleware("first-after", log.clone()),
            RelativeOptions::after("anchor").name("first-after"),
        )
        .unwrap();
    stack
        .add_relative_to(
            tracing_middleware("second-after", log.clone()),
            RelativeOptions::after("anchor").name("second-after"),
        )
        .unwrap();

    let handler = stack.resolve(transport(), &HandlerContext::new()).unwrap();
    handler.call("req".to_string()).await.unwrap();

    // "after" entries sit in the chain in reverse registration order, so the
    // earliest-registered one ends up innermost, furthest from the anchor.
    assert_eq!(
        log.lock().unwrap().as_slice(),
        [
            "anchor:enter",
            "second-after:enter",
            "first-after:enter",
            "first-after:exit",
            "second-after:exit",
            "anchor:exit",
        ]
    );
}

#[tokio::test]
async fn test_composed_handler_is_a_snapshot() {
    let log = new_log();
    let mut stack = Stack::new();
    stack
        .add(
            tracing_middleware("only", log.clone()),
            AbsoluteOptions::new().name("only"),
        )
        .unwrap();

    let handler = stack.resolve(transport(), &HandlerContext::new()).unwrap();

    // Gut the stack after composing; the snapshot must be unaffected.
    assert!(stack.remove("only"));
    assert!(stack.is_empty());

    handler.call("req".to_string()).await.unwrap();
    assert_eq!(log.lock().unwrap().as_slice(), ["only:enter", "only:exit"]);
}

#[test]
fn test_resolution_is_deterministic_across_cache_states() {
    let mut stack = Stack::new();
    stack
        .add(
            noop(),
            AbsoluteOptions::new().name("a").phase(Phase::Serialize),
        )
        .unwrap();
    stack
        .add_relative_to(noop(), RelativeOptions::before("a").name("b"))
        .unwrap();

    let first = stack.identify();
    let second = stack.identify();
    assert_eq!(first, second);

    // A cache-filling resolve followed by a mutation must not leak stale
    // order.
    stack
        .resolve(transport(), &HandlerContext::new())
        .unwrap();
    stack
        .add(
            noop(),
            AbsoluteOptions::new().name("c").phase(Phase::Initialize),
        )
        .unwrap();
    assert_eq!(
        stack.identify(),
        vec!["c - initialize", "b - before a", "a - serialize"]
    );
}

#[test]
fn test_dangling_anchor_fails_resolution_but_not_identify() {
    let mut stack = Stack::new();
    stack
        .add_relative_to(noop(), RelativeOptions::after("missing").name("orphan"))
        .unwrap();

    assert!(stack.identify().is_empty());

    let err = stack
        .resolve(transport(), &HandlerContext::new())
        .unwrap_err();
    assert_eq!(
        err,
        StackError::AnchorNotFound {
            anchor: "missing".to_string(),
            orphan: "orphan".to_string(),
        }
    );
}

#[test]
fn test_cyclic_anchoring_fails_resolution() {
    let mut stack = Stack::new();
    stack
        .add(noop(), AbsoluteOptions::new().name("anchor"))
        .unwrap();
    stack
        .add_relative_to(noop(), RelativeOptions::before("b").name("a"))
        .unwrap();
    stack
        .add_relative_to(noop(), RelativeOptions::before("a").name("b"))
        .unwrap();

    let err = stack
        .resolve(transport(), &HandlerContext::new())
        .unwrap_err();
    assert!(matches!(err, StackError::CyclicPosition { .. }));

    // The stack stays usable: dropping one side of the cycle repairs it.
    assert!(stack.remove("b"));
    let err = stack
        .resolve(transport(), &HandlerContext::new())
        .unwrap_err();
    assert!(matches!(err, StackError::AnchorNotFound { .. }));
    assert!(stack.remove("a"));
    stack.resolve(transport(), &HandlerContext::new()).unwrap();
}

#[test]
fn test_clone_and_concat_compose_stacks() {
    let mut left = Stack::new();
    left.add(
        noop(),
        AbsoluteOptions::new().name("serialize").phase(Phase::Serialize),
    )
    .unwrap();

    let mut right = Stack::new();
    right
        .add(
            noop(),
            AbsoluteOptions::new().name("deserialize").phase(Phase::Deserialize),
        )
        .unwrap();
    right
        .add_relative_to(noop(), RelativeOptions::before("serialize").name("validate"))
        .unwrap();

    let mut merged = left.concat(&right).unwrap();
    assert_eq!(
        merged.identify(),
        vec![
            "validate - before serialize",
            "serialize - serialize",
            "deserialize - deserialize",
        ]
    );

    // Mutating the merged stack leaves the operands alone.
    merged.remove("serialize");
    assert_eq!(left.identify(), vec!["serialize - serialize"]);
}

struct CompressionPlugin;

impl Plugin<String, String> for CompressionPlugin {
    fn apply_to(&self, stack: &mut Stack) -> Result<(), StackError> {
        stack.add_relative_to(
            noop(),
            RelativeOptions::after("serialize").name("compress").tag("COMPRESSION"),
        )
    }
}

#[test]
fn test_plugin_application_and_tag_removal() {
    let mut stack = Stack::new();
    stack
        .add(
            noop(),
            AbsoluteOptions::new().name("serialize").phase(Phase::Serialize),
        )
        .unwrap();

    stack.apply(&CompressionPlugin).unwrap();
    assert_eq!(
        stack.identify(),
        vec!["serialize - serialize", "compress - after serialize"]
    );

    assert!(stack.remove_by_tag("COMPRESSION"));
    assert_eq!(stack.identify(), vec!["serialize - serialize"]);
    // The tag-freed name is claimable again.
    stack
        .add(noop(), AbsoluteOptions::new().name("compress"))
        .unwrap();
}

struct CapturingSink {
    lines: Mutex<Vec<String>>,
}

impl DiagnosticsSink for CapturingSink {
    fn emit(&self, lines: &[String]) {
        self.lines.lock().unwrap().extend_from_slice(lines);
    }
}

#[test]
fn test_identify_on_resolve_emits_listing_to_sink() {
    let sink = Arc::new(CapturingSink {
        lines: Mutex::new(Vec::new()),
    });

    let mut stack = Stack::new();
    stack.set_diagnostics_sink(sink.clone());
    stack.set_identify_on_resolve(true);
    stack
        .add(
            noop(),
            AbsoluteOptions::new().name("signer").alias("sig").phase(Phase::FinalizeRequest),
        )
        .unwrap();
    stack
        .add_relative_to(noop(), RelativeOptions::after("sig").name("audit"))
        .unwrap();

    stack.resolve(transport(), &HandlerContext::new()).unwrap();

    let lines = sink.lines.lock().unwrap();
    assert_eq!(
        lines.as_slice(),
        ["signer (a.k.a. sig) - finalizeRequest", "audit - after sig"]
    );
}

mod ordering_properties {
    use super::*;
    use proptest::prelude::*;

    const PRIORITIES: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];

    proptest! {
        /// For any insertion order, the resolved chain is the stable sort of
        /// the entries by (phase weight descending, priority weight
        /// descending).
        #[test]
        fn prop_absolute_order_is_stable_sort(specs in prop::collection::vec((0usize..5, 0usize..3), 0..24)) {
            let mut stack = Stack::new();
            for (i, &(p, q)) in specs.iter().enumerate() {
                stack
                    .add(
                        noop(),
                        AbsoluteOptions::new()
                            .name(format!("m{i}"))
                            .phase(Phase::all()[p])
                            .priority(PRIORITIES[q]),
                    )
                    .unwrap();
            }

            let mut expected_order: Vec<usize> = (0..specs.len()).collect();
            expected_order.sort_by_key(|&i| {
                let (p, q) = specs[i];
                std::cmp::Reverse((Phase::all()[p].weight(), PRIORITIES[q].weight()))
            });
            let expected: Vec<String> = expected_order
                .iter()
                .map(|&i| format!("m{i} - {}", Phase::all()[specs[i].0].name()))
                .collect();

            prop_assert_eq!(stack.identify(), expected);
        }

        /// Cloning commutes with resolution: the clone's chain equals the
        /// original's.
        #[test]
        fn prop_clone_preserves_chain(specs in prop::collection::vec((0usize..5, 0usize..3), 0..12)) {
            let mut stack = Stack::new();
            for (i, &(p, q)) in specs.iter().enumerate() {
                stack
                    .add(
                        noop(),
                        AbsoluteOptions::new()
                            .name(format!("m{i}"))
                            .phase(Phase::all()[p])
                            .priority(PRIORITIES[q]),
                    )
                    .unwrap();
            }
            prop_assert_eq!(stack.clone().identify(), stack.identify());
        }
    }
}
