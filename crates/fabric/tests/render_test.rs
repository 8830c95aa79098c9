//! Integration tests for the Renderer API
//!
//! These tests render whole documents from source units and check both the
//! output lines and the diagnostics.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{Value, json};

use fabric::{
    Cancellation, Catalog, RenderOutput, Renderer, SourceUnit,
    block::BlockKind,
    config::{AppConfig, RenderConfig},
    diagnostics::{Diagnostic, ErrorCode},
    plugin::{Plugin, PluginCall, PluginDescriptor, PluginRegistry, Schema, ValueType, Version},
    render,
};

fn unit(name: &str, source: &str) -> SourceUnit {
    SourceUnit::new(name, source)
}

fn messages(output: &RenderOutput) -> Vec<&str> {
    output.diagnostics().iter().map(Diagnostic::message).collect()
}

const CYCLE: &str = r#"
content ref "ref_a" { base = content.ref.ref_b }
content ref "ref_b" { base = content.ref.ref_c }
content ref "ref_c" { base = content.ref.ref_a }
"#;

#[test]
fn test_hello_document() {
    let units = [unit(
        "greeting.fabric",
        r#"
        document "greeting" {
          title = "Welcome"
          content text {
            value = "Hello from fabric"
          }
        }
        "#,
    )];

    let output = render(&units, "greeting");

    assert_eq!(output.lines(), ["# Welcome", "Hello from fabric"]);
    assert!(output.diagnostics().is_empty());
}

#[test]
fn test_ref_chain_with_blockquote() {
    let units = [unit(
        "chain.fabric",
        r#"
        document "chain" {
          content ref {
            base = content.ref.middle
            format_as = "blockquote"
          }
        }

        content ref "middle" {
          base = content.text.leaf
        }

        content text "leaf" {
          value = "Hello from ref chain"
        }
        "#,
    )];

    let output = render(&units, "chain");

    assert_eq!(output.lines(), ["> Hello from ref chain"]);
    assert!(output.diagnostics().is_empty());
}

#[test]
fn test_unreferenced_cycle_is_never_inspected() {
    let units = [
        unit("cycle.fabric", CYCLE),
        unit(
            "doc.fabric",
            r#"document "safe" { content text { value = "fine" } }"#,
        ),
    ];

    let output = render(&units, "safe");

    assert_eq!(output.lines(), ["fine"]);
    assert!(output.diagnostics().is_empty());
}

#[test]
fn test_referenced_cycle_is_contained() {
    let units = [
        unit("cycle.fabric", CYCLE),
        unit(
            "doc.fabric",
            r#"
            document "loop" {
              content ref { base = content.ref.ref_a }
            }
            "#,
        ),
    ];

    let output = render(&units, "loop");

    assert!(output.lines().is_empty());
    assert_eq!(messages(&output), ["Circular reference detected"]);
    let diagnostic = &output.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(ErrorCode::E301));
    assert_eq!(
        diagnostic.detail(),
        Some("content.ref.ref_a -> content.ref.ref_b -> content.ref.ref_c -> content.ref.ref_a")
    );
}

#[test]
fn test_cycle_does_not_disturb_siblings() {
    let units = [
        unit("cycle.fabric", CYCLE),
        unit(
            "doc.fabric",
            r#"
            document "mixed" {
              content text { value = "before" }
              content ref { base = content.ref.ref_b }
              content text { value = "after" }
            }
            "#,
        ),
    ];

    let output = render(&units, "mixed");

    assert_eq!(output.lines(), ["before", "after"]);
    assert_eq!(output.diagnostics().len(), 1);
}

#[test]
fn test_cross_unit_resolution() {
    let units = [
        unit(
            "document.fabric",
            r#"
            document "report" {
              section ref { base = section.shared }
            }
            "#,
        ),
        unit(
            "library.fabric",
            r#"
            section "shared" {
              title = "Shared"
              content text { value = "defined elsewhere" }
            }
            "#,
        ),
    ];

    let output = render(&units, "report");

    assert_eq!(output.lines(), ["# Shared", "defined elsewhere"]);
    assert!(output.diagnostics().is_empty());
}

#[test]
fn test_missing_reference_is_node_local() {
    let units = [unit(
        "doc.fabric",
        r#"
        document "d" {
          content text { value = "kept" }
          content ref { base = content.text.ghost }
        }
        "#,
    )];

    let output = render(&units, "d");

    assert_eq!(output.lines(), ["kept"]);
    assert_eq!(messages(&output), ["Reference not found"]);
}

#[test]
fn test_data_conflict_is_a_warning() {
    let units = [unit(
        "doc.fabric",
        r#"
        document "d" {
          data inline "who" { value = "first" }
          data inline "who" { value = "second" }
          content text { value = "${who}" }
        }
        "#,
    )];

    let output = render(&units, "d");

    assert_eq!(output.lines(), ["second"]);
    assert!(!output.has_errors());
    assert_eq!(messages(&output), ["Potential data conflict"]);
}

#[test]
fn test_duplicate_keys_warn_only_when_used() {
    let units = [
        unit("a.fabric", r#"content text "dup" { value = "from a" }"#),
        unit("b.fabric", r#"content text "dup" { value = "from b" }"#),
        unit(
            "doc.fabric",
            r#"
            document "uses" { content ref { base = content.text.dup } }
            document "ignores" { content text { value = "x" } }
            "#,
        ),
    ];

    let ignored = render(&units, "ignores");
    assert!(ignored.diagnostics().is_empty());

    let used = render(&units, "uses");
    assert_eq!(used.lines(), ["from a"]);
    assert_eq!(used.diagnostics()[0].code(), Some(ErrorCode::E201));
}

#[test]
fn test_empty_input() {
    let output = render(&[], "anything");

    assert!(output.lines().is_empty());
    assert_eq!(messages(&output), ["No fabric files found"]);
}

#[test]
fn test_parse_error_in_one_unit_does_not_stop_others() {
    let units = [
        unit("broken.fabric", "content text \"x\" { value = }"),
        unit(
            "doc.fabric",
            r#"document "d" { content text { value = "ok" } }"#,
        ),
    ];

    let output = render(&units, "d");

    assert_eq!(output.lines(), ["ok"]);
    assert_eq!(output.diagnostics().len(), 1);
    assert_eq!(
        output.diagnostics()[0].location().unwrap().unit(),
        "broken.fabric"
    );
}

#[test]
fn test_builtin_plugins_render_data() {
    let units = [unit(
        "team.fabric",
        r#"
        document "team" {
          title = "Team"
          data inline "people" {
            value = [
              { name = "Ada", role = "engineer" },
              { name = "Grace", role = "admiral" },
            ]
          }
          content table { from = "people" columns = ["name", "role"] }
          content list { items = ["one", "two"] format = "ordered" }
        }
        "#,
    )];

    let output = render(&units, "team");

    assert!(output.diagnostics().is_empty(), "{:?}", output.diagnostics());
    assert_eq!(
        output.lines(),
        [
            "# Team",
            "| name | role |",
            "| --- | --- |",
            "| Ada | engineer |",
            "| Grace | admiral |",
            "1. one",
            "2. two",
        ]
    );
    let metadata = output.metadata().unwrap();
    assert_eq!(metadata.data_names(), ["people"]);
    assert_eq!(metadata.plugin_calls(), 3);
}

#[test]
fn test_unit_order_does_not_change_output() {
    let a = unit("a.fabric", r#"content text "x" { value = "A" }"#);
    let b = unit("b.fabric", r#"content text "x" { value = "B" }"#);
    let doc = unit(
        "doc.fabric",
        r#"document "d" { content ref { base = content.text.x } }"#,
    );

    let forward = render(&[a.clone(), b.clone(), doc.clone()], "d");
    let backward = render(&[doc, b, a], "d");

    assert_eq!(forward.lines(), backward.lines());
    assert_eq!(forward.diagnostics(), backward.diagnostics());
}

#[test]
fn test_concurrent_renders_share_one_catalog() {
    let units = [
        unit("cycle.fabric", CYCLE),
        unit(
            "doc.fabric",
            r#"
            document "good" { title = "Good" content text { value = "fine" } }
            document "bad" { content ref { base = content.ref.ref_a } }
            "#,
        ),
    ];
    let catalog = Catalog::from_sources(&units).unwrap();
    let renderer = Renderer::default();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let catalog = &catalog;
                let renderer = &renderer;
                scope.spawn(move || {
                    let document = if i % 2 == 0 { "good" } else { "bad" };
                    (
                        document,
                        renderer.render_catalog(catalog, document, &Cancellation::new()),
                    )
                })
            })
            .collect();

        for handle in handles {
            let (document, output) = handle.join().unwrap();
            if document == "good" {
                assert_eq!(output.lines(), ["# Good", "fine"]);
                assert!(output.diagnostics().is_empty());
            } else {
                assert!(output.lines().is_empty());
                assert_eq!(output.diagnostics().len(), 1);
            }
        }
    });
}

/// Counts calls; used to check that no call is issued.
struct Counting {
    calls: Arc<AtomicUsize>,
}

impl Plugin for Counting {
    fn descriptors(&self) -> Vec<PluginDescriptor> {
        vec![
            PluginDescriptor::new("test", BlockKind::Content, "counted", Version::new(1, 0, 0))
                .with_invocation_schema(Schema::new().required("n", ValueType::Number)),
        ]
    }

    fn invoke(&self, call: &PluginCall<'_>) -> Result<Value, Vec<Diagnostic>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!(format!("n = {}", call.argument("n").cloned().unwrap_or_default())))
    }
}

fn counting_renderer(calls: &Arc<AtomicUsize>) -> Renderer {
    Renderer::default().with_plugins(PluginRegistry::builtin().with_plugin(Counting {
        calls: Arc::clone(calls),
    }))
}

#[test]
fn test_custom_plugin_is_called() {
    let calls = Arc::new(AtomicUsize::new(0));
    let units = [unit("doc.fabric", r#"document "d" { content counted { n = 7 } }"#)];

    let output = counting_renderer(&calls).render(&units, "d");

    assert_eq!(output.lines(), ["n = 7"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_schema_violation_blocks_the_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let units = [unit(
        "doc.fabric",
        r#"document "d" { content counted { n = "seven" } }"#,
    )];

    let output = counting_renderer(&calls).render(&units, "d");

    assert!(output.lines().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(output.diagnostics()[0].code(), Some(ErrorCode::E502));
}

#[test]
fn test_cancelled_render_issues_no_calls() {
    let calls = Arc::new(AtomicUsize::new(0));
    let units = [unit(
        "doc.fabric",
        r#"document "d" { content counted { n = 1 } content counted { n = 2 } }"#,
    )];
    let cancellation = Cancellation::new();
    cancellation.cancel();

    let output = counting_renderer(&calls).render_with_cancellation(&units, "d", &cancellation);

    assert!(output.lines().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(messages(&output), ["Render cancelled"]);
}

/// Trips the render's cancellation from inside its own call.
struct Stopping {
    calls: Arc<AtomicUsize>,
    cancellation: Cancellation,
}

impl Plugin for Stopping {
    fn descriptors(&self) -> Vec<PluginDescriptor> {
        vec![PluginDescriptor::new(
            "test",
            BlockKind::Content,
            "stop",
            Version::new(1, 0, 0),
        )]
    }

    fn invoke(&self, _call: &PluginCall<'_>) -> Result<Value, Vec<Diagnostic>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.cancellation.cancel();
        Ok(json!("done"))
    }
}

#[test]
fn test_cancellation_during_render_stops_later_calls() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cancellation = Cancellation::new();
    let renderer = Renderer::default().with_plugins(PluginRegistry::builtin().with_plugin(
        Stopping {
            calls: Arc::clone(&calls),
            cancellation: cancellation.clone(),
        },
    ));
    let units = [unit(
        "doc.fabric",
        r#"
        document "d" {
          section {
            title = "S"
            content stop {}
            content stop {}
            content text { value = "sibling" }
          }
          content stop {}
          content text { value = "next" }
        }
        "#,
    )];

    let output = renderer.render_with_cancellation(&units, "d", &cancellation);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(output.lines(), ["# S", "done"]);
    assert_eq!(messages(&output), ["Render cancelled"]);
    assert_eq!(output.diagnostics()[0].code(), Some(ErrorCode::E600));
}

#[test]
fn test_units_sharing_a_name_render_the_same_in_any_order() {
    let a = unit("a.fabric", r#"content text "x" { value = "first" }"#);
    let b = unit("a.fabric", r#"content text "x" { value = "second" }"#);
    let doc = unit(
        "doc.fabric",
        r#"document "d" { content ref { base = content.text.x } }"#,
    );

    let forward = render(&[a.clone(), b.clone(), doc.clone()], "d");
    let backward = render(&[b, a, doc], "d");

    assert_eq!(forward.lines(), ["first"]);
    assert_eq!(backward.lines(), forward.lines());
    assert_eq!(backward.diagnostics(), forward.diagnostics());
}

#[test]
fn test_zero_timeout_cancels() {
    let mut config = AppConfig::default();
    *config.render_mut() = RenderConfig::new("#", Some(0));
    let units = [unit(
        "doc.fabric",
        r#"document "d" { content text { value = "x" } }"#,
    )];

    let output = Renderer::new(config).render(&units, "d");

    assert_eq!(output.diagnostics()[0].code(), Some(ErrorCode::E600));
}

fn order_units() -> Vec<SourceUnit> {
    vec![
        unit("one.fabric", r#"content text "x" { value = "one" }"#),
        unit("two.fabric", r#"content text "x" { value = "two" }"#),
        unit("same.fabric", r#"content text "y" { value = "second" }"#),
        unit("same.fabric", r#"content text "y" { value = "first" }"#),
        unit(
            "three.fabric",
            r#"data inline "v" { value = 3 } section "s" { content ref { base = content.text.x } }"#,
        ),
        unit(
            "doc.fabric",
            r#"document "d" { data ref "v2" { base = data.inline.v } section ref { base = section.s } content ref { base = content.text.y } content text { value = "${v2}" } }"#,
        ),
    ]
}

proptest! {
    #[test]
    fn prop_unit_order_independence(order in Just(order_units()).prop_shuffle()) {
        let expected = render(&order_units(), "d");
        let shuffled = render(&order, "d");

        prop_assert_eq!(shuffled.lines(), expected.lines());
        prop_assert_eq!(shuffled.diagnostics(), expected.diagnostics());
    }
}
