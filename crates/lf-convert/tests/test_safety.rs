mod support;

use lf_convert::{LoopVerdict, RejectionReason};
use lf_core::config::{ConversionConfig, TerminalFamily};
use pretty_assertions::assert_eq;
use support::*;

fn rejection_of(params: &str, body: &str) -> RejectionReason {
    let src = method(params, body);
    let converted = convert(&src);
    assert_eq!(converted.text, src, "rejected loops must be left untouched");
    match &single_outcome(&converted).verdict {
        LoopVerdict::Rejected { reason, .. } => *reason,
        other => panic!("expected a rejection, got {other:?}"),
    }
}

#[test]
fn break_is_unsafe_control_flow() {
    let reason = rejection_of(
        "List<String> ls",
        "for (String s : ls) {\n    if (s.isEmpty()) break;\n    System.out.println(s);\n}\nreturn null;",
    );
    assert_eq!(reason, RejectionReason::UnsafeControlFlow);
}

#[test]
fn unpaired_boolean_return_is_unsafe_control_flow() {
    let reason = rejection_of(
        "List<String> ls",
        "for (String s : ls) {\n    if (s.isEmpty()) return true;\n}\nreturn true;",
    );
    assert_eq!(reason, RejectionReason::UnsafeControlFlow);
}

#[test]
fn removing_from_the_iterated_list_is_rejected() {
    let reason = rejection_of(
        "List<String> list",
        "for (String s : list) {\n    if (s.isEmpty()) list.remove(s);\n}\nreturn null;",
    );
    assert_eq!(reason, RejectionReason::IteratedCollectionMutated);
}

#[test]
fn writing_through_the_index_is_rejected() {
    let reason = rejection_of(
        "int[] xs",
        "for (int i = 0; i < xs.length; i++) {\n    xs[i] = 0;\n}\nreturn null;",
    );
    assert_eq!(reason, RejectionReason::UnsafeIndexUsage);
}

#[test]
fn neighbour_access_is_rejected() {
    let reason = rejection_of(
        "int[] xs",
        "for (int i = 0; i < xs.length; i++) {\n    System.out.println(xs[i] + i);\n}\nreturn null;",
    );
    assert_eq!(reason, RejectionReason::UnsafeIndexUsage);
}

#[test]
fn reassigning_an_outer_local_is_rejected() {
    let reason = rejection_of(
        "int[] values",
        "int last = 0;\nfor (int v : values) {\n    last = v;\n}\nreturn last;",
    );
    assert_eq!(reason, RejectionReason::UnsafeExternalMutation);
}

#[test]
fn mutating_a_concurrent_map_while_iterating_is_rejected() {
    let reason = rejection_of(
        "ConcurrentHashMap<String, Integer> m",
        "for (String k : m.keySet()) {\n    m.remove(k);\n}\nreturn null;",
    );
    assert_eq!(reason, RejectionReason::ConcurrentCollectionMutationConflict);
}

#[test]
fn labeled_loops_are_unsupported() {
    let reason = rejection_of(
        "List<String> ls",
        "outer:\nfor (String s : ls) {\n    System.out.println(s);\n}\nreturn null;",
    );
    assert_eq!(reason, RejectionReason::UnsupportedLoopShape);
}

#[test]
fn conversion_is_idempotent() {
    let src = method(
        "List<String> ls",
        "List<String> out = new ArrayList<>();\nfor (String l : ls) {\n    if (l == null) continue;\n    out.add(l);\n}\nfor (String s : ls) {\n    System.out.println(s);\n}\nreturn out;",
    );
    let once = convert(&src);
    assert!(once.changed());
    let twice = convert(&once.text);
    assert_eq!(twice.text, once.text);
    assert!(twice.report.outcomes.is_empty());
}

#[test]
fn switched_off_reduce_leaves_the_loop() {
    let mut config = ConversionConfig::default();
    config.features.reduce = false;
    let src = method(
        "int[] values",
        "int sum = 0;\nfor (int v : values) {\n    sum += v;\n}\nreturn sum;",
    );
    let converted = convert_with(&src, &config);
    assert_eq!(converted.text, src);
    assert_eq!(
        single_outcome(&converted).verdict,
        LoopVerdict::Disabled {
            family: TerminalFamily::Reduce
        }
    );
}

#[test]
fn switched_off_collect_falls_back_to_for_each() {
    let mut config = ConversionConfig::default();
    config.features.collect = false;
    let src = method(
        "List<String> ls",
        "List<String> out = new ArrayList<>();\nfor (String s : ls) {\n    out.add(s);\n}\nreturn out;",
    );
    let converted = convert_with(&src, &config);
    assert_eq!(
        body_of(&converted.text),
        "List<String> out = new ArrayList<>();\nls.forEach(s -> out.add(s));\nreturn out;"
    );
}

#[test]
fn switched_off_indexed_loops_are_reported_unsupported() {
    let mut config = ConversionConfig::default();
    config.features.indexed_loops = false;
    let src = method(
        "List<String> names",
        "for (int i = 0; i < names.size(); i++) {\n    System.out.println(names.get(i));\n}\nreturn null;",
    );
    let converted = convert_with(&src, &config);
    assert_eq!(converted.text, src);
    assert!(matches!(
        single_outcome(&converted).verdict,
        LoopVerdict::Rejected {
            reason: RejectionReason::UnsupportedLoopShape,
            ..
        }
    ));
}

#[test]
fn syntax_errors_surface_as_errors() {
    let err = lf_convert::convert_source("class Broken { void f( { }", &ConversionConfig::default())
        .unwrap_err();
    assert!(matches!(err, lf_core::Error::Syntax { .. }), "{err}");
}
