mod support;

use lf_convert::{LoopKind, LoopVerdict, RejectionReason};
use lf_core::config::TerminalFamily;
use pretty_assertions::assert_eq;
use support::*;

#[test]
fn plain_for_each_uses_native_for_each() {
    let body = converted_body(
        "List<String> ls",
        "for (String s : ls) {\n    System.out.println(s);\n}\nreturn null;",
    );
    assert_eq!(body, "ls.forEach(s -> System.out.println(s));\nreturn null;");
}

#[test]
fn continue_guard_becomes_filter() {
    let body = converted_body(
        "List<String> ls",
        "for (String l : ls) {\n    if (l == null) continue;\n    System.out.println(l);\n}\nreturn null;",
    );
    assert_eq!(
        body,
        "ls.stream().filter(l -> !(l == null)).forEachOrdered(l -> System.out.println(l));\nreturn null;"
    );
}

#[test]
fn array_source_imports_arrays() {
    let src = method(
        "int[] values",
        "for (int v : values) {\n    total(v);\n}\nreturn null;",
    );
    let converted = convert(&src);
    assert_eq!(
        body_of(&converted.text),
        "Arrays.stream(values).forEach(v -> total(v));\nreturn null;"
    );
    assert!(converted.report.imports.contains("java.util.Arrays"));
    // covered by `java.util.*`
    assert!(!converted.text.contains("import java.util.Arrays;"));
}

#[test]
fn int_sum_reduces_with_method_ref() {
    let body = converted_body(
        "int[] values",
        "int sum = 0;\nfor (int v : values) {\n    sum += v;\n}\nreturn sum;",
    );
    assert_eq!(
        body,
        "int sum = 0;\nsum = Arrays.stream(values).reduce(sum, Integer::sum);\nreturn sum;"
    );
}

#[test]
fn counting_maps_each_element_to_one() {
    let body = converted_body(
        "List<String> words",
        "int count = 0;\nfor (String w : words) {\n    count++;\n}\nreturn count;",
    );
    assert_eq!(
        body,
        "int count = 0;\ncount = words.stream().mapToInt(_item -> 1).reduce(count, Integer::sum);\nreturn count;"
    );
}

#[test]
fn float_increment_reduces_with_lambda() {
    let body = converted_body(
        "List<String> words",
        "float len = 0;\nfor (String w : words) {\n    len++;\n}\nreturn len;",
    );
    assert!(
        body.contains(".reduce(len, (accumulator, _item) -> accumulator + 1);"),
        "{body}"
    );
    assert!(body.contains("1.0f"), "{body}");
}

#[test]
fn fresh_list_collects_filtered_values() {
    let src = method(
        "List<String> ls",
        "List<String> out = new ArrayList<>();\nfor (String s : ls) {\n    if (s.startsWith(\"a\")) {\n        out.add(s.toUpperCase());\n    }\n}\nreturn out;",
    );
    let converted = convert(&src);
    assert_eq!(
        body_of(&converted.text),
        "List<String> out = ls.stream().filter(s -> s.startsWith(\"a\")).map(s -> s.toUpperCase()).collect(Collectors.toList());\nreturn out;"
    );
    assert!(converted
        .text
        .starts_with("import java.util.*;\nimport java.util.stream.Collectors;\n"));
    let outcome = single_outcome(&converted);
    assert_eq!(
        outcome.verdict,
        LoopVerdict::Converted {
            family: TerminalFamily::Collect
        }
    );
}

#[test]
fn early_return_of_element_becomes_find_first() {
    let body = converted_body(
        "List<String> ls",
        "for (String s : ls) {\n    if (s.length() > 3) {\n        return s;\n    }\n}\nreturn null;",
    );
    assert_eq!(
        body,
        "return ls.stream().filter(s -> s.length() > 3).findFirst().orElse(null);"
    );
}

#[test]
fn early_true_becomes_any_match() {
    let body = converted_body(
        "List<String> ls",
        "for (String s : ls) {\n    if (s.isEmpty()) {\n        return true;\n    }\n}\nreturn false;",
    );
    assert_eq!(
        body,
        "if (ls.stream().anyMatch(s -> s.isEmpty())) {\n    return true;\n}\nreturn false;"
    );
}

#[test]
fn negated_early_false_becomes_all_match() {
    let body = converted_body(
        "List<String> ls",
        "for (String s : ls) {\n    if (!s.isBlank()) {\n        return false;\n    }\n}\nreturn true;",
    );
    assert_eq!(
        body,
        "if (!ls.stream().allMatch(s -> s.isBlank())) {\n    return false;\n}\nreturn true;"
    );
}

#[test]
fn early_false_becomes_none_match() {
    let body = converted_body(
        "List<String> ls",
        "for (String s : ls) {\n    if (s.isEmpty()) {\n        return false;\n    }\n}\nreturn true;",
    );
    assert_eq!(
        body,
        "if (!ls.stream().noneMatch(s -> s.isEmpty())) {\n    return false;\n}\nreturn true;"
    );
}

#[test]
fn null_checked_element_becomes_find_first() {
    let body = converted_body(
        "List<String> ls",
        "for (String s : ls) {\n    if (s != null && s.startsWith(\"a\")) {\n        return s;\n    }\n}\nreturn \"none\";",
    );
    assert_eq!(
        body,
        "return ls.stream().filter(s -> s != null && s.startsWith(\"a\")).findFirst().orElse(\"none\");"
    );
}

#[test]
fn possibly_null_element_is_not_found() {
    let src = method(
        "List<String> ls",
        "for (String s : ls) {\n    if (s == null || s.isEmpty()) {\n        return s;\n    }\n}\nreturn \"none\";",
    );
    let converted = convert(&src);
    assert_eq!(converted.text, src);
    assert!(matches!(
        single_outcome(&converted).verdict,
        LoopVerdict::Rejected {
            reason: RejectionReason::UnsafeControlFlow,
            ..
        }
    ));
}

#[test]
fn narrowing_compound_accumulator_is_left_alone() {
    let src = method(
        "double[] ds",
        "int acc = 0;\nfor (double d : ds) {\n    acc += d;\n}\nreturn acc;",
    );
    let converted = convert(&src);
    assert_eq!(converted.text, src);
    assert!(matches!(
        single_outcome(&converted).verdict,
        LoopVerdict::Rejected {
            reason: RejectionReason::UnsafeExternalMutation,
            ..
        }
    ));
}

#[test]
fn widening_compound_accumulator_casts_each_element() {
    let body = converted_body(
        "List<Integer> xs",
        "double acc = 0;\nfor (Integer x : xs) {\n    acc += x;\n}\nreturn acc;",
    );
    assert!(body.contains("(double) x"), "{body}");
    assert!(body.contains(".reduce(acc, Double::sum);"), "{body}");
}

#[test]
fn consecutive_loops_into_one_list_are_concatenated() {
    let src = method(
        "List<String> xs, List<String> ys",
        "List<String> out = new ArrayList<>();\nfor (String x : xs) {\n    out.add(x);\n}\nfor (String y : ys) {\n    if (!y.isEmpty()) {\n        out.add(y);\n    }\n}\nreturn out;",
    );
    let converted = convert(&src);
    assert_eq!(
        body_of(&converted.text),
        "List<String> out = Stream.concat(xs.stream(), ys.stream().filter(y -> !y.isEmpty())).collect(Collectors.toList());\nreturn out;"
    );
    assert!(converted.report.imports.contains("java.util.stream.Stream"));
    assert_eq!(converted.report.converted_count(), 2);
    assert_eq!(converted.report.edits.len(), 1);
}

#[test]
fn concatenated_element_types_are_spelled_out_when_they_differ() {
    let body = converted_body(
        "List<Integer> ints, List<Double> ds",
        "List<Number> out = new ArrayList<>();\nfor (Integer i : ints) {\n    out.add(i);\n}\nfor (Double d : ds) {\n    out.add(d);\n}\nreturn out;",
    );
    assert_eq!(
        body,
        "List<Number> out = Stream.<Number>concat(ints.stream(), ds.stream()).collect(Collectors.toList());\nreturn out;"
    );
}

#[test]
fn list_mutated_after_collecting_keeps_its_type() {
    let body = converted_body(
        "List<String> xs",
        "List<String> out = new ArrayList<>();\nfor (String x : xs) {\n    out.add(x);\n}\nout.add(\"end\");\nreturn out;",
    );
    assert_eq!(
        body,
        "List<String> out = xs.stream().collect(Collectors.toCollection(ArrayList::new));\nout.add(\"end\");\nreturn out;"
    );
}

#[test]
fn iterator_loop_absorbs_its_declaration() {
    let src = method(
        "List<String> ls",
        "Iterator<String> it = ls.iterator();\nwhile (it.hasNext()) {\n    String s = it.next();\n    System.out.println(s);\n}\nreturn null;",
    );
    let converted = convert(&src);
    assert_eq!(
        body_of(&converted.text),
        "ls.forEach(s -> System.out.println(s));\nreturn null;"
    );
    assert_eq!(single_outcome(&converted).kind, Some(LoopKind::IteratorWhile));
}

#[test]
fn indexed_loop_becomes_range() {
    let src = method(
        "List<String> names",
        "for (int i = 0; i < names.size(); i++) {\n    String n = names.get(i);\n    System.out.println(n);\n}\nreturn null;",
    );
    let converted = convert(&src);
    assert_eq!(
        body_of(&converted.text),
        "IntStream.range(0, names.size()).mapToObj(i -> names.get(i)).forEachOrdered(n -> System.out.println(n));\nreturn null;"
    );
    assert!(converted.text.contains("import java.util.stream.IntStream;"));
}

#[test]
fn nested_loops_fold_inside_out() {
    let src = method(
        "List<List<Integer>> grid",
        "for (List<Integer> row : grid) {\n    for (Integer x : row) {\n        System.out.println(x);\n    }\n}\nreturn null;",
    );
    let converted = convert(&src);
    assert_eq!(
        body_of(&converted.text),
        "grid.forEach(row -> row.forEach(x -> System.out.println(x)));\nreturn null;"
    );
    assert_eq!(converted.report.converted_count(), 2);
    assert_eq!(converted.report.edits.len(), 1);
}

#[test]
fn guard_comment_moves_into_the_filter() {
    let body = converted_body(
        "List<String> ls",
        "for (String s : ls) {\n    // skip blanks\n    if (s.isBlank()) continue;\n    System.out.println(s);\n}\nreturn null;",
    );
    assert!(body.starts_with("ls.stream().filter("), "{body}");
    assert!(body.contains("// skip blanks"), "{body}");
    assert!(body.contains("forEachOrdered(s -> System.out.println(s));"), "{body}");
}

#[test]
fn comment_before_the_loop_stays_in_place() {
    let body = converted_body(
        "List<String> ls",
        "// print all\nfor (String s : ls) {\n    System.out.println(s);\n}\nreturn null;",
    );
    assert_eq!(body, "// print all\nls.forEach(s -> System.out.println(s));\nreturn null;");
}

#[test]
fn loops_in_constructors_and_initializers_are_converted() {
    let src = "class Sample {\n    Sample(List<String> ls) {\n        for (String s : ls) {\n            register(s);\n        }\n    }\n}\n";
    let converted = convert(src);
    assert_eq!(
        converted.text,
        "class Sample {\n    Sample(List<String> ls) {\n        ls.forEach(s -> register(s));\n    }\n}\n"
    );
}

#[test]
fn outcome_reports_line_and_replacement() {
    let src = method(
        "List<String> ls",
        "for (String s : ls) {\n    System.out.println(s);\n}\nreturn null;",
    );
    let converted = convert(&src);
    let outcome = single_outcome(&converted);
    assert_eq!(outcome.line, 5);
    assert_eq!(outcome.kind, Some(LoopKind::ElementForEach));
    assert_eq!(
        outcome.replacement.as_deref(),
        Some("ls.forEach(s -> System.out.println(s));")
    );
}
