#![allow(dead_code)]

use lf_convert::{convert_source, ConvertedSource, LoopOutcome};
use lf_core::config::ConversionConfig;

/// A class with one method `run(params)` whose body is `body`, indented two
/// levels.
pub fn method(params: &str, body: &str) -> String {
    let mut out = String::from("import java.util.*;\n\nclass Sample {\n");
    out.push_str(&format!("    Object run({params}) {{\n"));
    for line in body.lines() {
        if !line.is_empty() {
            out.push_str("        ");
            out.push_str(line);
        }
        out.push('\n');
    }
    out.push_str("    }\n}\n");
    out
}

pub fn convert_with(src: &str, config: &ConversionConfig) -> ConvertedSource {
    convert_source(src, config).unwrap_or_else(|e| panic!("conversion failed: {e}\n{src}"))
}

pub fn convert(src: &str) -> ConvertedSource {
    convert_with(src, &ConversionConfig::default())
}

/// Body of `run` in `text`, with the method indentation removed.
pub fn body_of(text: &str) -> String {
    let start = text.find(") {\n").map(|idx| idx + 4).unwrap_or_else(|| panic!("no method in\n{text}"));
    let end = text.rfind("\n    }\n}").unwrap_or_else(|| panic!("no method end in\n{text}"));
    text[start..end]
        .lines()
        .map(|line| line.strip_prefix("        ").unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Converted body of `run(params) { body }` under the default config.
pub fn converted_body(params: &str, body: &str) -> String {
    body_of(&convert(&method(params, body)).text)
}

pub fn single_outcome(converted: &ConvertedSource) -> &LoopOutcome {
    match converted.report.outcomes.as_slice() {
        [outcome] => outcome,
        other => panic!("expected one loop, got {other:#?}"),
    }
}
