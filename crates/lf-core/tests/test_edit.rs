// Text edit and import insertion tests

use lf_core::ast::{CompilationUnit, Import};
use lf_core::edit::{apply_edits, insert_imports, TextEdit};
use lf_core::span::Span;
use lf_core::Error;
use pretty_assertions::assert_eq;

fn import(source: &str, path: &str) -> Import {
    let text = format!("import {path};");
    let lo = source.find(&text).unwrap_or_else(|| panic!("`{text}` not in source"));
    Import {
        path: path.to_string(),
        is_static: false,
        span: Span::new(1, lo as u32, (lo + text.len()) as u32),
    }
}

#[test]
fn applies_edits_in_offset_order() {
    let source = "int a = 1; int b = 2;";
    let edits = vec![
        TextEdit::replace(11..21, "long b = 2L;"),
        TextEdit::replace(0..10, "long a = 1L;"),
    ];
    let out = apply_edits(source, &edits).unwrap();
    assert_eq!(out, "long a = 1L; long b = 2L;");
}

#[test]
fn rejects_overlapping_edits() {
    let edits = vec![TextEdit::replace(0..5, "x"), TextEdit::replace(3..8, "y")];
    let err = apply_edits("0123456789", &edits).unwrap_err();
    assert!(matches!(err, Error::EditConflict(_)));
}

#[test]
fn inserts_after_last_import() {
    let source = "package p;\n\nimport java.util.List;\n\nclass A {}\n";
    let unit = CompilationUnit {
        package: Some("p".into()),
        package_span: Some(Span::new(1, 0, 10)),
        imports: vec![import(source, "java.util.List")],
        types: vec![],
    };
    let wanted = vec![
        "java.util.stream.Collectors".to_string(),
        "java.util.List".to_string(),
    ];
    let edit = insert_imports(source, &unit, &wanted).unwrap();
    let out = apply_edits(source, &[edit]).unwrap();
    assert_eq!(
        out,
        "package p;\n\nimport java.util.List;\nimport java.util.stream.Collectors;\n\nclass A {}\n"
    );
}

#[test]
fn wildcard_import_covers_class() {
    let source = "import java.util.stream.*;\nclass A {}\n";
    let unit = CompilationUnit {
        imports: vec![import(source, "java.util.stream.*")],
        ..Default::default()
    };
    let wanted = vec!["java.util.stream.IntStream".to_string()];
    assert_eq!(insert_imports(source, &unit, &wanted), None);
}

#[test]
fn inserts_after_package_or_at_top() {
    let source = "package p;\nclass A {}\n";
    let unit = CompilationUnit {
        package: Some("p".into()),
        package_span: Some(Span::new(1, 0, 10)),
        ..Default::default()
    };
    let wanted = vec!["java.util.Arrays".to_string()];
    let edit = insert_imports(source, &unit, &wanted).unwrap();
    assert_eq!(
        apply_edits(source, &[edit]).unwrap(),
        "package p;\n\nimport java.util.Arrays;\nclass A {}\n"
    );

    let bare = "class A {}\n";
    let edit = insert_imports(bare, &CompilationUnit::default(), &wanted).unwrap();
    assert_eq!(
        apply_edits(bare, &[edit]).unwrap(),
        "import java.util.Arrays;\n\nclass A {}\n"
    );
}
