use std::fs;

use codelines::{BackgroundBuilder, Config, Document, MarkupKind};
use pretty_assertions::assert_eq;

fn config() -> Config {
    Config::parse(
        r#"
markup = "rich-text"
line-terminator = "lf"

[[language]]
name = "Toy"
extensions = ["toy"]
keywords = ["when", "then"]
line_comment = "--"
"#,
    )
    .unwrap()
}

#[test]
fn edit_save_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.toy");
    fs::write(&path, "when a then b\n-- note\n").unwrap();

    let config = config();
    assert_eq!(config.markup, MarkupKind::RichText);
    let registry = config.registry();

    let mut doc = Document::open(&path, &registry, &config, None).unwrap();
    assert_eq!(doc.code().rules().name(), "Toy");
    assert_eq!(doc.code().code_line_count(), 1);
    assert!(doc.code().get(0).unwrap().contains("<color="));

    doc.insert_below(1, "when c then d").unwrap();
    doc.delete_line(0).unwrap();
    doc.save().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "-- note\nwhen c then d\n");

    let reopened = Document::open(&path, &registry, &config, None).unwrap();
    assert_eq!(reopened.code().len(), 2);
    assert_eq!(reopened.code().get_unformatted(1).unwrap(), "when c then d");
}

#[test]
fn deferred_open_built_in_background() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.toy");
    let text: String = (0..500).map(|i| format!("when x{} then y -- {}\n", i, i)).collect();
    fs::write(&path, &text).unwrap();

    let config = config();
    let (mut doc, body) = Document::open_deferred(&path, &config.registry(), &config, None).unwrap();

    // First screen only
    doc.code_mut().begin_progressive(&body);
    assert!(!doc.code_mut().build_next(config.lines_per_screen));
    assert!(doc.code().len() <= config.lines_per_screen + 1);

    let mut builder = BackgroundBuilder::new();
    builder.start(doc.code(), body);
    let code = builder.wait().unwrap();
    doc.replace_code(code);

    assert!(doc.code().is_complete());
    assert_eq!(doc.code().len(), 500);
    assert_eq!(doc.contents(), text);
}
