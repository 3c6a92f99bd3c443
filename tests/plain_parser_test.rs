use pretty_assertions::assert_eq;
use proptest::prelude::*;
use screenwriting_rust::models::{Conf, DiagnosticKind, ElementKind, SceneNumberingMode, TextStyle};
use screenwriting_rust::parser::parse_plain_text;
use screenwriting_rust::{parse, SourceKind};
use std::fs;
use std::path::Path;

fn kinds_and_texts(script: &str) -> Vec<(ElementKind, String)> {
    let result = parse_plain_text(script, &Conf::default());
    result
        .document
        .iter()
        .map(|el| (el.kind(), el.plain_text()))
        .collect()
}

#[test]
fn test_kitchen_scene() {
    let script = "INT. KITCHEN - DAY\n\nJOHN\nHello there.\n\n(smiling)\nHow are you?";
    let result = parse_plain_text(script, &Conf::default());

    assert_eq!(
        kinds_and_texts(script),
        vec![
            (ElementKind::SceneHeading, "INT. KITCHEN - DAY".to_string()),
            (ElementKind::Character, "JOHN".to_string()),
            (ElementKind::Dialogue, "Hello there.".to_string()),
            (ElementKind::Parenthetical, "(smiling)".to_string()),
            (ElementKind::Dialogue, "How are you?".to_string()),
        ]
    );
    assert!(result.diagnostics.is_empty());

    // 第二段对白仍属于 JOHN
    let speaker = result.document.speaker_of(4).map(|el| el.plain_text());
    assert_eq!(speaker, Some("JOHN".to_string()));
    assert!(result.document.validate_character_precedes_dialogue().is_ok());
}

#[test]
fn test_sample_file() {
    let script_path = Path::new("tests/test_data/sample.txt");
    let script = fs::read(script_path).expect("无法读取测试文件");

    let result = parse(&script, SourceKind::PlainText, &Conf::default()).unwrap();
    let document = &result.document;

    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(document.title_page.get("title").map(String::as_str), Some("The Kettle"));
    assert_eq!(document.title_page.get("author").map(String::as_str), Some("Jane Doe"));
    assert_eq!(document.title_page.get("draft_date").map(String::as_str), Some("2024-03-01"));

    assert_eq!(document.len(), 15);
    assert_eq!(document.scene_numbering_mode, SceneNumberingMode::Explicit);
    assert_eq!(document.elements()[0].scene_number(), Some("1"));
    assert_eq!(document.elements()[12].scene_number(), Some("2"));
    assert_eq!(document.elements()[11].kind(), ElementKind::PageBreak);
    assert_eq!(document.elements()[13].kind(), ElementKind::Shot);
    assert_eq!(document.elements()[14].kind(), ElementKind::Note);

    // **screams** 是粗体
    let action = &document.elements()[1];
    assert_eq!(action.plain_text(), "The kettle screams. JOHN pours two cups.");
    assert_eq!(action.text.runs()[1].text, "screams");
    assert_eq!(action.text.runs()[1].style, TextStyle::bold());

    // MARY 与 JOHN ^ 组成一组双对白
    assert_eq!(document.dual_groups(), vec![(1, 6..10)]);
    assert_eq!(document.character_names(), vec!["JOHN".to_string(), "MARY".to_string()]);
}

#[test]
fn test_dual_marker_without_partner() {
    let script = "JOHN ^\nHello.";
    let result = parse_plain_text(script, &Conf::default());

    assert_eq!(result.document.len(), 2);
    assert!(result.document.dual_groups().is_empty());
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::SelfHealed);
    assert_eq!(result.diagnostics[0].element_index, Some(0));
}

#[test]
fn test_mixed_scene_numbers_are_normalized() {
    let script = "INT. A - DAY #4#\n\nRain.\n\nEXT. B - NIGHT\n\nWind.";
    let result = parse_plain_text(script, &Conf::default());

    let numbers: Vec<Option<&str>> = result
        .document
        .iter()
        .filter(|el| el.kind() == ElementKind::SceneHeading)
        .map(|el| el.scene_number())
        .collect();
    assert_eq!(numbers, vec![Some("1"), Some("2")]);
    assert_eq!(result.document.scene_numbering_mode, SceneNumberingMode::Auto);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::Normalized));
}

#[test]
fn test_markdown_can_be_disabled() {
    let mut conf = Conf::default();
    conf.markdown = false;
    let result = parse_plain_text("He is *very* tired.", &conf);
    assert_eq!(result.document.elements()[0].plain_text(), "He is *very* tired.");
    assert!(!result.document.elements()[0].text.has_styles());
}

#[test]
fn test_crlf_and_bom() {
    let bytes = b"\xEF\xBB\xBFINT. HALL - NIGHT\r\n\r\nShe waits.\r\n";
    let result = parse(bytes, SourceKind::PlainText, &Conf::default()).unwrap();
    assert_eq!(
        result
            .document
            .iter()
            .map(|el| el.kind())
            .collect::<Vec<_>>(),
        vec![ElementKind::SceneHeading, ElementKind::Action]
    );
    assert_eq!(result.document.elements()[1].plain_text(), "She waits.");
}

#[test]
fn test_invalid_utf8_is_rejected() {
    let result = parse(&[0x49, 0x4e, 0x54, 0xff], SourceKind::PlainText, &Conf::default());
    assert!(result.is_err());
}

#[test]
fn test_prose_starting_with_est_is_action() {
    assert_eq!(
        kinds_and_texts("EST. HARBOUR TOWN - DAY\n\nEst. 1850, the town grew."),
        vec![
            (ElementKind::SceneHeading, "EST. HARBOUR TOWN - DAY".to_string()),
            (ElementKind::Action, "Est. 1850, the town grew.".to_string()),
        ]
    );
}

#[test]
fn test_blank_input_is_kept_as_action() {
    let result = parse_plain_text("   \n\n  ", &Conf::default());
    assert_eq!(result.document.len(), 1);
    assert_eq!(result.document.elements()[0].kind(), ElementKind::Action);

    let result = parse_plain_text("", &Conf::default());
    assert!(result.document.is_empty());
}

proptest! {
    // 任何非空文本都能解析出至少一个元素，且文档满足角色名约束
    #[test]
    fn prop_plain_text_never_fails(script in "\\PC{1,200}") {
        let result = parse_plain_text(&script, &Conf::default());
        prop_assert!(!result.document.is_empty());
        prop_assert!(result.document.validate_character_precedes_dialogue().is_ok());
    }

    #[test]
    fn prop_screenplay_like_lines(lines in prop::collection::vec(
        prop_oneof![
            Just("INT. HOUSE - DAY".to_string()),
            Just("JOHN".to_string()),
            Just("MARY ^".to_string()),
            Just("(quietly)".to_string()),
            Just("Hello.".to_string()),
            Just("CUT TO:".to_string()),
            Just("===".to_string()),
            Just(String::new()),
            "[a-z ]{1,20}",
        ],
        1..40,
    )) {
        let script = lines.join("\n");
        let result = parse_plain_text(&script, &Conf::default());
        prop_assert!(!result.document.is_empty());
        prop_assert!(result.document.validate_character_precedes_dialogue().is_ok());
        for element in result.document.iter() {
            prop_assert!(element.validate_fields().is_ok());
        }
    }
}
