//! Final Draft (.fdx) 读写

pub mod fdx_reader;
pub mod fdx_maker;

use crate::models::{ElementKind, SceneNumberingMode, TextStyle};

pub use fdx_maker::make_fdx;
pub use fdx_reader::{parse_fdx, FdxReader};

/// 元素类型与 Paragraph `Type` 属性的对照表
pub const PARAGRAPH_TYPES: [(ElementKind, &str); 10] = [
    (ElementKind::SceneHeading, "Scene Heading"),
    (ElementKind::Action, "Action"),
    (ElementKind::Character, "Character"),
    (ElementKind::Dialogue, "Dialogue"),
    (ElementKind::Parenthetical, "Parenthetical"),
    (ElementKind::Transition, "Transition"),
    (ElementKind::Shot, "Shot"),
    (ElementKind::DualDialogueBlock, "Dual Dialogue Block"),
    (ElementKind::PageBreak, "Page Break"),
    (ElementKind::Note, "Note"),
];

pub fn paragraph_type(kind: ElementKind) -> &'static str {
    PARAGRAPH_TYPES
        .iter()
        .find(|(k, _)| *k == kind)
        .map_or("Action", |(_, name)| name)
}

/// `General` 按动作处理
pub fn kind_from_type(name: &str) -> Option<ElementKind> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("General") {
        return Some(ElementKind::Action);
    }
    PARAGRAPH_TYPES
        .iter()
        .find(|(_, type_name)| type_name.eq_ignore_ascii_case(name))
        .map(|(kind, _)| *kind)
}

/// `Bold+Italic+Underline+Strikeout` -> TextStyle，未知项忽略
pub fn parse_style(value: &str) -> TextStyle {
    let mut style = TextStyle::PLAIN;
    for part in value.split('+') {
        match part.trim().to_ascii_lowercase().as_str() {
            "bold" => style.bold = true,
            "italic" => style.italic = true,
            "underline" => style.underline = true,
            "strikeout" | "strikethrough" => style.strikeout = true,
            _ => {}
        }
    }
    style
}

/// TextStyle -> `Style` 属性，无样式时返回 None
pub fn style_attribute(style: TextStyle) -> Option<String> {
    let mut parts = Vec::new();
    if style.bold {
        parts.push("Bold");
    }
    if style.italic {
        parts.push("Italic");
    }
    if style.underline {
        parts.push("Underline");
    }
    if style.strikeout {
        parts.push("Strikeout");
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("+"))
    }
}

pub fn numbering_attribute(mode: SceneNumberingMode) -> &'static str {
    match mode {
        SceneNumberingMode::None => "None",
        SceneNumberingMode::Auto => "Auto",
        SceneNumberingMode::Explicit => "Explicit",
    }
}

pub fn numbering_from_attribute(value: &str) -> Option<SceneNumberingMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "none" => Some(SceneNumberingMode::None),
        "auto" => Some(SceneNumberingMode::Auto),
        "explicit" => Some(SceneNumberingMode::Explicit),
        _ => None,
    }
}
