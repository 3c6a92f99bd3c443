use crate::models::{StyledText, TextStyle};

#[derive(Debug, Clone, Copy)]
enum Emphasis {
    BoldItalic,
    Bold,
    Italic,
    Underline,
    Strikeout,
}

impl Emphasis {
    fn is_active(self, style: TextStyle) -> bool {
        match self {
            Emphasis::BoldItalic => style.bold && style.italic,
            Emphasis::Bold => style.bold,
            Emphasis::Italic => style.italic,
            Emphasis::Underline => style.underline,
            Emphasis::Strikeout => style.strikeout,
        }
    }

    fn apply(self, mut style: TextStyle, on: bool) -> TextStyle {
        match self {
            Emphasis::BoldItalic => {
                style.bold = on;
                style.italic = on;
            }
            Emphasis::Bold => style.bold = on,
            Emphasis::Italic => style.italic = on,
            Emphasis::Underline => style.underline = on,
            Emphasis::Strikeout => style.strikeout = on,
        }
        style
    }
}

// 长的标记在前
const MARKERS: [(&str, Emphasis); 6] = [
    ("***", Emphasis::BoldItalic),
    ("**", Emphasis::Bold),
    ("~~", Emphasis::Strikeout),
    ("__", Emphasis::Underline),
    ("*", Emphasis::Italic),
    ("_", Emphasis::Underline),
];

const ESCAPABLE: &str = "*_~\\";

/// 标记后面紧跟非空白字符，并且后文中还有同样的标记才算开启
fn opens(after: &str, marker: &str) -> bool {
    match after.chars().next() {
        Some(first) if !first.is_whitespace() => after[first.len_utf8()..].contains(marker),
        _ => false,
    }
}

/// 把 `**粗体**`、`*斜体*`、`_下划线_`、`~~删除线~~` 解析成样式片段
///
/// 没有闭合的标记按普通字符保留，`\*` 之类的转义输出字符本身。
pub fn parse_markup(text: &str) -> StyledText {
    let mut result = StyledText::new();
    let mut buffer = String::new();
    let mut style = TextStyle::PLAIN;
    let mut index = 0;

    while index < text.len() {
        let rest = &text[index..];

        if let Some(after) = rest.strip_prefix('\\') {
            if let Some(next) = after.chars().next().filter(|c| ESCAPABLE.contains(*c)) {
                buffer.push(next);
                index += 1 + next.len_utf8();
                continue;
            }
        }

        if let Some((marker, emphasis)) = MARKERS.iter().find(|(marker, _)| rest.starts_with(marker)) {
            let active = emphasis.is_active(style);
            if active || opens(&rest[marker.len()..], marker) {
                result.push_str(&buffer, style);
                buffer.clear();
                style = emphasis.apply(style, !active);
                index += marker.len();
                continue;
            }
        }

        match rest.chars().next() {
            Some(ch) => {
                buffer.push(ch);
                index += ch.len_utf8();
            }
            None => break,
        }
    }

    result.push_str(&buffer, style);
    result
}

/// 去掉样式标记后的纯文本
pub fn strip_markup(text: &str) -> String {
    parse_markup(text).plain_text()
}

/// 按配置决定是否解析样式标记
pub fn styled(text: &str, markdown: bool) -> StyledText {
    if markdown {
        parse_markup(text)
    } else {
        StyledText::plain(text)
    }
}
