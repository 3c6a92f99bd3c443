pub mod screenplay_constants;

use screenplay_constants::{CHARACTER_EXTENSION, DUAL_MARKER};

/// 至少含一个大写字母且没有小写字母
///
/// 中文等无大小写的文字不算大写。
pub fn is_upper_case(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

/// 去掉角色名后面的扩展标记（可能有多个）
pub fn strip_character_extension(text: &str) -> &str {
    let mut name = text.trim_end();
    while let Some(found) = CHARACTER_EXTENSION.find(name) {
        if found.start() == 0 {
            break;
        }
        name = name[..found.start()].trim_end();
    }
    name
}

/// 角色名本身：去掉 @、^ 以及扩展标记
pub fn character_name(text: &str) -> String {
    let text = text.trim();
    let text = text.strip_prefix('@').unwrap_or(text);
    let text = match DUAL_MARKER.find(text) {
        Some(found) => &text[..found.start()],
        None => text,
    };
    strip_character_extension(text).trim().to_string()
}

/// 标题页键名规范化：小写、空格转下划线、合并同义键
pub fn normalize_title_key(key: &str) -> String {
    let key = key.trim().to_lowercase().replace([' ', '-'], "_");
    match key.as_str() {
        "authors" | "written_by" => "author".to_string(),
        "contact_info" => "contact".to_string(),
        "date" | "draft" => "draft_date".to_string(),
        _ => key,
    }
}

/// 标题页键名的显示形式：draft_date -> Draft Date
pub fn title_key_label(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_names() {
        assert_eq!(character_name("JOHN (V.O.) (CONT'D)"), "JOHN");
        assert_eq!(character_name("@McCLANE ^"), "McCLANE");
        assert_eq!(character_name("顾清（画外音）"), "顾清");
        assert_eq!(character_name("(BEAT)"), "(BEAT)");
    }

    #[test]
    fn upper_case() {
        assert!(is_upper_case("JOHN (V.O.)"));
        assert!(!is_upper_case("John"));
        assert!(!is_upper_case("顾清"));
        assert!(!is_upper_case("123"));
    }

    #[test]
    fn title_keys() {
        assert_eq!(normalize_title_key("Draft Date"), "draft_date");
        assert_eq!(normalize_title_key("Authors"), "author");
        assert_eq!(normalize_title_key("Contact Info"), "contact");
        assert_eq!(title_key_label("draft_date"), "Draft Date");
    }
}
