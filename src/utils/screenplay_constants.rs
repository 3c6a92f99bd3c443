use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 场景标题前缀（已去掉行首场景编号）
    // EST 和完整单词只认大写，避免 "Est. 1850" 这类正文
    pub static ref SCENE_HEADING: Regex = Regex::new(
        r"^(?:(?i:int\.?\s*/\s*ext|ext\.?\s*/\s*int|i\.?\s*/\s*e|int|ext)|INTERIOR|EXTERIOR|EST)(?:[.\s]|$)"
    ).unwrap();

    // 行首场景编号：12 / 12A / 12. / 12-
    pub static ref LEADING_SCENE_NUMBER: Regex = Regex::new(r"^\s*(\d+[A-Z]?)[.\s-]+").unwrap();

    // 行尾场景编号：#12# 或 (12)
    pub static ref TRAILING_SCENE_NUMBER: Regex = Regex::new(
        r"\s*(?:#\s*([^#\s][^#]*?)\s*#|\((\d{1,3}[A-Za-z]?)\))\s*$"
    ).unwrap();

    // 拍摄稿中行尾重复的编号：INT. HOUSE - DAY   12
    pub static ref TRAILING_BARE_NUMBER: Regex = Regex::new(r"\s+(\d+[A-Z]?)\s*$").unwrap();

    pub static ref FORCED_HEADING: Regex = Regex::new(r"^\.([^.\s].*)$").unwrap();

    pub static ref TRANSITION: Regex = Regex::new(
        r"^(?:[^\p{Ll}]+\bTO:|FADE IN:?|FADE OUT[.:]?|FADE TO BLACK[.:]?|CUT TO BLACK[.:]?|THE END\.?)$"
    ).unwrap();

    pub static ref FORCED_TRANSITION: Regex = Regex::new(r"^>\s*(.+?)\s*$").unwrap();

    // 镜头用语
    pub static ref SHOT: Regex = Regex::new(
        r"^(?:ANGLE ON|CLOSE ON|CLOSE UP|CLOSE-UP|CLOSEUP|EXTREME CLOSE|INSERT|POV|WIDE SHOT|WIDE ON|MEDIUM SHOT|TWO SHOT|TRACKING SHOT|AERIAL SHOT|REVERSE ANGLE|BACK TO SCENE)\b"
    ).unwrap();

    // 角色名后的扩展标记：(V.O.) (CONT'D) （画外音）
    pub static ref CHARACTER_EXTENSION: Regex = Regex::new(r"\s*(?:\([^()]*\)|（[^（）]*）)\s*$").unwrap();

    pub static ref DUAL_MARKER: Regex = Regex::new(r"\s*\^\s*$").unwrap();

    pub static ref PARENTHETICAL: Regex = Regex::new(r"^(?:\([^()]*\)|（[^（）]*）)$").unwrap();

    pub static ref PAGE_BREAK: Regex = Regex::new(r"^\s*={3,}\s*$").unwrap();

    pub static ref NOTE_LINE: Regex = Regex::new(r"^\s*\[\[(.*?)\]\]\s*$").unwrap();

    // 单独成行的页码：12 / 12. / p. 12 / Page 12 / - 12 -
    pub static ref PAGE_NUMBER: Regex = Regex::new(
        r"(?i)^\s*-?\s*(?:(?:page|pg|p)\.?\s*)?\d+\.?\s*-?\s*$"
    ).unwrap();

    // 标题页中已知的键
    pub static ref TITLE_PAGE_ENTRY: Regex = Regex::new(
        r"(?i)^\s*(title|credit|authors?|source|draft date|date|contact(?: info)?|copyright|notes|revision)\s*:\s*(.*)$"
    ).unwrap();

    // 任意 Key: value
    pub static ref KEY_VALUE: Regex = Regex::new(r"(?s)^\s*([A-Za-z][A-Za-z _]{0,29})\s*:\s*(.*)$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_heading_prefixes() {
        for line in ["INT. KITCHEN - DAY", "ext house", "INT./EXT. CAR", "I/E CAR", "EST. CITY"] {
            assert!(SCENE_HEADING.is_match(line), "{}", line);
        }
        assert!(!SCENE_HEADING.is_match("INTERESTING THINGS"));
        assert!(!SCENE_HEADING.is_match("Exterminate"));
    }

    #[test]
    fn establishing_prefix_is_upper_case_only() {
        assert!(SCENE_HEADING.is_match("EST. HARBOUR TOWN - DAY"));
        assert!(!SCENE_HEADING.is_match("Est. 1850, the town grew."));
        assert!(!SCENE_HEADING.is_match("est. 1850"));
        assert!(!SCENE_HEADING.is_match("Interior design was her trade."));
    }

    #[test]
    fn transitions() {
        assert!(TRANSITION.is_match("CUT TO:"));
        assert!(TRANSITION.is_match("SMASH CUT TO:"));
        assert!(TRANSITION.is_match("FADE OUT."));
        assert!(!TRANSITION.is_match("Walk to:"));
    }

    #[test]
    fn page_numbers() {
        for line in ["12", "12.", "p. 3", "Page 4", "- 7 -"] {
            assert!(PAGE_NUMBER.is_match(line), "{}", line);
        }
        assert!(!PAGE_NUMBER.is_match("12 MONKEYS"));
    }
}
