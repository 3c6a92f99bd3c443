use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

/// 文本样式标记（只作用于文本片段，不作用于整个元素）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    /// 删除线，只在设置时输出，快照结构保持不变
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikeout: bool,
}

impl TextStyle {
    pub const PLAIN: TextStyle = TextStyle {
        bold: false,
        italic: false,
        underline: false,
        strikeout: false,
    };

    pub fn bold() -> Self {
        TextStyle { bold: true, ..Self::PLAIN }
    }

    pub fn italic() -> Self {
        TextStyle { italic: true, ..Self::PLAIN }
    }

    pub fn underline() -> Self {
        TextStyle { underline: true, ..Self::PLAIN }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::PLAIN
    }
}

/// 一段带样式的文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(flatten)]
    pub style: TextStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        TextRun {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextStyle::PLAIN)
    }
}

/// 由样式片段组成的文本
///
/// 规范形式：没有空片段，相邻片段样式不同。所有构造路径都经过 `push`，
/// 因此拼接和切片之后仍保持规范形式。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyledText {
    runs: Vec<TextRun>,
}

impl StyledText {
    pub fn new() -> Self {
        StyledText { runs: Vec::new() }
    }

    pub fn plain(text: &str) -> Self {
        let mut styled = Self::new();
        styled.push_str(text, TextStyle::PLAIN);
        styled
    }

    pub fn from_runs<I: IntoIterator<Item = TextRun>>(runs: I) -> Self {
        let mut styled = Self::new();
        for run in runs {
            styled.push(run);
        }
        styled
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn into_runs(self) -> Vec<TextRun> {
        self.runs
    }

    /// 添加片段，与上一个样式相同的片段会被合并
    pub fn push(&mut self, run: TextRun) {
        if run.text.is_empty() {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.style == run.style => last.text.push_str(&run.text),
            _ => self.runs.push(run),
        }
    }

    pub fn push_str(&mut self, text: &str, style: TextStyle) {
        if !text.is_empty() {
            self.push(TextRun::new(text, style));
        }
    }

    pub fn append(&mut self, other: StyledText) {
        for run in other.runs {
            self.push(run);
        }
    }

    pub fn concat(&self, other: &StyledText) -> StyledText {
        let mut result = self.clone();
        result.append(other.clone());
        result
    }

    /// 扁平化后的纯文本
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// 纯文本的字节长度
    pub fn len(&self) -> usize {
        self.runs.iter().map(|run| run.text.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|run| run.text.trim().is_empty())
    }

    pub fn has_styles(&self) -> bool {
        self.runs.iter().any(|run| !run.style.is_plain())
    }

    /// 按扁平文本的字节区间切片，区间会被收缩到合法的字符边界
    pub fn slice(&self, range: Range<usize>) -> StyledText {
        let plain = self.plain_text();
        let end = floor_char_boundary(&plain, range.end.min(plain.len()));
        let start = floor_char_boundary(&plain, range.start.min(end));

        let mut result = StyledText::new();
        let mut offset = 0;
        for run in &self.runs {
            let run_start = offset;
            let run_end = offset + run.text.len();
            offset = run_end;

            let from = start.max(run_start);
            let to = end.min(run_end);
            if from >= to {
                continue;
            }
            if let Some(piece) = run.text.get(from - run_start..to - run_start) {
                result.push_str(piece, run.style);
            }
        }
        result
    }

    /// 去除首尾空白，片段样式保持不变
    pub fn trim(&self) -> StyledText {
        let plain = self.plain_text();
        let start = plain.len() - plain.trim_start().len();
        let end = plain.trim_end().len();
        if start >= end {
            return StyledText::new();
        }
        self.slice(start..end)
    }
}

impl From<&str> for StyledText {
    fn from(text: &str) -> Self {
        StyledText::plain(text)
    }
}

impl From<String> for StyledText {
    fn from(text: String) -> Self {
        StyledText::plain(&text)
    }
}

impl fmt::Display for StyledText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for run in &self.runs {
            f.write_str(&run.text)?;
        }
        Ok(())
    }
}

pub(crate) fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StyledText {
        StyledText::from_runs(vec![
            TextRun::plain("Hello "),
            TextRun::new("big", TextStyle::bold()),
            TextRun::plain(" world"),
        ])
    }

    #[test]
    fn push_merges_same_style_and_skips_empty() {
        let mut text = StyledText::plain("a");
        text.push(TextRun::plain(""));
        text.push(TextRun::plain("b"));
        text.push(TextRun::new("c", TextStyle::italic()));
        assert_eq!(text.runs().len(), 2);
        assert_eq!(text.runs()[0].text, "ab");
    }

    #[test]
    fn slice_keeps_styles_across_runs() {
        let sliced = sample().slice(3..8);
        assert_eq!(sliced.plain_text(), "lo bi");
        assert_eq!(sliced.runs().len(), 2);
        assert!(sliced.runs()[1].style.bold);
    }

    #[test]
    fn slice_then_concat_is_lossless() {
        let text = sample();
        let left = text.slice(0..7);
        let right = text.slice(7..text.len());
        assert_eq!(left.concat(&right), text);
    }

    #[test]
    fn slice_snaps_to_char_boundary() {
        let text = StyledText::plain("顾清");
        assert_eq!(text.slice(0..4).plain_text(), "顾");
    }

    #[test]
    fn trim_removes_outer_whitespace_only() {
        let text = StyledText::from_runs(vec![
            TextRun::plain("  "),
            TextRun::new("x y", TextStyle::underline()),
            TextRun::plain(" "),
        ]);
        let trimmed = text.trim();
        assert_eq!(trimmed.plain_text(), "x y");
        assert_eq!(trimmed.runs().len(), 1);

        assert!(!text.is_blank());
        assert!(StyledText::plain(" \t").is_blank());
        assert!(StyledText::plain(" \t").trim().is_empty());
    }

    #[test]
    fn strikeout_is_omitted_from_json_when_unset() {
        let json = serde_json::to_value(TextRun::plain("x")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"text": "x", "bold": false, "italic": false, "underline": false})
        );
    }
}
