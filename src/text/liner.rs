use unicode_segmentation::UnicodeSegmentation;

use crate::models::{ElementKind, LayoutProfile};

/// 排版后的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 行类型
    pub kind: ElementKind,
    /// 行文本（已包含缩进）
    pub text: String,
    /// 所属元素下标
    pub element_index: usize,
    /// 在元素中的行号
    pub local_index: usize,
    /// 全局行号
    pub global_index: usize,
}

/// 行处理器：把元素文本切成带缩进的行
pub struct Liner<'p> {
    profile: &'p LayoutProfile,
    /// false 时不缩进也不折行
    spacing: bool,
}

impl<'p> Liner<'p> {
    pub fn new(profile: &'p LayoutProfile, spacing: bool) -> Self {
        Liner { profile, spacing }
    }

    /// 元素类型对应的（缩进, 行宽）
    pub fn geometry(&self, kind: ElementKind) -> (usize, usize) {
        let p = self.profile;
        match kind {
            ElementKind::Character => (p.character_indent, p.action_width.saturating_sub(p.character_indent)),
            ElementKind::Parenthetical => (p.parenthetical_indent, p.parenthetical_width),
            ElementKind::Dialogue => (p.dialogue_indent, p.dialogue_width),
            _ => (0, p.action_width),
        }
    }

    /// 分割元素为行
    pub fn split_element(&self, kind: ElementKind, text: &str, element_index: usize) -> Vec<Line> {
        let text = text.replace('\t', "    ");
        // 分页符原样输出，换页符本身是空白，不能经过折行
        let raw_lines: Vec<String> = if !self.spacing || kind == ElementKind::PageBreak {
            text.split('\n').map(str::to_string).collect()
        } else if kind == ElementKind::Transition {
            text.split('\n')
                .map(|line| {
                    let width = line.chars().count();
                    let indent = self.profile.transition_column.saturating_sub(width);
                    format!("{}{}", " ".repeat(indent), line)
                })
                .collect()
        } else {
            let (indent, width) = self.geometry(kind);
            let pad = " ".repeat(indent);
            text.split('\n')
                .flat_map(|line| wrap_line(line, width.max(1)))
                .map(|line| if line.is_empty() { line } else { format!("{}{}", pad, line) })
                .collect()
        };

        raw_lines
            .into_iter()
            .enumerate()
            .map(|(local_index, text)| Line {
                kind,
                text,
                element_index,
                local_index,
                global_index: 0, // 将在 lines 中设置
            })
            .collect()
    }

    /// 处理元素为行，元素之间按规则插入空行
    pub fn lines<'t, I>(&self, elements: I) -> Vec<Line>
    where
        I: IntoIterator<Item = (ElementKind, &'t str)>,
    {
        let mut lines: Vec<Line> = Vec::new();
        let mut prev_kind: Option<ElementKind> = None;

        for (element_index, (kind, text)) in elements.into_iter().enumerate() {
            if let Some(prev) = prev_kind {
                if !self.spacing || !continues_block(prev, kind) {
                    lines.push(Line {
                        kind,
                        text: String::new(),
                        element_index,
                        local_index: 0,
                        global_index: 0,
                    });
                }
            }
            lines.extend(self.split_element(kind, text, element_index));
            prev_kind = Some(kind);
        }

        for (global_index, line) in lines.iter_mut().enumerate() {
            line.global_index = global_index;
        }
        lines
    }
}

/// 角色名/括号注释/对白之后紧跟括号注释或对白时不空行
fn continues_block(prev: ElementKind, next: ElementKind) -> bool {
    matches!(
        prev,
        ElementKind::Character | ElementKind::Parenthetical | ElementKind::Dialogue
    ) && matches!(next, ElementKind::Parenthetical | ElementKind::Dialogue)
}

/// 按 Unicode 词边界折行，超长的词按字素切开
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let mut wrapped = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for word in line.split_word_bounds() {
        let word_width = word.graphemes(true).count();
        if current_width + word_width <= width {
            current.push_str(word);
            current_width += word_width;
            continue;
        }

        if word.trim().is_empty() {
            // 行尾的空白直接丢掉
            wrapped.push(std::mem::take(&mut current).trim_end().to_string());
            current_width = 0;
            continue;
        }

        if !current.trim().is_empty() {
            wrapped.push(std::mem::take(&mut current).trim_end().to_string());
            current_width = 0;
        } else {
            current.clear();
            current_width = 0;
        }

        if word_width <= width {
            current.push_str(word);
            current_width = word_width;
        } else {
            for grapheme in word.graphemes(true) {
                if current_width == width {
                    wrapped.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                current.push_str(grapheme);
                current_width += 1;
            }
        }
    }

    if !current.is_empty() || wrapped.is_empty() {
        wrapped.push(current.trim_end().to_string());
    }
    wrapped
}
