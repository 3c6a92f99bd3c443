//! 纯文本剧本解析
//!
//! 逐行单遍扫描，只看前后各一行。每一行按 `RULES` 中的顺序依次尝试，
//! 第一个命中的规则决定元素类型。

use std::collections::BTreeMap;

use log::{debug, info};

use crate::models::diagnostic::report;
use crate::models::{
    Conf, Diagnostic, DiagnosticKind, Document, Element, ElementKind, SceneNumberingMode, StyledText,
    TextStyle,
};
use crate::parser::markup::{strip_markup, styled};
use crate::parser::ParseOutput;
use crate::utils::screenplay_constants::{
    DUAL_MARKER, FORCED_HEADING, FORCED_TRANSITION, LEADING_SCENE_NUMBER, NOTE_LINE, PAGE_BREAK,
    PAGE_NUMBER, PARENTHETICAL, SCENE_HEADING, SHOT, TITLE_PAGE_ENTRY, TRAILING_BARE_NUMBER,
    TRAILING_SCENE_NUMBER, TRANSITION,
};
use crate::utils::{character_name, is_upper_case, normalize_title_key};

/// 角色名最长字符数
pub const MAX_CHARACTER_LEN: usize = 38;
/// 后面没有对白时，仍按角色名处理的最多词数
pub const MAX_BARE_CUE_WORDS: usize = 4;

/// 分类一行时可见的上下文
#[derive(Debug, Clone)]
pub struct LineContext<'a> {
    /// 去掉首尾空白的原始行（保留样式标记）
    pub raw: &'a str,
    /// 去掉样式标记后的文本
    pub plain: String,
    pub prev_blank: bool,
    pub next_blank: bool,
    /// 上一个已生成元素的类型
    pub prev_kind: Option<ElementKind>,
    /// 上一个括号注释还没有闭合
    pub prev_open_paren: bool,
    pub markdown: bool,
    pub allow_fountain: bool,
}

impl<'a> LineContext<'a> {
    /// 孤立的一行：前后都是空行，前面没有元素
    pub fn new(raw: &'a str, conf: &Conf) -> Self {
        let raw = raw.trim();
        let plain = if conf.markdown {
            strip_markup(raw)
        } else {
            raw.to_string()
        };
        LineContext {
            raw,
            plain,
            prev_blank: true,
            next_blank: true,
            prev_kind: None,
            prev_open_paren: false,
            markdown: conf.markdown,
            allow_fountain: conf.allow_fountain,
        }
    }

    fn styled(&self, text: &str) -> StyledText {
        styled(text.trim(), self.markdown)
    }

    /// 紧接在角色名/对白/括号注释之后（中间没有空行）
    fn in_dialogue(&self) -> bool {
        !self.prev_blank
            && matches!(
                self.prev_kind,
                Some(ElementKind::Character | ElementKind::Dialogue | ElementKind::Parenthetical)
            )
    }
}

/// 一行的分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub rule: &'static str,
    pub kind: ElementKind,
    pub text: StyledText,
    pub scene_number: Option<String>,
    /// 角色名带有 `^`
    pub dual: bool,
    /// 并入上一个同类元素
    pub merge_with_previous: bool,
}

impl Classified {
    fn new(rule: &'static str, kind: ElementKind, text: StyledText) -> Self {
        Classified {
            rule,
            kind,
            text,
            scene_number: None,
            dual: false,
            merge_with_previous: false,
        }
    }

    fn merged(mut self, merge: bool) -> Self {
        self.merge_with_previous = merge;
        self
    }
}

/// 分类规则：判断 + 构造
pub struct LineRule {
    pub name: &'static str,
    pub matches: fn(&LineContext) -> bool,
    pub build: fn(&LineContext) -> Classified,
}

/// 按优先级排列，第一个命中的规则生效
pub static RULES: [LineRule; 10] = [
    LineRule { name: "page_break", matches: is_page_break, build: build_page_break },
    LineRule { name: "note", matches: is_note, build: build_note },
    LineRule { name: "forced_action", matches: is_forced_action, build: build_forced_action },
    LineRule { name: "scene_heading", matches: is_scene_heading, build: build_scene_heading },
    LineRule { name: "transition", matches: is_transition, build: build_transition },
    LineRule { name: "shot", matches: is_shot, build: build_shot },
    LineRule { name: "character", matches: is_character, build: build_character },
    LineRule { name: "parenthetical", matches: is_parenthetical, build: build_parenthetical },
    LineRule { name: "dialogue", matches: is_dialogue, build: build_dialogue },
    LineRule { name: "action", matches: |_| true, build: build_action },
];

/// 对一行应用规则表
pub fn classify_line(ctx: &LineContext) -> Classified {
    for rule in RULES.iter() {
        if (rule.matches)(ctx) {
            return (rule.build)(ctx);
        }
    }
    build_action(ctx)
}

// =============================================================================
// 规则
// =============================================================================

fn is_page_break(ctx: &LineContext) -> bool {
    PAGE_BREAK.is_match(ctx.raw)
}

fn build_page_break(_ctx: &LineContext) -> Classified {
    Classified::new("page_break", ElementKind::PageBreak, StyledText::new())
}

fn is_note(ctx: &LineContext) -> bool {
    NOTE_LINE.is_match(ctx.raw)
}

fn build_note(ctx: &LineContext) -> Classified {
    let inner = NOTE_LINE
        .captures(ctx.raw)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str());
    Classified::new("note", ElementKind::Note, StyledText::plain(inner.trim()))
}

fn is_forced_action(ctx: &LineContext) -> bool {
    ctx.allow_fountain && ctx.raw.starts_with('!') && ctx.raw.len() > 1
}

fn build_forced_action(ctx: &LineContext) -> Classified {
    let merge = ctx.prev_kind == Some(ElementKind::Action) && !ctx.prev_blank;
    Classified::new("forced_action", ElementKind::Action, ctx.styled(&ctx.raw[1..])).merged(merge)
}

fn without_leading_number(text: &str) -> &str {
    match LEADING_SCENE_NUMBER.find(text) {
        Some(found) => &text[found.end()..],
        None => text,
    }
}

fn is_scene_heading(ctx: &LineContext) -> bool {
    if ctx.in_dialogue() {
        return false;
    }
    if ctx.allow_fountain && FORCED_HEADING.is_match(ctx.raw) {
        return true;
    }
    SCENE_HEADING.is_match(without_leading_number(&ctx.plain))
}

fn build_scene_heading(ctx: &LineContext) -> Classified {
    if ctx.allow_fountain && FORCED_HEADING.is_match(ctx.raw) {
        let (text, number) = split_trailing_number(&ctx.raw[1..]);
        let mut classified = Classified::new("scene_heading", ElementKind::SceneHeading, ctx.styled(text));
        classified.scene_number = number;
        return classified;
    }

    let mut text = ctx.raw;
    let mut number = None;
    if let Some(caps) = LEADING_SCENE_NUMBER.captures(text) {
        let leading = caps[1].to_string();
        text = &text[caps[0].len()..];
        // 行尾重复的同一编号一并去掉
        if let Some(trailing) = TRAILING_BARE_NUMBER.captures(text) {
            if trailing[1] == leading {
                text = &text[..text.len() - trailing[0].len()];
            }
        }
        number = Some(leading);
    }
    let (text, trailing) = split_trailing_number(text);
    let mut classified = Classified::new("scene_heading", ElementKind::SceneHeading, ctx.styled(text));
    classified.scene_number = number.or(trailing);
    classified
}

fn split_trailing_number(text: &str) -> (&str, Option<String>) {
    match TRAILING_SCENE_NUMBER.captures(text) {
        Some(caps) => {
            let number = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().trim().to_string());
            let start = caps.get(0).map_or(text.len(), |m| m.start());
            (&text[..start], number)
        }
        None => (text, None),
    }
}

fn is_forced_transition(ctx: &LineContext) -> bool {
    ctx.allow_fountain && ctx.raw.starts_with('>') && !ctx.raw.ends_with('<') && ctx.raw.len() > 1
}

fn is_transition(ctx: &LineContext) -> bool {
    if ctx.in_dialogue() {
        return false;
    }
    is_forced_transition(ctx) || (is_upper_case(&ctx.plain) && TRANSITION.is_match(&ctx.plain))
}

fn build_transition(ctx: &LineContext) -> Classified {
    let text = if is_forced_transition(ctx) {
        FORCED_TRANSITION
            .captures(ctx.raw)
            .and_then(|caps| caps.get(1))
            .map_or(&ctx.raw[1..], |m| m.as_str())
    } else {
        ctx.raw
    };
    Classified::new("transition", ElementKind::Transition, ctx.styled(text))
}

fn is_shot(ctx: &LineContext) -> bool {
    ctx.prev_blank && is_upper_case(&ctx.plain) && SHOT.is_match(&ctx.plain)
}

fn build_shot(ctx: &LineContext) -> Classified {
    Classified::new("shot", ElementKind::Shot, ctx.styled(ctx.raw))
}

fn is_forced_character(ctx: &LineContext) -> bool {
    ctx.allow_fountain && ctx.raw.starts_with('@') && ctx.raw.len() > 1
}

fn is_character(ctx: &LineContext) -> bool {
    if is_forced_character(ctx) {
        return true;
    }
    if !ctx.prev_blank || PARENTHETICAL.is_match(&ctx.plain) {
        return false;
    }
    let name = character_name(&ctx.plain);
    if name.chars().count() > MAX_CHARACTER_LEN || !is_upper_case(&name) {
        return false;
    }
    // 以句末标点结尾的全大写行更像动作
    if name.ends_with(['.', '!', '?', ',', ';']) {
        return false;
    }
    !ctx.next_blank || name.split_whitespace().count() <= MAX_BARE_CUE_WORDS
}

fn build_character(ctx: &LineContext) -> Classified {
    let mut text = if is_forced_character(ctx) {
        &ctx.raw[1..]
    } else {
        ctx.raw
    };
    let mut dual = false;
    if ctx.allow_fountain {
        if let Some(found) = DUAL_MARKER.find(text) {
            text = &text[..found.start()];
            dual = true;
        }
    }
    let mut classified = Classified::new("character", ElementKind::Character, ctx.styled(text));
    classified.dual = dual;
    classified
}

fn opens_parenthetical(plain: &str) -> bool {
    PARENTHETICAL.is_match(plain)
        || ((plain.starts_with('(') || plain.starts_with('（')) && !plain.contains([')', '）']))
}

fn continues_parenthetical(ctx: &LineContext) -> bool {
    !ctx.prev_blank && ctx.prev_open_paren && ctx.prev_kind == Some(ElementKind::Parenthetical)
}

fn is_parenthetical(ctx: &LineContext) -> bool {
    continues_parenthetical(ctx)
        || (opens_parenthetical(&ctx.plain)
            && matches!(
                ctx.prev_kind,
                Some(ElementKind::Character | ElementKind::Dialogue | ElementKind::Parenthetical)
            ))
}

fn build_parenthetical(ctx: &LineContext) -> Classified {
    Classified::new("parenthetical", ElementKind::Parenthetical, ctx.styled(ctx.raw))
        .merged(continues_parenthetical(ctx))
}

fn is_dialogue(ctx: &LineContext) -> bool {
    ctx.in_dialogue()
}

fn build_dialogue(ctx: &LineContext) -> Classified {
    Classified::new("dialogue", ElementKind::Dialogue, ctx.styled(ctx.raw))
        .merged(ctx.prev_kind == Some(ElementKind::Dialogue))
}

fn build_action(ctx: &LineContext) -> Classified {
    let merge = ctx.prev_kind == Some(ElementKind::Action) && !ctx.prev_blank;
    Classified::new("action", ElementKind::Action, ctx.styled(ctx.raw)).merged(merge)
}

// =============================================================================
// 预处理
// =============================================================================

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// 删除前后都是空行（或文件边界）的页码行
fn strip_page_numbers(lines: Vec<String>) -> Vec<String> {
    let is_blank = |index: Option<&String>| index.map_or(true, |line| line.trim().is_empty());
    let mut kept = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let prev = index.checked_sub(1).and_then(|i| lines.get(i));
        if PAGE_NUMBER.is_match(line) && is_blank(prev) && is_blank(lines.get(index + 1)) {
            debug!("删除页码行: {}", line.trim());
            continue;
        }
        kept.push(line.clone());
    }
    kept
}

fn may_wrap_after(prev: &str, line: &str) -> bool {
    let prev = prev.trim();
    let line = line.trim();
    if line.starts_with('(') || line.starts_with('（') {
        return false;
    }
    if PARENTHETICAL.is_match(prev) || SCENE_HEADING.is_match(without_leading_number(prev)) {
        return false;
    }
    let name = character_name(prev);
    !(is_upper_case(&name) && name.chars().count() <= MAX_CHARACTER_LEN)
}

/// 合并同一缩进下被折行的文本（排版后的剧本对白通常会被折成多行）
fn join_wrapped_lines(lines: Vec<String>) -> Vec<String> {
    let mut joined: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(prev) = joined.last_mut() {
            let indent = leading_whitespace(&line);
            if !line.trim().is_empty()
                && !prev.trim().is_empty()
                && !indent.is_empty()
                && indent == leading_whitespace(prev)
                && may_wrap_after(prev, &line)
            {
                prev.push(' ');
                prev.push_str(line.trim());
                continue;
            }
        }
        joined.push(line);
    }
    joined
}

// =============================================================================
// 解析器
// =============================================================================

/// 纯文本剧本解析器
pub struct PlainTextParser<'c> {
    conf: &'c Conf,
    elements: Vec<Element>,
    diagnostics: Vec<Diagnostic>,
    /// 带 `^` 的角色名下标
    dual_requests: Vec<usize>,
}

impl<'c> PlainTextParser<'c> {
    pub fn new(conf: &'c Conf) -> Self {
        PlainTextParser {
            conf,
            elements: Vec::new(),
            diagnostics: Vec::new(),
            dual_requests: Vec::new(),
        }
    }

    /// 解析文本，任何可解码的文本都不会失败
    pub fn parse(mut self, script: &str) -> ParseOutput {
        if script.is_empty() {
            return ParseOutput::new(Document::new(), self.diagnostics);
        }

        let normalized = script.replace("\r\n", "\n").replace('\r', "\n");
        let mut lines: Vec<String> = normalized.split('\n').map(|line| line.replace('\t', "    ")).collect();
        if self.conf.strip_page_numbers {
            lines = strip_page_numbers(lines);
        }
        if self.conf.join_wrapped_lines {
            lines = join_wrapped_lines(lines);
        }

        let mut title_page = BTreeMap::new();
        let body_start = if self.conf.parse_title_page {
            self.parse_title_page(&lines, &mut title_page)
        } else {
            0
        };
        self.classify_lines(&lines[body_start..]);

        if self.elements.is_empty() {
            // 没有任何可识别的内容：整段输入作为一个动作保留
            debug!("未识别出任何元素，整段输入作为动作保留");
            title_page.clear();
            self.elements.push(Element::new(ElementKind::Action, script));
        }

        self.apply_dual_requests();
        let mut document = Document::from_elements(std::mem::take(&mut self.elements));
        document.title_page = title_page;
        self.finish_scene_numbers(&mut document);
        for index in document.heal_orphan_dialogue() {
            report(
                &mut self.diagnostics,
                Diagnostic::new(DiagnosticKind::SelfHealed, "没有角色名的对白已改为动作").at(index),
            );
        }

        info!(
            "纯文本解析完成: {} 个元素, {} 条诊断",
            document.len(),
            self.diagnostics.len()
        );
        ParseOutput::new(document, self.diagnostics)
    }

    /// 读取开头的标题页，返回正文开始的行号
    fn parse_title_page(&mut self, lines: &[String], title_page: &mut BTreeMap<String, String>) -> usize {
        let first = match lines.iter().position(|line| !line.trim().is_empty()) {
            Some(first) => first,
            None => return 0,
        };
        if !TITLE_PAGE_ENTRY.is_match(&lines[first]) {
            return 0;
        }

        let mut current: Option<String> = None;
        let mut index = first;
        while index < lines.len() && !lines[index].trim().is_empty() {
            let line = &lines[index];
            if let Some(caps) = TITLE_PAGE_ENTRY.captures(line) {
                let key = normalize_title_key(&caps[1]);
                let value = strip_markup(caps[2].trim());
                title_page
                    .entry(key.clone())
                    .and_modify(|existing| {
                        if !value.is_empty() {
                            if !existing.is_empty() {
                                existing.push('\n');
                            }
                            existing.push_str(&value);
                        }
                    })
                    .or_insert(value);
                current = Some(key);
            } else if let Some(value) = current.as_ref().and_then(|key| title_page.get_mut(key)) {
                if !value.is_empty() {
                    value.push('\n');
                }
                value.push_str(&strip_markup(line.trim()));
            }
            index += 1;
        }
        debug!("标题页: {:?}", title_page.keys().collect::<Vec<_>>());
        index
    }

    fn classify_lines(&mut self, lines: &[String]) {
        let mut prev_blank = true;
        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                prev_blank = true;
                continue;
            }

            let mut ctx = LineContext::new(line, self.conf);
            ctx.prev_blank = prev_blank;
            ctx.next_blank = lines.get(index + 1).map_or(true, |next| next.trim().is_empty());
            ctx.prev_kind = self.elements.last().map(Element::kind);
            ctx.prev_open_paren = self.elements.last().map_or(false, |el| {
                let text = el.plain_text();
                let text = text.trim_end();
                el.kind() == ElementKind::Parenthetical && !text.ends_with([')', '）'])
            });

            let classified = classify_line(&ctx);
            self.push_classified(classified);
            prev_blank = false;
        }
    }

    fn push_classified(&mut self, classified: Classified) {
        if classified.merge_with_previous {
            if let Some(last) = self.elements.last_mut() {
                if last.kind() == classified.kind {
                    last.text.push_str("\n", TextStyle::PLAIN);
                    last.text.append(classified.text);
                    return;
                }
            }
        }

        let mut element = Element::new(classified.kind, classified.text);
        element.assign_scene_number(classified.scene_number);
        if classified.dual {
            self.dual_requests.push(self.elements.len());
        }
        self.elements.push(element);
    }

    /// `^` 角色与前一个角色块组成双对白
    fn apply_dual_requests(&mut self) {
        let mut next_id = 1;
        for &index in &std::mem::take(&mut self.dual_requests) {
            let partner = self.elements[..index]
                .iter()
                .rposition(|el| !el.kind().is_dialogue_part())
                .filter(|&i| self.elements[i].kind() == ElementKind::Character)
                .filter(|&i| self.elements[i].dual_group_id().is_none());

            let start = match partner {
                Some(start) => start,
                None => {
                    report(
                        &mut self.diagnostics,
                        Diagnostic::new(DiagnosticKind::SelfHealed, "双对白标记 ^ 前面没有可配对的角色，已忽略")
                            .at(index),
                    );
                    continue;
                }
            };
            let end = self.elements[index + 1..]
                .iter()
                .position(|el| !el.kind().is_dialogue_part())
                .map_or(self.elements.len(), |offset| index + 1 + offset);

            for element in &mut self.elements[start..end] {
                element.assign_dual_group(Some(next_id));
            }
            next_id += 1;
        }
    }

    fn finish_scene_numbers(&mut self, document: &mut Document) {
        let numbered = document.iter().any(|el| el.scene_number().is_some());
        if !numbered {
            document.scene_numbering_mode = SceneNumberingMode::None;
            return;
        }
        document.scene_numbering_mode = SceneNumberingMode::Explicit;
        if document.scene_numbers_mixed() {
            document.normalize_scene_numbers();
            report(
                &mut self.diagnostics,
                Diagnostic::new(
                    DiagnosticKind::Normalized,
                    "部分场景标题缺少编号，已改为自动编号",
                ),
            );
        }
    }
}

/// 解析纯文本剧本
pub fn parse_plain_text(script: &str, conf: &Conf) -> ParseOutput {
    PlainTextParser::new(conf).parse(script)
}
