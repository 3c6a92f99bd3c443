use std::collections::BTreeMap;

use log::{debug, info};
use xmltree::{Element as XmlElement, ParserConfig, XMLNode};

use crate::errors::ParseError;
use crate::fdx::{kind_from_type, numbering_from_attribute, parse_style};
use crate::models::diagnostic::report;
use crate::models::{
    Diagnostic, DiagnosticKind, Document, Element, ElementKind, SceneNumberingMode, StyledText,
    TextStyle, TITLE_PAGE_KEYS,
};
use crate::parser::ParseOutput;
use crate::utils::normalize_title_key;
use crate::utils::screenplay_constants::KEY_VALUE;

// 段落内可以安全忽略的子标签（排版或修订信息）
const IGNORED_CHILDREN: [&str; 4] = ["SceneProperties", "DynamicLabel", "ScriptNoteLink", "TaggerLink"];

/// 元素及其所有后代中的文本
///
/// 只含空白的文本节点只在 `<Text>` 里保留，其他位置是排版缩进。
fn flatten_text(element: &XmlElement) -> String {
    let mut text = String::new();
    for node in &element.children {
        match node {
            XMLNode::Text(value) | XMLNode::CData(value) if is_content(element, value) => text.push_str(value),
            XMLNode::Element(child) => text.push_str(&flatten_text(child)),
            _ => {}
        }
    }
    text
}

fn is_content(parent: &XmlElement, value: &str) -> bool {
    parent.name == "Text" || !value.trim().is_empty()
}

fn child_elements(element: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    element.children.iter().filter_map(|node| match node {
        XMLNode::Element(child) => Some(child),
        _ => None,
    })
}

fn attribute<'e>(element: &'e XmlElement, name: &str) -> Option<&'e str> {
    element.attributes.get(name).map(String::as_str)
}

/// FDX 读取器
pub struct FdxReader {
    elements: Vec<Element>,
    diagnostics: Vec<Diagnostic>,
    next_dual_id: u32,
}

impl Default for FdxReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FdxReader {
    pub fn new() -> Self {
        FdxReader {
            elements: Vec::new(),
            diagnostics: Vec::new(),
            next_dual_id: 1,
        }
    }

    pub fn read(mut self, xml: &str) -> Result<ParseOutput, ParseError> {
        // 保留空白文本节点，否则 `<Text> </Text>` 这样的片段会丢失
        let config = ParserConfig::new().whitespace_to_characters(true);
        let root = XmlElement::parse_with_config(xml.as_bytes(), config)?;
        if root.name != "FinalDraft" {
            return Err(ParseError::MissingElement("FinalDraft".to_string()));
        }
        let content = root
            .get_child("Content")
            .ok_or_else(|| ParseError::MissingElement("Content".to_string()))?;

        let paragraph_count = child_elements(content)
            .filter(|child| child.name == "Paragraph")
            .count();
        if paragraph_count == 0 {
            return Err(ParseError::NoElements);
        }

        for section in child_elements(&root) {
            match section.name.as_str() {
                "Content" | "TitlePage" => {}
                other => {
                    debug!("跳过FDX段: {}", other);
                    report(
                        &mut self.diagnostics,
                        Diagnostic::new(DiagnosticKind::Skipped, format!("忽略格式信息 <{}>", other)),
                    );
                }
            }
        }

        for child in child_elements(content) {
            if child.name == "Paragraph" {
                self.read_paragraph_node(child);
            } else {
                self.keep_unknown(child);
            }
        }

        let title_page = match root.get_child("TitlePage") {
            Some(title_page) => self.read_title_page(title_page),
            None => BTreeMap::new(),
        };

        let mut document = Document::from_elements(std::mem::take(&mut self.elements));
        document.title_page = title_page;
        let declared = attribute(content, "SceneNumbering").and_then(numbering_from_attribute);
        self.finish_scene_numbers(&mut document, declared);

        for index in document.heal_orphan_dialogue() {
            report(
                &mut self.diagnostics,
                Diagnostic::new(DiagnosticKind::SelfHealed, "没有角色名的对白已改为动作").at(index),
            );
        }
        // 拆分和修复后分组号可能有空缺
        document.renumber_dual_groups();

        info!(
            "FDX解析完成: {} 个元素, {} 条诊断",
            document.len(),
            self.diagnostics.len()
        );
        Ok(ParseOutput::new(document, self.diagnostics))
    }

    /// 普通段落，或包着 DualDialogue 的段落
    fn read_paragraph_node(&mut self, paragraph: &XmlElement) {
        match paragraph.get_child("DualDialogue") {
            Some(dual) => self.read_dual_dialogue(dual),
            None => self.read_paragraph(paragraph, None),
        }
    }

    fn read_dual_dialogue(&mut self, dual: &XmlElement) {
        let mut group = self.take_dual_id();
        let mut group_used = false;
        for child in child_elements(dual) {
            if child.name != "Paragraph" {
                // 未知标签同样打断分组
                if self.keep_unknown(child) && group_used {
                    group = self.take_dual_id();
                    group_used = false;
                }
                continue;
            }
            let joinable = child
                .attributes
                .get("Type")
                .and_then(|name| kind_from_type(name))
                .map_or(false, |kind| kind.can_join_dual());
            if joinable {
                self.read_paragraph(child, Some(group));
                group_used = true;
            } else {
                // 双对白中间混入其他元素：从这里断开，后面的成员另起一组
                self.read_paragraph(child, None);
                report(
                    &mut self.diagnostics,
                    Diagnostic::new(DiagnosticKind::SelfHealed, "双对白中的非对白元素已移出分组")
                        .at(self.elements.len().saturating_sub(1)),
                );
                if group_used {
                    group = self.take_dual_id();
                    group_used = false;
                }
            }
        }
    }

    fn take_dual_id(&mut self) -> u32 {
        let id = self.next_dual_id;
        self.next_dual_id += 1;
        id
    }

    fn read_paragraph(&mut self, paragraph: &XmlElement, dual_group: Option<u32>) {
        if attribute(paragraph, "StartsNewPage").map_or(false, |value| value.eq_ignore_ascii_case("yes")) {
            self.elements.push(Element::page_break());
        }

        let kind = match attribute(paragraph, "Type") {
            Some(name) => kind_from_type(name).unwrap_or_else(|| {
                report(
                    &mut self.diagnostics,
                    Diagnostic::new(DiagnosticKind::UnknownTag, format!("未知的段落类型 \"{}\"，按动作保留", name))
                        .at(self.elements.len()),
                );
                ElementKind::Action
            }),
            None => {
                report(
                    &mut self.diagnostics,
                    Diagnostic::new(DiagnosticKind::UnknownTag, "段落缺少 Type 属性，按动作保留").at(self.elements.len()),
                );
                ElementKind::Action
            }
        };

        let mut text = StyledText::new();
        let mut leftovers = Vec::new();
        for node in &paragraph.children {
            match node {
                XMLNode::Element(child) if child.name == "Text" => {
                    let style = attribute(child, "Style").map_or(TextStyle::PLAIN, parse_style);
                    text.push_str(&flatten_text(child), style);
                }
                XMLNode::Element(child) if IGNORED_CHILDREN.contains(&child.name.as_str()) => {
                    debug!("忽略段落子标签 <{}>", child.name);
                }
                XMLNode::Element(child) => leftovers.push(child),
                XMLNode::Text(value) | XMLNode::CData(value) if is_content(paragraph, value) => {
                    text.push_str(value, TextStyle::PLAIN)
                }
                _ => {}
            }
        }

        let mut element = Element::new(kind, text);
        if kind == ElementKind::SceneHeading {
            let number = attribute(paragraph, "Number")
                .map(str::trim)
                .filter(|number| !number.is_empty())
                .map(str::to_string);
            element.assign_scene_number(number);
        }
        element.assign_dual_group(dual_group);
        self.elements.push(element);

        for child in leftovers {
            self.keep_unknown(child);
        }
    }

    /// 未知标签：内容按动作保留，返回是否生成了元素
    fn keep_unknown(&mut self, node: &XmlElement) -> bool {
        let text = flatten_text(node);
        let index = self.elements.len();
        if text.trim().is_empty() {
            report(
                &mut self.diagnostics,
                Diagnostic::new(DiagnosticKind::Skipped, format!("忽略空的未知标签 <{}>", node.name)),
            );
            return false;
        }
        report(
            &mut self.diagnostics,
            Diagnostic::new(DiagnosticKind::UnknownTag, format!("未知标签 <{}>，内容按动作保留", node.name)).at(index),
        );
        self.elements.push(Element::new(
            ElementKind::Action,
            StyledText::plain(text.trim()),
        ));
        true
    }

    fn read_title_page(&mut self, title_page: &XmlElement) -> BTreeMap<String, String> {
        let mut entries: BTreeMap<String, String> = BTreeMap::new();
        let paragraphs = title_page
            .get_child("Content")
            .map(|content| child_elements(content).filter(|child| child.name == "Paragraph").collect::<Vec<_>>())
            .unwrap_or_default();

        let mut expect_author = false;
        for paragraph in paragraphs {
            let text = flatten_text(paragraph);
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            if let Some(caps) = KEY_VALUE.captures(text) {
                let key = normalize_title_key(&caps[1]);
                if TITLE_PAGE_KEYS.contains(&key.as_str()) {
                    append_entry(&mut entries, &key, caps[2].trim());
                    expect_author = false;
                    continue;
                }
            }

            let lowered = text.to_lowercase();
            if lowered == "by" || lowered == "written by" {
                expect_author = true;
                continue;
            }
            if expect_author && !entries.contains_key("author") {
                entries.insert("author".to_string(), text.to_string());
            } else if !entries.contains_key("title") {
                entries.insert("title".to_string(), text.to_string());
            } else {
                append_entry(&mut entries, "notes", text);
                report(
                    &mut self.diagnostics,
                    Diagnostic::new(DiagnosticKind::Normalized, format!("标题页文本并入 notes: {}", text)),
                );
            }
            expect_author = false;
        }
        entries
    }

    fn finish_scene_numbers(&mut self, document: &mut Document, declared: Option<SceneNumberingMode>) {
        let numbered = document.iter().any(|el| el.scene_number().is_some());
        let mode = declared.unwrap_or(if numbered {
            SceneNumberingMode::Explicit
        } else {
            SceneNumberingMode::None
        });
        document.scene_numbering_mode = mode;

        if mode == SceneNumberingMode::None && numbered {
            document.clear_scene_numbers();
            report(
                &mut self.diagnostics,
                Diagnostic::new(DiagnosticKind::Normalized, "文档声明不编号，已忽略场景编号"),
            );
        } else if document.normalize_scene_numbers() {
            report(
                &mut self.diagnostics,
                Diagnostic::new(
                    DiagnosticKind::Normalized,
                    format!("场景编号不一致，已规范为 {:?}", document.scene_numbering_mode),
                ),
            );
        }
    }
}

fn append_entry(entries: &mut BTreeMap<String, String>, key: &str, value: &str) {
    match entries.get_mut(key) {
        Some(existing) if !value.is_empty() => {
            if !existing.is_empty() {
                existing.push('\n');
            }
            existing.push_str(value);
        }
        Some(_) => {}
        None => {
            entries.insert(key.to_string(), value.to_string());
        }
    }
}

/// 解析 FDX 文本
pub fn parse_fdx(xml: &str) -> Result<ParseOutput, ParseError> {
    FdxReader::new().read(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<FinalDraft DocumentType="Script" Template="No" Version="5">
  <Content>
    <Paragraph Type="Scene Heading" Number="4"><Text>INT. KITCHEN - DAY</Text></Paragraph>
    <Paragraph Type="Action"><Text>John </Text><Text Style="Bold">slams</Text><Text> the door.</Text></Paragraph>
    <Paragraph Type="Lyrics"><Text>La la la</Text></Paragraph>
  </Content>
  <PageLayout BackgroundColor="#FFFFFFFFFFFF"/>
</FinalDraft>"##;

    #[test]
    fn reads_styles_numbers_and_unknown_types() {
        let output = parse_fdx(SAMPLE).unwrap();
        let doc = &output.document;
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.scene_numbering_mode, SceneNumberingMode::Explicit);
        assert_eq!(doc.elements()[0].scene_number(), Some("4"));
        assert_eq!(doc.elements()[1].text.runs().len(), 3);
        assert!(doc.elements()[1].text.runs()[1].style.bold);
        assert_eq!(doc.elements()[2].kind(), ElementKind::Action);
        assert!(output.diagnostics.iter().any(|d| d.kind == DiagnosticKind::UnknownTag));
        assert!(output.diagnostics.iter().any(|d| d.kind == DiagnosticKind::Skipped));
    }

    #[test]
    fn structural_errors() {
        assert!(matches!(
            parse_fdx("<Script><Content/></Script>"),
            Err(ParseError::MissingElement(_))
        ));
        assert!(matches!(
            parse_fdx("<FinalDraft><Other/></FinalDraft>"),
            Err(ParseError::MissingElement(_))
        ));
        assert!(matches!(
            parse_fdx("<FinalDraft><Content></Content></FinalDraft>"),
            Err(ParseError::NoElements)
        ));
        assert!(matches!(
            parse_fdx("<FinalDraft><Content>"),
            Err(ParseError::Xml(_))
        ));
    }

    #[test]
    fn orphan_dialogue_is_healed() {
        let xml = r#"<FinalDraft><Content>
            <Paragraph Type="Dialogue"><Text>Who said that?</Text></Paragraph>
        </Content></FinalDraft>"#;
        let output = parse_fdx(xml).unwrap();
        assert_eq!(output.document.elements()[0].kind(), ElementKind::Action);
        assert_eq!(output.diagnostics[0].kind, DiagnosticKind::SelfHealed);
    }

    #[test]
    fn title_page_heuristics() {
        let xml = r#"<FinalDraft><Content><Paragraph Type="Action"><Text>x</Text></Paragraph></Content>
          <TitlePage><Content>
            <Paragraph Alignment="Center"><Text>THE LONG NIGHT</Text></Paragraph>
            <Paragraph Alignment="Center"><Text>written by</Text></Paragraph>
            <Paragraph Alignment="Center"><Text>A. Writer</Text></Paragraph>
            <Paragraph><Text>Draft Date: 1 May</Text></Paragraph>
            <Paragraph><Text>Second revision</Text></Paragraph>
          </Content></TitlePage></FinalDraft>"#;
        let output = parse_fdx(xml).unwrap();
        let title_page = &output.document.title_page;
        assert_eq!(title_page.get("title").map(String::as_str), Some("THE LONG NIGHT"));
        assert_eq!(title_page.get("author").map(String::as_str), Some("A. Writer"));
        assert_eq!(title_page.get("draft_date").map(String::as_str), Some("1 May"));
        assert_eq!(title_page.get("notes").map(String::as_str), Some("Second revision"));
    }
}
