use log::{debug, info};
use xmltree::{Element as XmlElement, EmitterConfig, XMLNode};

use crate::errors::SerializationError;
use crate::export::RenderOutput;
use crate::fdx::{numbering_attribute, paragraph_type, style_attribute};
use crate::models::{Conf, Document, Element, TITLE_PAGE_KEYS};
use crate::utils::title_key_label;

fn with_attribute(mut element: XmlElement, name: &str, value: &str) -> XmlElement {
    element.attributes.insert(name.to_string(), value.to_string());
    element
}

fn text_node(text: &str, style: Option<String>) -> XmlElement {
    let mut node = XmlElement::new("Text");
    if let Some(style) = style {
        node.attributes.insert("Style".to_string(), style);
    }
    node.children.push(XMLNode::Text(text.to_string()));
    node
}

fn paragraph(element: &Element, number: Option<&str>) -> XmlElement {
    let mut node = with_attribute(XmlElement::new("Paragraph"), "Type", paragraph_type(element.kind()));
    if let Some(number) = number {
        node.attributes.insert("Number".to_string(), number.to_string());
    }
    for run in element.text.runs() {
        node.children
            .push(XMLNode::Element(text_node(&run.text, style_attribute(run.style))));
    }
    node
}

fn title_page(document: &Document) -> XmlElement {
    let mut content = XmlElement::new("Content");
    let known = TITLE_PAGE_KEYS
        .iter()
        .filter_map(|key| document.title_page.get_key_value(*key));
    let others = document
        .title_page
        .iter()
        .filter(|(key, _)| !TITLE_PAGE_KEYS.contains(&key.as_str()));

    for (key, value) in known.chain(others) {
        let mut node = with_attribute(XmlElement::new("Paragraph"), "Alignment", "Center");
        node.attributes.insert("Type".to_string(), "General".to_string());
        let line = format!("{}: {}", title_key_label(key), value);
        node.children.push(XMLNode::Element(text_node(&line, None)));
        content.children.push(XMLNode::Element(node));
    }

    let mut page = XmlElement::new("TitlePage");
    page.children.push(XMLNode::Element(content));
    page
}

/// 把文档写成 FDX
///
/// 共享同一 `dual_group_id` 的连续元素写进一个 `Paragraph > DualDialogue`。
pub fn make_fdx(document: &Document, conf: &Conf) -> Result<RenderOutput, SerializationError> {
    let (mode, numbers) = document.effective_scene_numbers();
    if mode != document.scene_numbering_mode {
        debug!("场景编号按 {:?} 输出", mode);
    }

    let mut content = with_attribute(XmlElement::new("Content"), "SceneNumbering", numbering_attribute(mode));
    let elements = document.elements();
    let mut index = 0;
    while index < elements.len() {
        let element = &elements[index];
        match element.dual_group_id() {
            Some(group) => {
                let mut dual = XmlElement::new("DualDialogue");
                while index < elements.len() && elements[index].dual_group_id() == Some(group) {
                    dual.children
                        .push(XMLNode::Element(paragraph(&elements[index], None)));
                    index += 1;
                }
                let mut wrapper = XmlElement::new("Paragraph");
                wrapper.children.push(XMLNode::Element(dual));
                content.children.push(XMLNode::Element(wrapper));
            }
            None => {
                content
                    .children
                    .push(XMLNode::Element(paragraph(element, numbers[index].as_deref())));
                index += 1;
            }
        }
    }

    let mut root = XmlElement::new("FinalDraft");
    for (name, value) in [("DocumentType", "Script"), ("Template", "No"), ("Version", "5")] {
        root.attributes.insert(name.to_string(), value.to_string());
    }
    root.children.push(XMLNode::Element(content));
    if !document.title_page.is_empty() {
        root.children.push(XMLNode::Element(title_page(document)));
    }

    let mut bytes = Vec::new();
    root.write_with_config(
        &mut bytes,
        EmitterConfig::new()
            .perform_indent(conf.fdx_indent)
            .write_document_declaration(true),
    )?;

    info!("FDX导出完成: {} 个元素, {} 字节", elements.len(), bytes.len());
    Ok(RenderOutput::new(bytes, Vec::new()))
}
