//! JSON 快照
//!
//! 结构与 Document 一一对应：
//! `{ "title_page": {..}, "scene_numbering_mode": "none|auto|explicit", "elements": [..] }`

use std::io::Read;

use log::debug;
use serde_json::Value;

use crate::errors::{ParseError, SerializationError};
use crate::export::RenderOutput;
use crate::models::{Conf, Document, StyledText};
use crate::parser::ParseOutput;

pub fn to_value(document: &Document) -> Result<Value, SerializationError> {
    Ok(serde_json::to_value(document)?)
}

pub fn serialize(document: &Document, pretty: bool) -> Result<Vec<u8>, SerializationError> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(document)?
    } else {
        serde_json::to_vec(document)?
    };
    Ok(bytes)
}

/// 校验与类型相关的字段，并把文本片段恢复成规范形式
fn validated(mut document: Document) -> Result<Document, ParseError> {
    for index in 0..document.len() {
        if let Some(element) = document.element_mut(index) {
            element
                .validate_fields()
                .map_err(|err| ParseError::InvalidSnapshot(format!("元素#{}: {}", index, err)))?;
            let runs = std::mem::take(&mut element.text).into_runs();
            element.text = StyledText::from_runs(runs);
        }
    }
    Ok(document)
}

pub fn from_value(value: Value) -> Result<Document, ParseError> {
    if !value.is_object() {
        return Err(ParseError::InvalidSnapshot("快照必须是 JSON 对象".to_string()));
    }
    let document: Document = serde_json::from_value(value)?;
    validated(document)
}

pub fn deserialize(bytes: &[u8]) -> Result<Document, ParseError> {
    let value: Value = serde_json::from_slice(bytes)?;
    from_value(value)
}

pub fn read<R: Read>(reader: R) -> Result<Document, ParseError> {
    let value: Value = serde_json::from_reader(reader)?;
    from_value(value)
}

/// 作为输入格式解析
pub fn parse_snapshot(bytes: &[u8]) -> Result<ParseOutput, ParseError> {
    let document = deserialize(bytes)?;
    debug!("快照读取完成: {} 个元素", document.len());
    Ok(ParseOutput::new(document, Vec::new()))
}

/// 作为输出格式导出
pub fn make_snapshot(document: &Document, conf: &Conf) -> Result<RenderOutput, SerializationError> {
    let bytes = serialize(document, conf.pretty_snapshot)?;
    Ok(RenderOutput::new(bytes, Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Element, ElementKind};
    use serde_json::json;

    #[test]
    fn wire_shape() {
        let document = Document::from_elements(vec![Element::scene_heading("INT. A", Some("1".to_string()))]);
        let value = to_value(&document).unwrap();
        assert_eq!(
            value,
            json!({
                "title_page": {},
                "scene_numbering_mode": "none",
                "elements": [{
                    "kind": "scene_heading",
                    "text": [{"text": "INT. A", "bold": false, "italic": false, "underline": false}],
                    "scene_number": "1"
                }]
            })
        );
    }

    #[test]
    fn rejects_fields_on_wrong_kind() {
        let value = json!({
            "elements": [{"kind": "action", "text": [], "scene_number": "3"}]
        });
        assert!(matches!(from_value(value), Err(ParseError::InvalidSnapshot(_))));

        let value = json!({
            "elements": [{"kind": "transition", "text": [], "dual_group_id": 1}]
        });
        assert!(matches!(from_value(value), Err(ParseError::InvalidSnapshot(_))));
    }

    #[test]
    fn bad_json_and_unknown_kind() {
        assert!(matches!(deserialize(b"{nope"), Err(ParseError::Json(_))));
        assert!(matches!(deserialize(b"[]"), Err(ParseError::InvalidSnapshot(_))));
        let value = json!({"elements": [{"kind": "montage", "text": []}]});
        assert!(matches!(from_value(value), Err(ParseError::Json(_))));
    }

    #[test]
    fn adjacent_runs_are_merged() {
        let value = json!({
            "elements": [{"kind": "action", "text": [
                {"text": "a", "bold": false, "italic": false, "underline": false},
                {"text": "b", "bold": false, "italic": false, "underline": false}
            ]}]
        });
        let document = from_value(value).unwrap();
        assert_eq!(document.elements()[0].text, StyledText::plain("ab"));
        assert_eq!(document.elements()[0].kind(), ElementKind::Action);
    }
}
