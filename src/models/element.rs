use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::models::styled_text::StyledText;

/// 剧本元素类型（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    SceneHeading,
    Action,
    Character,
    Dialogue,
    Parenthetical,
    Transition,
    Shot,
    DualDialogueBlock,
    PageBreak,
    Note,
}

impl ElementKind {
    pub const ALL: [ElementKind; 10] = [
        ElementKind::SceneHeading,
        ElementKind::Action,
        ElementKind::Character,
        ElementKind::Dialogue,
        ElementKind::Parenthetical,
        ElementKind::Transition,
        ElementKind::Shot,
        ElementKind::DualDialogueBlock,
        ElementKind::PageBreak,
        ElementKind::Note,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::SceneHeading => "scene_heading",
            ElementKind::Action => "action",
            ElementKind::Character => "character",
            ElementKind::Dialogue => "dialogue",
            ElementKind::Parenthetical => "parenthetical",
            ElementKind::Transition => "transition",
            ElementKind::Shot => "shot",
            ElementKind::DualDialogueBlock => "dual_dialogue_block",
            ElementKind::PageBreak => "page_break",
            ElementKind::Note => "note",
        }
    }

    /// 对白块内部元素（需要角色名统领）
    pub fn is_dialogue_part(&self) -> bool {
        matches!(self, ElementKind::Dialogue | ElementKind::Parenthetical)
    }

    /// 可以参与双对白分组的元素
    pub fn can_join_dual(&self) -> bool {
        matches!(
            self,
            ElementKind::Character | ElementKind::Dialogue | ElementKind::Parenthetical
        )
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 剧本中的一个结构单元
///
/// `kind` 创建后不可修改；`scene_number` 只属于场景标题，
/// `dual_group_id` 只属于参与双对白的角色名/对白/括号注释。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    kind: ElementKind,
    pub text: StyledText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scene_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dual_group_id: Option<u32>,
}

impl Element {
    pub fn new(kind: ElementKind, text: impl Into<StyledText>) -> Self {
        Element {
            kind,
            text: text.into(),
            scene_number: None,
            dual_group_id: None,
        }
    }

    pub fn scene_heading(text: impl Into<StyledText>, scene_number: Option<String>) -> Self {
        Element {
            scene_number,
            ..Element::new(ElementKind::SceneHeading, text)
        }
    }

    pub fn page_break() -> Self {
        Element::new(ElementKind::PageBreak, StyledText::new())
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn scene_number(&self) -> Option<&str> {
        self.scene_number.as_deref()
    }

    pub fn dual_group_id(&self) -> Option<u32> {
        self.dual_group_id
    }

    pub fn plain_text(&self) -> String {
        self.text.plain_text()
    }

    pub fn set_scene_number(&mut self, number: Option<String>) -> Result<(), ValidationError> {
        if number.is_some() && self.kind != ElementKind::SceneHeading {
            return Err(ValidationError::SceneNumberOnNonHeading(self.kind));
        }
        self.scene_number = number;
        Ok(())
    }

    pub fn set_dual_group_id(&mut self, id: Option<u32>) -> Result<(), ValidationError> {
        if id.is_some() && !self.kind.can_join_dual() {
            return Err(ValidationError::DualGroupOnNonDialogue(self.kind));
        }
        self.dual_group_id = id;
        Ok(())
    }

    pub fn with_dual_group(mut self, id: u32) -> Result<Self, ValidationError> {
        self.set_dual_group_id(Some(id))?;
        Ok(self)
    }

    // 解析器内部使用：只在类型允许时赋值
    pub(crate) fn assign_scene_number(&mut self, number: Option<String>) {
        if self.kind == ElementKind::SceneHeading {
            self.scene_number = number;
        }
    }

    pub(crate) fn assign_dual_group(&mut self, id: Option<u32>) {
        if self.kind.can_join_dual() {
            self.dual_group_id = id;
        }
    }

    /// 检查与类型相关的字段
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        if self.scene_number.is_some() && self.kind != ElementKind::SceneHeading {
            return Err(ValidationError::SceneNumberOnNonHeading(self.kind));
        }
        if self.dual_group_id.is_some() && !self.kind.can_join_dual() {
            return Err(ValidationError::DualGroupOnNonDialogue(self.kind));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_number_only_on_headings() {
        let mut action = Element::new(ElementKind::Action, "He runs.");
        assert_eq!(
            action.set_scene_number(Some("1".to_string())),
            Err(ValidationError::SceneNumberOnNonHeading(ElementKind::Action))
        );
        let mut heading = Element::scene_heading("INT. HOUSE - DAY", None);
        assert!(heading.set_scene_number(Some("1".to_string())).is_ok());
        assert_eq!(heading.scene_number(), Some("1"));
    }

    #[test]
    fn dual_group_only_on_dialogue_parts() {
        assert!(Element::new(ElementKind::Character, "JOHN").with_dual_group(1).is_ok());
        assert!(Element::new(ElementKind::Transition, "CUT TO:").with_dual_group(1).is_err());
    }

    #[test]
    fn kind_serializes_in_snake_case() {
        let json = serde_json::to_value(ElementKind::SceneHeading).unwrap();
        assert_eq!(json, serde_json::json!("scene_heading"));
        for kind in ElementKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), serde_json::json!(kind.as_str()));
        }
    }
}
