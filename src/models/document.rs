use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::models::element::{Element, ElementKind};
use crate::models::styled_text::StyledText;
use crate::utils::character_name;

/// 标题页已知的键（其他键原样保留）
pub const TITLE_PAGE_KEYS: [&str; 9] = [
    "title",
    "credit",
    "author",
    "source",
    "draft_date",
    "contact",
    "copyright",
    "notes",
    "revision",
];

/// 场景编号方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneNumberingMode {
    #[default]
    None,
    Auto,
    Explicit,
}

/// 整个剧本
///
/// 元素顺序即呈现顺序。结构修改只能通过编辑操作完成，
/// 编辑失败时会回滚并返回 `ValidationError`。
/// 同一个 Document 同一时间只允许一个修改者，这由调用方保证。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub title_page: BTreeMap<String, String>,
    #[serde(default)]
    pub scene_numbering_mode: SceneNumberingMode,
    #[serde(default)]
    elements: Vec<Element>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接由元素构造，不做校验（需要时调用 `validate_character_precedes_dialogue`）
    pub fn from_elements(elements: Vec<Element>) -> Self {
        Document {
            elements,
            ..Self::default()
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// 可以修改元素文本和附加字段，类型不可变
    pub fn element_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.elements.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn title(&self) -> Option<&str> {
        self.title_page.get("title").map(String::as_str)
    }

    // =========================================================================
    // 编辑操作
    // =========================================================================

    pub fn push(&mut self, element: Element) -> Result<(), ValidationError> {
        self.apply_edit(|elements| {
            elements.push(element);
            Ok(())
        })
    }

    pub fn insert(&mut self, index: usize, element: Element) -> Result<(), ValidationError> {
        self.apply_edit(|elements| {
            if index > elements.len() {
                return Err(ValidationError::IndexOutOfBounds {
                    index,
                    len: elements.len(),
                });
            }
            elements.insert(index, element);
            Ok(())
        })
    }

    pub fn remove(&mut self, index: usize) -> Result<Element, ValidationError> {
        self.apply_edit(|elements| {
            if index >= elements.len() {
                return Err(ValidationError::IndexOutOfBounds {
                    index,
                    len: elements.len(),
                });
            }
            Ok(elements.remove(index))
        })
    }

    /// 把元素从 `from` 移到 `to`（移动后的位置）
    pub fn move_element(&mut self, from: usize, to: usize) -> Result<(), ValidationError> {
        self.apply_edit(|elements| {
            let len = elements.len();
            if from >= len {
                return Err(ValidationError::IndexOutOfBounds { index: from, len });
            }
            if to >= len {
                return Err(ValidationError::IndexOutOfBounds { index: to, len });
            }
            let element = elements.remove(from);
            elements.insert(to, element);
            Ok(())
        })
    }

    pub fn replace_text(&mut self, index: usize, text: StyledText) -> Result<(), ValidationError> {
        let len = self.elements.len();
        let element = self
            .elements
            .get_mut(index)
            .ok_or(ValidationError::IndexOutOfBounds { index, len })?;
        element.text = text;
        Ok(())
    }

    pub fn set_scene_number(&mut self, index: usize, number: Option<String>) -> Result<(), ValidationError> {
        let len = self.elements.len();
        let element = self
            .elements
            .get_mut(index)
            .ok_or(ValidationError::IndexOutOfBounds { index, len })?;
        element.set_scene_number(number)?;
        if element.scene_number().is_some() {
            self.scene_numbering_mode = SceneNumberingMode::Explicit;
        }
        Ok(())
    }

    fn apply_edit<T>(
        &mut self,
        edit: impl FnOnce(&mut Vec<Element>) -> Result<T, ValidationError>,
    ) -> Result<T, ValidationError> {
        let backup = self.elements.clone();
        let value = edit(&mut self.elements)?;
        if let Err(err) = self.validate_character_precedes_dialogue() {
            self.elements = backup;
            return Err(err);
        }
        Ok(value)
    }

    // =========================================================================
    // 校验
    // =========================================================================

    /// 每个对白/括号注释之前（只隔着对白/括号注释）必须有一个角色名
    pub fn validate_character_precedes_dialogue(&self) -> Result<(), ValidationError> {
        match self.first_orphan() {
            Some(index) => Err(ValidationError::OrphanDialogue {
                index,
                kind: self.elements[index].kind(),
            }),
            None => Ok(()),
        }
    }

    fn first_orphan(&self) -> Option<usize> {
        self.orphan_indices().into_iter().next()
    }

    fn orphan_indices(&self) -> Vec<usize> {
        let mut orphans = Vec::new();
        let mut speaker_open = false;
        for (index, element) in self.elements.iter().enumerate() {
            match element.kind() {
                ElementKind::Character => speaker_open = true,
                kind if kind.is_dialogue_part() => {
                    if !speaker_open {
                        orphans.push(index);
                    }
                }
                _ => speaker_open = false,
            }
        }
        orphans
    }

    /// 把孤立的对白/括号注释改成动作，返回被修复的下标
    pub(crate) fn heal_orphan_dialogue(&mut self) -> Vec<usize> {
        let orphans = self.orphan_indices();
        for &index in &orphans {
            let text = std::mem::take(&mut self.elements[index].text);
            self.elements[index] = Element::new(ElementKind::Action, text);
        }
        orphans
    }

    // =========================================================================
    // 查询
    // =========================================================================

    /// 对白/括号注释所属的角色名元素
    pub fn speaker_of(&self, index: usize) -> Option<&Element> {
        let element = self.elements.get(index)?;
        if !element.kind().is_dialogue_part() {
            return None;
        }
        self.elements[..index]
            .iter()
            .rev()
            .find(|el| !el.kind().is_dialogue_part())
            .filter(|el| el.kind() == ElementKind::Character)
    }

    /// 按首次出现顺序列出角色名（去掉扩展标记）
    pub fn character_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for element in &self.elements {
            if element.kind() != ElementKind::Character {
                continue;
            }
            let name = character_name(&element.plain_text());
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn scene_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|el| el.kind() == ElementKind::SceneHeading)
            .count()
    }

    /// 连续共享同一 `dual_group_id` 的元素区间
    pub fn dual_groups(&self) -> Vec<(u32, Range<usize>)> {
        let mut groups = Vec::new();
        let mut index = 0;
        while index < self.elements.len() {
            match self.elements[index].dual_group_id() {
                Some(id) => {
                    let start = index;
                    while index < self.elements.len() && self.elements[index].dual_group_id() == Some(id) {
                        index += 1;
                    }
                    groups.push((id, start..index));
                }
                None => index += 1,
            }
        }
        groups
    }

    pub fn next_dual_group_id(&self) -> u32 {
        self.elements
            .iter()
            .filter_map(Element::dual_group_id)
            .max()
            .map_or(1, |id| id + 1)
    }

    /// 按出现顺序把双对白分组重新编号为 1..n，返回是否有改动
    ///
    /// 被其他元素隔开的同号区间算作两组。
    pub fn renumber_dual_groups(&mut self) -> bool {
        let mut changed = false;
        let mut next = 0;
        let mut previous = None;
        for element in &mut self.elements {
            let id = element.dual_group_id();
            if id.is_some() && id != previous {
                next += 1;
            }
            previous = id;
            if let Some(id) = id {
                if id != next {
                    element.assign_dual_group(Some(next));
                    changed = true;
                }
            }
        }
        changed
    }

    // =========================================================================
    // 场景编号
    // =========================================================================

    /// 按顺序重新编号（1..n），编号方式变为自动
    pub fn renumber_scenes(&mut self) {
        let mut number = 1;
        for element in &mut self.elements {
            if element.kind() == ElementKind::SceneHeading {
                element.assign_scene_number(Some(number.to_string()));
                number += 1;
            }
        }
        self.scene_numbering_mode = SceneNumberingMode::Auto;
    }

    pub fn clear_scene_numbers(&mut self) {
        for element in &mut self.elements {
            element.assign_scene_number(None);
        }
        self.scene_numbering_mode = SceneNumberingMode::None;
    }

    fn heading_counts(&self) -> (usize, usize) {
        let mut headings = 0;
        let mut numbered = 0;
        for element in &self.elements {
            if element.kind() == ElementKind::SceneHeading {
                headings += 1;
                if element.scene_number().is_some() {
                    numbered += 1;
                }
            }
        }
        (headings, numbered)
    }

    /// 编号方式不是 None，但只有部分场景标题带编号
    pub fn scene_numbers_mixed(&self) -> bool {
        let (headings, numbered) = self.heading_counts();
        self.scene_numbering_mode != SceneNumberingMode::None && numbered > 0 && numbered < headings
    }

    /// 保证编号要么全部显式、要么全部自动，返回是否有改动
    pub fn normalize_scene_numbers(&mut self) -> bool {
        let (headings, numbered) = self.heading_counts();
        match self.scene_numbering_mode {
            _ if numbered > 0 && numbered < headings => {
                self.renumber_scenes();
                true
            }
            SceneNumberingMode::None if numbered > 0 => {
                self.scene_numbering_mode = SceneNumberingMode::Explicit;
                true
            }
            SceneNumberingMode::Explicit if numbered == 0 => {
                self.scene_numbering_mode = SceneNumberingMode::None;
                true
            }
            SceneNumberingMode::Auto if !self.auto_numbers_in_sequence() => {
                self.renumber_scenes();
                true
            }
            _ => false,
        }
    }

    fn auto_numbers_in_sequence(&self) -> bool {
        self.elements
            .iter()
            .filter(|el| el.kind() == ElementKind::SceneHeading)
            .enumerate()
            .all(|(i, el)| el.scene_number() == Some((i + 1).to_string().as_str()))
    }

    /// 导出时实际使用的编号（不修改文档），与元素一一对应
    pub fn effective_scene_numbers(&self) -> (SceneNumberingMode, Vec<Option<String>>) {
        let (headings, numbered) = self.heading_counts();
        let none = || vec![None; self.elements.len()];
        match self.scene_numbering_mode {
            SceneNumberingMode::None => (SceneNumberingMode::None, none()),
            SceneNumberingMode::Explicit if numbered == 0 => (SceneNumberingMode::None, none()),
            mode if numbered == headings => (
                mode,
                self.elements
                    .iter()
                    .map(|el| el.scene_number().map(str::to_string))
                    .collect(),
            ),
            _ => {
                let mut number = 0;
                let numbers = self
                    .elements
                    .iter()
                    .map(|el| {
                        if el.kind() == ElementKind::SceneHeading {
                            number += 1;
                            Some(number.to_string())
                        } else {
                            None
                        }
                    })
                    .collect();
                (SceneNumberingMode::Auto, numbers)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kitchen() -> Document {
        Document::from_elements(vec![
            Element::scene_heading("INT. KITCHEN - DAY", None),
            Element::new(ElementKind::Character, "JOHN"),
            Element::new(ElementKind::Dialogue, "Hello there."),
            Element::new(ElementKind::Parenthetical, "(smiling)"),
            Element::new(ElementKind::Dialogue, "How are you?"),
        ])
    }

    #[test]
    fn kitchen_is_valid_and_speaker_is_john() {
        let doc = kitchen();
        assert!(doc.validate_character_precedes_dialogue().is_ok());
        assert_eq!(doc.speaker_of(4).map(Element::plain_text), Some("JOHN".to_string()));
        assert_eq!(doc.speaker_of(0), None);
    }

    #[test]
    fn removing_character_is_rejected_and_rolled_back() {
        let mut doc = kitchen();
        let before = doc.clone();
        let err = doc.remove(1).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OrphanDialogue {
                index: 1,
                kind: ElementKind::Dialogue
            }
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn inserting_action_inside_dialogue_block_is_rejected() {
        let mut doc = kitchen();
        let result = doc.insert(2, Element::new(ElementKind::Action, "A door slams."));
        assert!(result.is_err());
        assert_eq!(doc.len(), 5);
        assert!(doc.insert(5, Element::new(ElementKind::Action, "A door slams.")).is_ok());
    }

    #[test]
    fn move_and_out_of_bounds() {
        let mut doc = kitchen();
        assert_eq!(
            doc.move_element(9, 0),
            Err(ValidationError::IndexOutOfBounds { index: 9, len: 5 })
        );
        assert!(doc.move_element(1, 4).is_err());
        doc.push(Element::new(ElementKind::Transition, "CUT TO:")).unwrap();
        assert!(doc.move_element(5, 0).is_ok());
        assert_eq!(doc.elements()[0].kind(), ElementKind::Transition);
    }

    #[test]
    fn mixed_numbers_normalize_to_auto() {
        let mut doc = Document::from_elements(vec![
            Element::scene_heading("INT. A - DAY", Some("7".to_string())),
            Element::scene_heading("INT. B - DAY", None),
        ]);
        doc.scene_numbering_mode = SceneNumberingMode::Explicit;
        assert!(doc.scene_numbers_mixed());
        assert!(doc.normalize_scene_numbers());
        assert_eq!(doc.scene_numbering_mode, SceneNumberingMode::Auto);
        assert_eq!(doc.elements()[0].scene_number(), Some("1"));
        assert_eq!(doc.elements()[1].scene_number(), Some("2"));
        assert!(!doc.normalize_scene_numbers());
    }

    #[test]
    fn effective_numbers_do_not_mutate() {
        let mut doc = kitchen();
        doc.scene_numbering_mode = SceneNumberingMode::Auto;
        let (mode, numbers) = doc.effective_scene_numbers();
        assert_eq!(mode, SceneNumberingMode::Auto);
        assert_eq!(numbers[0].as_deref(), Some("1"));
        assert_eq!(doc.elements()[0].scene_number(), None);
    }

    #[test]
    fn dual_groups_are_contiguous_spans() {
        let doc = Document::from_elements(vec![
            Element::new(ElementKind::Character, "A").with_dual_group(1).unwrap(),
            Element::new(ElementKind::Dialogue, "x").with_dual_group(1).unwrap(),
            Element::new(ElementKind::Character, "B").with_dual_group(1).unwrap(),
            Element::new(ElementKind::Dialogue, "y").with_dual_group(1).unwrap(),
            Element::new(ElementKind::Action, "z"),
        ]);
        assert_eq!(doc.dual_groups(), vec![(1, 0..4)]);
        assert_eq!(doc.next_dual_group_id(), 2);
        assert_eq!(doc.character_names(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn dual_groups_renumber_in_order() {
        let mut doc = Document::from_elements(vec![
            Element::new(ElementKind::Character, "A").with_dual_group(4).unwrap(),
            Element::new(ElementKind::Dialogue, "x").with_dual_group(4).unwrap(),
            Element::new(ElementKind::Action, "z"),
            Element::new(ElementKind::Character, "B").with_dual_group(4).unwrap(),
            Element::new(ElementKind::Dialogue, "y").with_dual_group(4).unwrap(),
        ]);
        assert!(doc.renumber_dual_groups());
        let groups: Vec<Option<u32>> = doc.iter().map(Element::dual_group_id).collect();
        assert_eq!(groups, vec![Some(1), Some(1), None, Some(2), Some(2)]);
        assert!(!doc.renumber_dual_groups());
    }
}
