use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

/// 纯文本排版参数（列宽、缩进均以字符计）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutProfile {
    /// 角色名缩进
    pub character_indent: usize,
    /// 括号注释缩进
    pub parenthetical_indent: usize,
    /// 对白缩进
    pub dialogue_indent: usize,
    /// 转场右对齐的列
    pub transition_column: usize,
    /// 动作/场景标题行宽
    pub action_width: usize,
    /// 对白行宽
    pub dialogue_width: usize,
    /// 括号注释行宽
    pub parenthetical_width: usize,
    /// 分页标记
    pub page_break_marker: String,
}

impl Default for LayoutProfile {
    fn default() -> Self {
        LayoutProfile {
            character_indent: 21,
            parenthetical_indent: 15,
            dialogue_indent: 10,
            transition_column: 55,
            action_width: 60,
            dialogue_width: 35,
            parenthetical_width: 25,
            page_break_marker: "\u{000C}".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conf {
    /// 纯文本解析时识别 **粗体** *斜体* _下划线_ ~~删除线~~
    pub markdown: bool,
    /// 识别 Fountain 强制标记（. @ ! > ^）
    pub allow_fountain: bool,
    /// 合并同一缩进下被折行的文本
    pub join_wrapped_lines: bool,
    /// 删除单独成行的页码
    pub strip_page_numbers: bool,
    /// 识别开头的标题页（Title: ... 形式）
    pub parse_title_page: bool,
    /// FDX 输出是否缩进
    pub fdx_indent: bool,
    /// 快照是否输出为带缩进的 JSON
    pub pretty_snapshot: bool,
    /// 排版参数
    pub layout: LayoutProfile,
}

impl Default for Conf {
    fn default() -> Self {
        Conf {
            markdown: true,
            allow_fountain: true,
            join_wrapped_lines: true,
            strip_page_numbers: true,
            parse_title_page: true,
            fdx_indent: true,
            pretty_snapshot: true,
            layout: LayoutProfile::default(),
        }
    }
}

impl Conf {
    pub fn from_json_str(json: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(json)?)
    }

    /// 从 JSON 配置文件读取，缺省字段使用默认值
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
