use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

/// 非致命诊断的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// 未知标签，内容已按动作保留
    UnknownTag,
    /// 被跳过的内容
    Skipped,
    /// 解析器自动修复了结构（例如孤立的对白）
    SelfHealed,
    /// 规范化（例如混合的场景编号改为自动编号）
    Normalized,
    /// 目标格式无法表示的特性被降级
    Degraded,
}

/// 解析或导出过程中产生的诊断信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_index: Option<usize>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            element_index: None,
        }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.element_index = Some(index);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.element_index {
            Some(index) => write!(f, "[{:?}] 元素#{}: {}", self.kind, index, self.message),
            None => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

/// 记录诊断并写入日志
pub(crate) fn report(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    warn!("{}", diagnostic);
    diagnostics.push(diagnostic);
}
