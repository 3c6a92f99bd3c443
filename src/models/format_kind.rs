use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// 输入格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Final Draft (.fdx)
    ExchangeFormat,
    PlainText,
    /// JSON 快照
    Snapshot,
}

impl SourceKind {
    /// 按扩展名判断，无法识别时当作纯文本
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("fdx") => SourceKind::ExchangeFormat,
            Some("json") => SourceKind::Snapshot,
            _ => SourceKind::PlainText,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fdx" => Some(SourceKind::ExchangeFormat),
            "txt" | "text" | "fountain" => Some(SourceKind::PlainText),
            "json" => Some(SourceKind::Snapshot),
            _ => None,
        }
    }
}

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    ExchangeFormat,
    /// 不排版的纯文本
    PlainText,
    /// 按 LayoutProfile 排版的纯文本
    PlainTextLayout,
    Snapshot,
}

impl TargetKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fdx" => Some(TargetKind::ExchangeFormat),
            "txt" | "text" => Some(TargetKind::PlainText),
            "txt-layout" | "layout" => Some(TargetKind::PlainTextLayout),
            "json" => Some(TargetKind::Snapshot),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TargetKind::ExchangeFormat => "fdx",
            TargetKind::PlainText => "txt",
            TargetKind::PlainTextLayout => "txt-layout",
            TargetKind::Snapshot => "json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TargetKind::ExchangeFormat => "fdx",
            TargetKind::PlainText | TargetKind::PlainTextLayout => "txt",
            TargetKind::Snapshot => "json",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
