use log::debug;

use crate::errors::SerializationError;
use crate::fdx::make_fdx;
use crate::models::{Conf, Diagnostic, Document, TargetKind};
use crate::snapshot::make_snapshot;
use crate::text::make_text;

/// 导出结果：字节 + 降级诊断
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderOutput {
    pub fn new(bytes: Vec<u8>, diagnostics: Vec<Diagnostic>) -> Self {
        RenderOutput { bytes, diagnostics }
    }

    /// 所有导出格式都是 UTF-8 文本
    pub fn as_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// 按目标格式导出文档
pub fn render(document: &Document, target: TargetKind, conf: &Conf) -> Result<RenderOutput, SerializationError> {
    debug!("导出 {} 个元素为 {}", document.len(), target);
    match target {
        TargetKind::ExchangeFormat => make_fdx(document, conf),
        TargetKind::PlainText => Ok(make_text(document, conf, false)),
        TargetKind::PlainTextLayout => Ok(make_text(document, conf, true)),
        TargetKind::Snapshot => make_snapshot(document, conf),
    }
}
