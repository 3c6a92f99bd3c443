use std::path::Path;

use log::info;

use crate::errors::{ParseError, ScreenplayResult, SerializationError};
use crate::export::{render, RenderOutput};
use crate::models::{Conf, Diagnostic, Document, SourceKind, TargetKind};
use crate::parse;
use crate::snapshot;

/// 一个剧本文档及其解析诊断
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Screenplay {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
    pub conf: Conf,
}

impl Screenplay {
    pub fn new(document: Document) -> Self {
        Screenplay {
            document,
            ..Self::default()
        }
    }

    pub fn with_conf(mut self, conf: Conf) -> Self {
        self.conf = conf;
        self
    }

    pub fn from_bytes(bytes: &[u8], kind: SourceKind, conf: Conf) -> Result<Self, ParseError> {
        let output = parse(bytes, kind, &conf)?;
        Ok(Screenplay {
            document: output.document,
            diagnostics: output.diagnostics,
            conf,
        })
    }

    /// 读取文件，`kind` 为 None 时按扩展名判断
    pub fn load(path: impl AsRef<Path>, kind: Option<SourceKind>, conf: Conf) -> ScreenplayResult<Self> {
        let path = path.as_ref();
        let kind = kind.unwrap_or_else(|| SourceKind::from_path(path));
        let bytes = std::fs::read(path)?;
        let screenplay = Self::from_bytes(&bytes, kind, conf)?;
        info!("已读取 {} ({:?})", path.display(), kind);
        Ok(screenplay)
    }

    pub fn render(&self, target: TargetKind) -> Result<RenderOutput, SerializationError> {
        render(&self.document, target, &self.conf)
    }

    /// 导出到文件，返回导出时的降级诊断
    pub fn save(&self, path: impl AsRef<Path>, target: TargetKind) -> ScreenplayResult<Vec<Diagnostic>> {
        let output = self.render(target)?;
        std::fs::write(path.as_ref(), &output.bytes)?;
        info!("已导出 {} ({})", path.as_ref().display(), target);
        Ok(output.diagnostics)
    }

    pub fn from_snapshot(bytes: &[u8]) -> Result<Self, ParseError> {
        Ok(Self::new(snapshot::deserialize(bytes)?))
    }

    pub fn to_snapshot(&self) -> Result<Vec<u8>, SerializationError> {
        snapshot::serialize(&self.document, self.conf.pretty_snapshot)
    }
}
