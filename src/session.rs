//! 内存中的文档仓库
//!
//! 每个文档用 `DocumentId` 显式引用，调用方不需要依赖磁盘上的“当前文件”。
//! 修改需要 `&mut self`，同一文档同一时间只有一个修改者。

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ParseError, ScreenplayError, ScreenplayResult, ValidationError};
use crate::export::{render, RenderOutput};
use crate::models::{Conf, Diagnostic, Document, SourceKind, TargetKind};
use crate::parse;
use crate::snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        DocumentId(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = ScreenplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(DocumentId)
            .map_err(|_| ScreenplayError::UnknownDocument(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub document: Document,
    /// 最近一次解析产生的诊断
    pub diagnostics: Vec<Diagnostic>,
    pub source: Option<SourceKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 列表中的文档摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentInfo {
    pub id: DocumentId,
    pub title: Option<String>,
    pub elements: usize,
    pub scenes: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<DocumentId, StoredDocument>,
    conf: Conf,
}

impl DocumentStore {
    pub fn new(conf: Conf) -> Self {
        DocumentStore {
            documents: HashMap::new(),
            conf,
        }
    }

    pub fn conf(&self) -> &Conf {
        &self.conf
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn store(&mut self, document: Document, diagnostics: Vec<Diagnostic>, source: Option<SourceKind>) -> DocumentId {
        let id = DocumentId::new();
        let now = Utc::now();
        self.documents.insert(
            id,
            StoredDocument {
                document,
                diagnostics,
                source,
                created_at: now,
                updated_at: now,
            },
        );
        debug!("新文档 {}", id);
        id
    }

    pub fn insert(&mut self, document: Document) -> DocumentId {
        self.store(document, Vec::new(), None)
    }

    /// 解析并保存，返回新文档的 id 和解析诊断
    pub fn load(&mut self, bytes: &[u8], kind: SourceKind) -> Result<(DocumentId, Vec<Diagnostic>), ParseError> {
        let output = parse(bytes, kind, &self.conf)?;
        let diagnostics = output.diagnostics.clone();
        let id = self.store(output.document, output.diagnostics, Some(kind));
        info!("已载入文档 {} ({:?}, {} 条诊断)", id, kind, diagnostics.len());
        Ok((id, diagnostics))
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id).map(|stored| &stored.document)
    }

    pub fn stored(&self, id: DocumentId) -> Option<&StoredDocument> {
        self.documents.get(&id)
    }

    /// 可变引用，更新修改时间
    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.get_mut(&id).map(|stored| {
            stored.updated_at = Utc::now();
            &mut stored.document
        })
    }

    /// 对文档执行一次编辑操作
    pub fn edit<T>(
        &mut self,
        id: DocumentId,
        edit: impl FnOnce(&mut Document) -> Result<T, ValidationError>,
    ) -> ScreenplayResult<T> {
        let document = self
            .get_mut(id)
            .ok_or_else(|| ScreenplayError::UnknownDocument(id.to_string()))?;
        Ok(edit(document)?)
    }

    pub fn export(&self, id: DocumentId, target: TargetKind) -> ScreenplayResult<RenderOutput> {
        let document = self
            .get(id)
            .ok_or_else(|| ScreenplayError::UnknownDocument(id.to_string()))?;
        Ok(render(document, target, &self.conf)?)
    }

    pub fn snapshot(&self, id: DocumentId) -> ScreenplayResult<Vec<u8>> {
        let document = self
            .get(id)
            .ok_or_else(|| ScreenplayError::UnknownDocument(id.to_string()))?;
        Ok(snapshot::serialize(document, self.conf.pretty_snapshot)?)
    }

    /// 从快照恢复为一个新文档
    pub fn restore(&mut self, bytes: &[u8]) -> Result<DocumentId, ParseError> {
        let document = snapshot::deserialize(bytes)?;
        Ok(self.store(document, Vec::new(), Some(SourceKind::Snapshot)))
    }

    pub fn remove(&mut self, id: DocumentId) -> Option<Document> {
        self.documents.remove(&id).map(|stored| stored.document)
    }

    /// 按创建时间排列的摘要
    pub fn list(&self) -> Vec<DocumentInfo> {
        let mut infos: Vec<DocumentInfo> = self
            .documents
            .iter()
            .map(|(id, stored)| DocumentInfo {
                id: *id,
                title: stored.document.title().map(str::to_string),
                elements: stored.document.len(),
                scenes: stored.document.scene_count(),
                created_at: stored.created_at,
                updated_at: stored.updated_at,
            })
            .collect();
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        infos
    }
}
