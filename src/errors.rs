//! 错误类型
//!
//! 所有失败都以类型化的结果返回，库内不会因为输入内容而 panic。

use thiserror::Error;

use crate::models::ElementKind;

/// 解析错误：调用方报告后停止，不会返回部分文档
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("无法解码输入(需要UTF-8): {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("XML格式错误: {0}")]
    Xml(#[from] xmltree::ParseError),

    #[error("缺少必需的元素: {0}")]
    MissingElement(String),

    #[error("文档中没有任何剧本元素")]
    NoElements,

    #[error("无效的快照: {0}")]
    InvalidSnapshot(String),

    #[error("JSON解析错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 编辑操作破坏了文档不变量
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("第{index}个元素({kind})之前没有统领它的角色名")]
    OrphanDialogue { index: usize, kind: ElementKind },

    #[error("索引越界: {index} (元素数量 {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("只有场景标题可以带场景编号，当前元素为 {0}")]
    SceneNumberOnNonHeading(ElementKind),

    #[error("只有角色名/对白/括号注释可以参与双对白，当前元素为 {0}")]
    DualGroupOnNonDialogue(ElementKind),
}

/// 导出错误
///
/// 目标格式无法表示的特性不会报错，而是降级并以诊断信息返回。
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("XML生成错误: {0}")]
    Xml(#[from] xmltree::Error),

    #[error("JSON生成错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 门面层的统一错误
#[derive(Error, Debug)]
pub enum ScreenplayError {
    #[error("解析失败: {0}")]
    Parse(#[from] ParseError),

    #[error("校验失败: {0}")]
    Validation(#[from] ValidationError),

    #[error("导出失败: {0}")]
    Serialization(#[from] SerializationError),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("找不到文档: {0}")]
    UnknownDocument(String),

    #[error("不支持的格式: {0}")]
    UnknownFormat(String),
}

pub type ScreenplayResult<T> = Result<T, ScreenplayError>;
