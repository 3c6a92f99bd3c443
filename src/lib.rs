pub mod errors;
pub mod models;
pub mod utils;
pub mod parser;
pub mod fdx;
pub mod text;
pub mod snapshot;
pub mod export;
pub mod screenplay;
pub mod session;
pub mod api;

pub use errors::{
    ParseError,
    ValidationError,
    SerializationError,
    ScreenplayError,
    ScreenplayResult
};

pub use models::{
    StyledText,
    TextRun,
    TextStyle,
    Element,
    ElementKind,
    Document,
    SceneNumberingMode,
    Diagnostic,
    DiagnosticKind,
    SourceKind,
    TargetKind,
    Conf,
    LayoutProfile
};

pub use parser::{
    ParseOutput,
    PlainTextParser,
    parse_plain_text
};

pub use fdx::{
    FdxReader,
    parse_fdx,
    make_fdx
};

pub use text::make_text;
pub use export::{RenderOutput, render};
pub use screenplay::Screenplay;
pub use session::{DocumentId, DocumentInfo, DocumentStore};

pub use api::{
    ExportResult,
    parse_script_text,
    load_file,
    export_file,
    export_to_base64,
    convert_file
};

/// 解析剧本
///
/// # Arguments
///
/// * `bytes` - 输入内容，必须是 UTF-8
/// * `kind` - 输入格式
/// * `conf` - 配置对象
///
/// # Returns
///
/// 文档和解析诊断；输入无法解析时返回错误
pub fn parse(bytes: &[u8], kind: SourceKind, conf: &Conf) -> Result<ParseOutput, ParseError> {
    match kind {
        SourceKind::Snapshot => snapshot::parse_snapshot(bytes),
        SourceKind::ExchangeFormat => parse_fdx(parser::decode_text(bytes)?),
        SourceKind::PlainText => Ok(parse_plain_text(parser::decode_text(bytes)?, conf)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() {
        let config = Conf::default();
        let result = parse(b"INT. ROOM - DAY\n\nHello, world!", SourceKind::PlainText, &config).unwrap();
        assert_eq!(result.document.len(), 2);
        assert_eq!(result.document.elements()[0].kind(), ElementKind::SceneHeading);

        let fdx = render(&result.document, TargetKind::ExchangeFormat, &config).unwrap();
        let back = parse(&fdx.bytes, SourceKind::ExchangeFormat, &config).unwrap();
        assert_eq!(back.document, result.document);
    }
}
