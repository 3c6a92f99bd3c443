pub mod markup;
pub mod plain_parser;

use serde::Serialize;

use crate::errors::ParseError;
use crate::models::{Diagnostic, Document};

pub use markup::{parse_markup, strip_markup};
pub use plain_parser::{classify_line, parse_plain_text, Classified, LineContext, LineRule, PlainTextParser, RULES};

/// 解析结果：文档 + 非致命诊断
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseOutput {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn new(document: Document, diagnostics: Vec<Diagnostic>) -> Self {
        ParseOutput { document, diagnostics }
    }
}

/// 按 UTF-8 解码输入，去掉开头的 BOM
pub fn decode_text(bytes: &[u8]) -> Result<&str, ParseError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    Ok(std::str::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        assert!(matches!(decode_text(&[0x66, 0xff, 0xfe]), Err(ParseError::Encoding(_))));
        assert_eq!(decode_text(b"\xEF\xBB\xBFabc").unwrap(), "abc");
    }
}
