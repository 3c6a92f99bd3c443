//! 异步接口
//!
//! 供外部应用调用，结果统一包装成 `ExportResult`，不向调用方抛错误。

use std::path::Path;

use log::{error, info};

use crate::errors::ScreenplayResult;
use crate::export::render;
use crate::models::{Conf, Diagnostic, Document, SourceKind, TargetKind};
use crate::parse;
use crate::parser::ParseOutput;

/// 导出结果
#[derive(Debug, Clone, Default)]
pub struct ExportResult {
    pub success: bool,
    pub message: String,
    pub file_path: Option<String>,
    /// Base64 编码的导出内容，仅 `export_to_base64` 填写
    pub data: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ExportResult {
    fn failed(message: String) -> Self {
        error!("{}", message);
        ExportResult {
            success: false,
            message,
            ..Self::default()
        }
    }
}

/// 解析文本，返回 JSON 格式的解析结果
pub async fn parse_script_text(text: String, kind: SourceKind, config: Option<Conf>) -> String {
    let conf = config.unwrap_or_default();
    match parse(text.as_bytes(), kind, &conf) {
        Ok(output) => serde_json::to_string(&output).unwrap_or_else(|_| "{}".to_string()),
        Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
    }
}

/// 读取并解析文件，`kind` 为 None 时按扩展名判断
pub async fn load_file(path: impl AsRef<Path>, kind: Option<SourceKind>, config: Option<Conf>) -> ScreenplayResult<ParseOutput> {
    let path = path.as_ref();
    let kind = kind.unwrap_or_else(|| SourceKind::from_path(path));
    let bytes = tokio::fs::read(path).await?;
    let output = parse(&bytes, kind, &config.unwrap_or_default())?;
    info!("已读取 {}: {} 个元素", path.display(), output.document.len());
    Ok(output)
}

/// 导出到文件
pub async fn export_file(document: &Document, output_path: String, target: TargetKind, config: Option<Conf>) -> ExportResult {
    let conf = config.unwrap_or_default();
    let output = match render(document, target, &conf) {
        Ok(output) => output,
        Err(e) => return ExportResult::failed(format!("导出失败: {}", e)),
    };

    match tokio::fs::write(&output_path, &output.bytes).await {
        Ok(_) => {
            info!("已导出 {}", output_path);
            ExportResult {
                success: true,
                message: format!("{} 导出成功", target.name()),
                file_path: Some(output_path),
                data: None,
                diagnostics: output.diagnostics,
            }
        }
        Err(e) => ExportResult::failed(format!("写入失败: {}", e)),
    }
}

/// 获取导出内容的 Base64 编码
pub async fn export_to_base64(document: &Document, target: TargetKind, config: Option<Conf>) -> ExportResult {
    let conf = config.unwrap_or_default();
    match render(document, target, &conf) {
        Ok(output) => ExportResult {
            success: true,
            message: format!("{} Base64编码生成成功", target.name()),
            file_path: None,
            data: Some(base64::encode(&output.bytes)),
            diagnostics: output.diagnostics,
        },
        Err(e) => ExportResult::failed(format!("生成失败: {}", e)),
    }
}

/// 读取文件并转换为另一种格式
pub async fn convert_file(
    input_path: impl AsRef<Path>,
    output_path: String,
    from: Option<SourceKind>,
    to: TargetKind,
    config: Option<Conf>,
) -> ExportResult {
    let conf = config.unwrap_or_default();
    let parsed = match load_file(input_path, from, Some(conf.clone())).await {
        Ok(parsed) => parsed,
        Err(e) => return ExportResult::failed(format!("读取失败: {}", e)),
    };
    let mut result = export_file(&parsed.document, output_path, to, Some(conf)).await;
    let mut diagnostics = parsed.diagnostics;
    diagnostics.append(&mut result.diagnostics);
    result.diagnostics = diagnostics;
    result
}
