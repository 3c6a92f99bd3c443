use log::info;

use crate::export::RenderOutput;
use crate::models::diagnostic::report;
use crate::models::{
    Conf, Diagnostic, DiagnosticKind, Document, ElementKind, SceneNumberingMode, TITLE_PAGE_KEYS,
};
use crate::text::liner::Liner;
use crate::utils::title_key_label;

/// 标题页写成 `Key: value`，多行的值后续行缩进
fn title_page_lines(document: &Document) -> Vec<String> {
    let known = TITLE_PAGE_KEYS
        .iter()
        .filter_map(|key| document.title_page.get_key_value(*key));
    let others = document
        .title_page
        .iter()
        .filter(|(key, _)| !TITLE_PAGE_KEYS.contains(&key.as_str()));

    let mut lines = Vec::new();
    for (key, value) in known.chain(others) {
        let mut values = value.split('\n');
        lines.push(format!("{}: {}", title_key_label(key), values.next().unwrap_or_default()).trim_end().to_string());
        for continuation in values {
            lines.push(format!("    {}", continuation.trim()));
        }
    }
    lines
}

/// 元素在纯文本中的内容（不含缩进）
fn element_text(document: &Document, index: usize, number: Option<&str>, conf: &Conf, spacing: bool) -> String {
    let element = &document.elements()[index];
    let text = element.plain_text();
    let text = match element.kind() {
        ElementKind::PageBreak if spacing => conf.layout.page_break_marker.clone(),
        ElementKind::PageBreak => "===".to_string(),
        ElementKind::Note => format!("[[{}]]", text),
        ElementKind::SceneHeading => match number {
            Some(number) => format!("{} ({})", text, number),
            None => text,
        },
        _ => text,
    };
    if spacing {
        text
    } else {
        text.split('\n').map(str::trim_start).collect::<Vec<_>>().join("\n")
    }
}

/// 导出纯文本
///
/// `spacing` 为 true 时按 `conf.layout` 排版，否则只输出内容、元素之间空一行。
/// 样式一律丢弃，双对白按顺序展开并给出诊断。
pub fn make_text(document: &Document, conf: &Conf, spacing: bool) -> RenderOutput {
    let mut diagnostics = Vec::new();
    let (mode, numbers) = document.effective_scene_numbers();

    for (group, range) in document.dual_groups() {
        report(
            &mut diagnostics,
            Diagnostic::new(
                DiagnosticKind::Degraded,
                format!("纯文本无法并排显示双对白(组 {})，已按顺序输出", group),
            )
            .at(range.start),
        );
    }

    let texts: Vec<String> = (0..document.len())
        .map(|index| {
            let number = match mode {
                SceneNumberingMode::None => None,
                _ => numbers[index].as_deref(),
            };
            element_text(document, index, number, conf, spacing)
        })
        .collect();

    let liner = Liner::new(&conf.layout, spacing);
    let body = liner.lines(
        document
            .iter()
            .zip(texts.iter())
            .map(|(element, text)| (element.kind(), text.as_str())),
    );

    let mut output: Vec<String> = title_page_lines(document);
    if !output.is_empty() && !body.is_empty() {
        output.push(String::new());
    }
    output.extend(body.into_iter().map(|line| line.text));

    let mut text = output.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }

    info!(
        "纯文本导出完成: {} 个元素, {} 行 (排版: {})",
        document.len(),
        output.len(),
        spacing
    );
    RenderOutput::new(text.into_bytes(), diagnostics)
}
