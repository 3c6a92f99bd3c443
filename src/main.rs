use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::debug;
use screenwriting_rust::{convert_file, Conf, SourceKind, TargetKind};

/// 剧本格式转换：fdx / txt / json
#[derive(Parser, Debug)]
#[command(name = "screenplay-convert", version, about)]
struct Cli {
    /// 输入文件
    input: PathBuf,

    /// 输出格式：fdx, txt, txt-layout, json
    #[arg(short, long)]
    to: String,

    /// 输出文件，默认与输入同名、换扩展名
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 输入格式，默认按扩展名判断
    #[arg(long)]
    from: Option<String>,

    /// JSON 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 不解析纯文本中的 *粗体* 等标记
    #[arg(long)]
    no_markdown: bool,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level.as_str()))
        .init();

    let target = TargetKind::from_name(&cli.to).ok_or_else(|| anyhow!("未知的输出格式: {}", cli.to))?;
    let source = match &cli.from {
        Some(name) => Some(SourceKind::from_name(name).ok_or_else(|| anyhow!("未知的输入格式: {}", name))?),
        None => None,
    };

    let mut conf = match &cli.config {
        Some(path) => Conf::from_json_file(path).with_context(|| format!("读取配置失败: {}", path.display()))?,
        None => Conf::default(),
    };
    if cli.no_markdown {
        conf.markdown = false;
    }
    debug!("配置: {:?}", conf);

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension(target.extension()));
    if output == cli.input {
        return Err(anyhow!("输出文件与输入文件相同: {}", output.display()));
    }

    let result = convert_file(&cli.input, output.display().to_string(), source, target, Some(conf)).await;
    if !result.success {
        return Err(anyhow!(result.message));
    }

    println!("转换完成！");
    println!("输出格式: {}", target);
    if let Some(path) = &result.file_path {
        println!("输出已保存到: {}", path);
    }
    println!("诊断数量: {}", result.diagnostics.len());
    for diagnostic in &result.diagnostics {
        println!("  {}", diagnostic);
    }

    Ok(())
}
