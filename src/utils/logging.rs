//! 日志工具模块
//!
//! 提供日志初始化、运行日志文件与格式化输出的辅助函数

use std::fs::{self, OpenOptions};
use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::Dictionary;

/// 初始化 tracing 输出
///
/// `RUST_LOG` 优先；未设置时默认 `info`，详细模式为 `debug`。
/// 重复调用（例如测试中）不会报错。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .try_init();
}

/// 初始化运行日志文件（覆盖旧内容，写入带时间的标题）
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n单词查询日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法创建运行日志: {}", log_file_path))?;
    Ok(())
}

/// 向运行日志追加一行
pub fn append_log_line(log_file_path: &str, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开运行日志: {}", log_file_path))?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `dicts`: 按优先级排好序的词典
/// - `data_dir`: 数据根目录
/// - `query_online`: 是否在线查询
/// - `download_assets`: 是否下载资源
pub fn log_startup(dicts: &[Dictionary], data_dir: &str, query_online: bool, download_assets: bool) {
    let names: Vec<&str> = dicts.iter().map(|d| d.name()).collect();
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 单词查询与下载");
    info!("📚 词典（按优先级）: {}", names.join(" > "));
    info!("📁 数据目录: {}", data_dir);
    info!(
        "🌐 在线查询: {} | 🎵 下载资源: {}",
        on_off(query_online),
        on_off(download_assets)
    );
    info!("{}", "=".repeat(60));
}

/// 记录词典日志加载情况
pub fn log_dictionary_loaded(dict: Dictionary, records: usize, keys: usize) {
    info!("✓ {} 日志已加载: {} 条记录, {} 个键", dict.name(), records, keys);
}

/// 记录处理进度
pub fn log_progress(finished: usize) {
    info!("📈 已完成: {}", finished);
}

/// 打印最终统计信息
///
/// # 参数
/// - `lines`: 统计行
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(lines: &[String], log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    for line in lines {
        info!("{}", line);
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "开"
    } else {
        "关"
    }
}
