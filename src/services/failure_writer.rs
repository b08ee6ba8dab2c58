//! 资源下载失败记录 - 业务能力层
//!
//! 只负责"写 audio-error.txt"能力，不关心流程

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// 失败记录文件名
pub const FAILURE_FILE_NAME: &str = "audio-error.txt";

/// 资源下载失败记录
///
/// 职责：
/// - 每次失败追加一行 `关键词\t地址\t原因`
/// - 只处理单条记录
/// - 不关心流程顺序
#[derive(Debug, Clone)]
pub struct AssetFailureWriter {
    path: PathBuf,
}

impl AssetFailureWriter {
    /// 在词典目录下创建
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::with_path(dir.as_ref().join(FAILURE_FILE_NAME))
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入一条失败记录
    ///
    /// # 参数
    /// - `keyword`: 提交的关键词
    /// - `url`: 资源地址
    /// - `reason`: 失败原因
    pub async fn write(&self, keyword: &str, url: &str, reason: &str) -> Result<()> {
        debug!("写入资源失败记录: '{}' | {}", keyword, url);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("无法打开 {}", self.path.display()))?;

        let line = format!("{}\t{}\t{}\n", keyword, url, reason.replace('\n', " "));
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
