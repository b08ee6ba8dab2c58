//! 合并结果导出 - 业务能力层
//!
//! 每个单词一行 JSON，追加写入

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 导出写入服务
pub struct ExportWriter {
    path: PathBuf,
    file: File,
}

impl ExportWriter {
    /// 打开（或创建）导出文件，追加模式
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::create_dir_failed(parent.display().to_string(), e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一条记录
    pub async fn write<T: Serialize>(&mut self, record: &T) -> AppResult<()> {
        let mut line = serde_json::to_string(record).map_err(|e| AppError::Other(e.to_string()))?;
        line.push('\n');
        debug!("导出记录 {} 字节 -> {}", line.len(), self.path.display());

        self.file
            .write_all(line.as_bytes())
            .await
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))?;
        self.file
            .flush()
            .await
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_records_are_appended_as_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("export.jsonl");

        let mut writer = ExportWriter::open(&path).await.unwrap();
        writer.write(&json!({"keyword": "kestrel"})).await.unwrap();
        drop(writer);

        let mut writer = ExportWriter::open(&path).await.unwrap();
        writer.write(&json!({"keyword": "owl"})).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"keyword\":\"kestrel\"}\n{\"keyword\":\"owl\"}\n");
    }
}
