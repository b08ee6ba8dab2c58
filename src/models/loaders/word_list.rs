use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{self, AsyncBufReadExt, AsyncRead, BufReader, Lines};

/// 单词流
///
/// 逐行读取关键词，去除首尾空白并跳过空行
pub struct WordStream {
    lines: Lines<BufReader<Box<dyn AsyncRead + Unpin + Send>>>,
}

impl WordStream {
    /// 从任意异步读取源创建
    pub fn from_reader(reader: impl AsyncRead + Unpin + Send + 'static) -> Self {
        let boxed: Box<dyn AsyncRead + Unpin + Send> = Box::new(reader);
        Self {
            lines: BufReader::new(boxed).lines(),
        }
    }

    /// 打开单词列表文件
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .await
            .with_context(|| format!("无法打开单词列表文件: {}", path.display()))?;
        Ok(Self::from_reader(file))
    }

    /// 从标准输入读取
    pub fn stdin() -> Self {
        Self::from_reader(io::stdin())
    }

    /// 根据配置选择文件或标准输入
    pub async fn from_config(word_list: Option<&str>) -> Result<Self> {
        match word_list {
            Some(path) if !path.is_empty() => Self::open(Path::new(path)).await,
            _ => Ok(Self::stdin()),
        }
    }

    /// 读取下一个关键词；读到结尾返回 None
    pub async fn next_word(&mut self) -> Result<Option<String>> {
        while let Some(line) = self
            .lines
            .next_line()
            .await
            .context("读取单词失败")?
        {
            let word = line.trim();
            if !word.is_empty() {
                return Ok(Some(word.to_string()));
            }
        }
        Ok(None)
    }
}
