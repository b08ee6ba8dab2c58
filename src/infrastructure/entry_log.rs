//! 查询结果日志 - 基础设施层
//!
//! 每个词典一个只追加的 `words.txt`，每行一条记录：
//! - 词条行：`Entry` 的单行 JSON
//! - 墓碑行：`__not_found:<关键词>`，表示"查过，确认不存在"
//!
//! 启动时按文件顺序重放全部记录重建内存索引，同一个键后写覆盖先写。
//! 日志是唯一的事实来源，索引只是派生缓存；本模块从不截断或压缩日志。
//!
//! 写入中途被打断时，最后一行没有换行符：能解析就照常使用，
//! 不能解析就报告 `TornTail`，删掉这一行即可恢复。

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::Entry;

/// 墓碑行前缀
pub const TOMBSTONE_PREFIX: &str = "__not_found:";

/// 日志操作错误
#[derive(Debug, thiserror::Error)]
pub enum EntryLogError {
    /// 无法打开或创建日志文件
    #[error("无法打开日志 {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    /// 重放时读取失败
    #[error("读取日志 {path} 失败: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// 记录无法解析，日志已损坏
    #[error("日志已损坏 {path} 第 {line} 行: {reason}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    /// 最后一行不完整（上次写入被中断）
    #[error("日志 {path} 第 {line} 行不完整，上次写入可能被中断: {reason}（删除该行后重新运行即可）")]
    TornTail {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    /// 追加写入失败
    #[error("写入日志 {path} 失败: {source}")]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },
    /// 词条序列化失败
    #[error("词条 '{word}' 序列化失败: {source}")]
    Encode {
        word: String,
        source: serde_json::Error,
    },
}

/// 一条日志记录
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    Hit(Entry),
    Tombstone(String),
}

impl LogRecord {
    /// 解析一行日志
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        match line.strip_prefix(TOMBSTONE_PREFIX) {
            Some(keyword) => Ok(LogRecord::Tombstone(keyword.trim().to_string())),
            None => Entry::from_line(line).map(LogRecord::Hit),
        }
    }
}

/// 索引查询结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexLookup<'a> {
    /// 命中词条
    Hit(&'a Entry),
    /// 命中墓碑（确认不存在）
    Tombstone,
    /// 从未查询过
    Missing,
}

/// 只追加的查询结果日志
///
/// 职责：
/// - 独占持有一个词典的 `words.txt`
/// - 启动时重放，之后只追加
/// - 每条记录写入后立即落盘，再更新内存索引
pub struct EntryLog {
    path: PathBuf,
    file: File,
    /// None 表示墓碑
    index: HashMap<String, Option<Entry>>,
    records: usize,
    /// 文件末尾缺少换行符，下一次写入前先补上
    unterminated: bool,
}

impl EntryLog {
    /// 打开（不存在则创建）并重放日志
    ///
    /// # 参数
    /// - `path`: 日志文件路径
    ///
    /// # 返回
    /// 任何一行无法解析都会返回 `Corrupt`（最后一行不完整时为 `TornTail`），不做部分恢复
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EntryLogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|source| EntryLogError::Open {
                path: path.clone(),
                source,
            })?;

        let mut log = Self {
            path,
            file,
            index: HashMap::new(),
            records: 0,
            unterminated: false,
        };
        log.replay()?;

        debug!(
            "日志重放完成: {} ({} 条记录, {} 个键)",
            log.path.display(),
            log.records,
            log.index.len()
        );

        Ok(log)
    }

    fn replay(&mut self) -> Result<(), EntryLogError> {
        let mut reader = BufReader::new(&self.file);
        let mut buf = String::new();
        let mut line_no = 0;

        loop {
            buf.clear();
            let read = reader.read_line(&mut buf).map_err(|source| EntryLogError::Read {
                path: self.path.clone(),
                source,
            })?;
            if read == 0 {
                break;
            }
            line_no += 1;

            let terminated = buf.ends_with('\n');
            self.unterminated = !terminated;
            let line = buf.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }

            let record = LogRecord::parse(line).map_err(|e| {
                let (path, reason) = (self.path.clone(), e.to_string());
                if terminated {
                    EntryLogError::Corrupt { path, line: line_no, reason }
                } else {
                    EntryLogError::TornTail { path, line: line_no, reason }
                }
            })?;
            Self::apply(&mut self.index, record);
            self.records += 1;
        }
        Ok(())
    }

    fn apply(index: &mut HashMap<String, Option<Entry>>, record: LogRecord) {
        match record {
            LogRecord::Tombstone(keyword) => {
                index.insert(keyword, None);
            }
            LogRecord::Hit(entry) => {
                if !entry.keyword.is_empty() {
                    index.insert(entry.keyword.clone(), Some(entry.clone()));
                }
                index.insert(entry.word.clone(), Some(entry));
            }
        }
    }

    /// 纯内存查询，不做 I/O
    pub fn lookup(&self, keyword: &str) -> IndexLookup<'_> {
        match self.index.get(keyword) {
            Some(Some(entry)) => IndexLookup::Hit(entry),
            Some(None) => IndexLookup::Tombstone,
            None => IndexLookup::Missing,
        }
    }

    /// 追加词条记录
    ///
    /// 写入成功后，`keyword` 与词条自身的规范拼写都会命中缓存。
    /// 记录里的 `keyword` 总是写成提交的拼写，重放后的索引与写入时一致
    pub fn append(&mut self, keyword: &str, entry: &Entry) -> Result<(), EntryLogError> {
        let mut entry = entry.clone();
        entry.keyword = keyword.to_string();

        let line = entry.to_line().map_err(|source| EntryLogError::Encode {
            word: entry.word.clone(),
            source,
        })?;
        self.write_line(&line)?;

        self.index.insert(entry.word.clone(), Some(entry.clone()));
        self.index.insert(keyword.to_string(), Some(entry));
        Ok(())
    }

    /// 追加墓碑记录
    ///
    /// 墓碑只对应提交的拼写，未找到的词没有规范拼写
    pub fn append_tombstone(&mut self, keyword: &str) -> Result<(), EntryLogError> {
        self.write_line(&format!("{}{}", TOMBSTONE_PREFIX, keyword))?;
        self.index.insert(keyword.to_string(), None);
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), EntryLogError> {
        let mut buf = String::with_capacity(line.len() + 2);
        if self.unterminated {
            buf.push('\n');
        }
        buf.push_str(line);
        buf.push('\n');

        self.file
            .write_all(buf.as_bytes())
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_data())
            .map_err(|source| EntryLogError::Append {
                path: self.path.clone(),
                source,
            })?;
        self.unterminated = false;
        self.records += 1;
        Ok(())
    }

    /// 换成只读句柄，之后的写入都会失败
    #[cfg(test)]
    pub(crate) fn reopen_read_only(&mut self) -> std::io::Result<()> {
        self.file = File::open(&self.path)?;
        Ok(())
    }

    /// 日志文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 已重放与追加的记录总数
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// 索引中的键数量
    pub fn key_count(&self) -> usize {
        self.index.len()
    }
}
