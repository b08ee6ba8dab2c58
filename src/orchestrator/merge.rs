//! 多词典结果合并
//!
//! 输入是按优先级排好序的词条列表，输出一条可导出的合并记录。

use serde::{Deserialize, Serialize};

use crate::infrastructure::asset_store::file_name_for;
use crate::models::{Dictionary, Entry};

/// 一个单词的合并记录（导出为一行 JSON）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    /// 提交的关键词
    pub keyword: String,
    /// 优先级最高的词条的词头
    pub word: String,
    /// 按优先级第一个非空音标
    pub pronunciation: String,
    /// 主发音文件名：韦氏优先，否则取第一个有音频的词条
    pub audio: Option<String>,
    /// 全部资源文件名（去重，保持顺序）
    pub files: Vec<String>,
    /// 参与合并的词典（与 entries 一一对应）
    pub sources: Vec<Dictionary>,
    pub entries: Vec<Entry>,
}

impl MergedRecord {
    /// 合并；没有任何词条时返回 None
    pub fn merge(keyword: &str, entries: Vec<Entry>) -> Option<Self> {
        let word = entries.first()?.word.clone();

        let pronunciation = entries
            .iter()
            .map(|e| e.pronunciation.as_str())
            .find(|p| !p.is_empty())
            .unwrap_or_default()
            .to_string();

        let primary = entries
            .iter()
            .find(|e| e.dictionary == Dictionary::Webster)
            .and_then(Entry::first_audio)
            .or_else(|| entries.iter().find_map(Entry::first_audio));
        let audio = primary.and_then(|url| file_name_for(url).ok());

        let mut files: Vec<String> = Vec::new();
        for url in entries.iter().flat_map(Entry::asset_urls) {
            if let Ok(name) = file_name_for(url) {
                if !files.contains(&name) {
                    files.push(name);
                }
            }
        }

        Some(Self {
            keyword: keyword.to_string(),
            word,
            pronunciation,
            audio,
            files,
            sources: entries.iter().map(|e| e.dictionary).collect(),
            entries,
        })
    }
}
