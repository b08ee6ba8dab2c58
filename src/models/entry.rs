use serde::{Deserialize, Serialize};

use crate::models::dictionary::Dictionary;

/// 单个词典返回的词条
///
/// 词条一旦写入日志即不可变；`word` 是词典报告的规范拼写，
/// `keyword` 是实际提交查询的拼写（两者可能不同，例如大小写或词形变化）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub dictionary: Dictionary,
    pub word: String,
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub pronunciation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syllables: Option<String>,
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub audio: Vec<String>,
    #[serde(default)]
    pub pictures: Vec<String>,
}

/// 按词性分组的释义
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub part_of_speech: String,
    #[serde(default)]
    pub senses: Vec<Sense>,
}

/// 单条义项及其例句
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sense {
    pub text: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl Entry {
    /// 创建只有词头的空词条
    pub fn new(dictionary: Dictionary, word: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            dictionary,
            word: word.into(),
            keyword: keyword.into(),
            pronunciation: String::new(),
            syllables: None,
            definitions: Vec::new(),
            audio: Vec::new(),
            pictures: Vec::new(),
        }
    }

    /// 规范标识（词典报告的词头）
    pub fn identity(&self) -> &str {
        &self.word
    }

    /// 序列化为单行文本（不含换行符）
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// 从日志行反序列化
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim_end())
    }

    /// 所有需要下载的资源 URL（先音频后图片）
    pub fn asset_urls(&self) -> Vec<&str> {
        self.audio
            .iter()
            .chain(self.pictures.iter())
            .map(String::as_str)
            .collect()
    }

    /// 第一个非空音频 URL
    pub fn first_audio(&self) -> Option<&str> {
        self.audio.iter().map(String::as_str).find(|u| !u.is_empty())
    }
}
