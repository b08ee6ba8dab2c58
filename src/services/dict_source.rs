//! 词典适配器的封闭集合
//!
//! 配置中出现的每个词典都对应一个 `DictSource` 变体，
//! 编排层只看到 `SourceAdapter`，不关心具体是哪家网站。

use async_trait::async_trait;
use reqwest::Client;

use crate::models::{Dictionary, Entry};
use crate::services::bingdict::BingDict;
use crate::services::collins::CollinsDict;
use crate::services::dictcn::DictcnDict;
use crate::services::source::{LookupError, SourceAdapter};
use crate::services::webster::WebsterDict;

/// 已知词典的适配器
pub enum DictSource {
    Collins(CollinsDict),
    Webster(WebsterDict),
    Dictcn(DictcnDict),
    BingDict(BingDict),
}

impl DictSource {
    /// 为指定词典创建适配器，共享同一个 HTTP 客户端
    pub fn new(dictionary: Dictionary, client: Client) -> Self {
        match dictionary {
            Dictionary::Collins => DictSource::Collins(CollinsDict::new(client)),
            Dictionary::Webster => DictSource::Webster(WebsterDict::new(client)),
            Dictionary::Dictcn => DictSource::Dictcn(DictcnDict::new(client)),
            Dictionary::BingDict => DictSource::BingDict(BingDict::new(client)),
        }
    }
}

#[async_trait]
impl SourceAdapter for DictSource {
    fn dictionary(&self) -> Dictionary {
        match self {
            DictSource::Collins(dict) => dict.dictionary(),
            DictSource::Webster(dict) => dict.dictionary(),
            DictSource::Dictcn(dict) => dict.dictionary(),
            DictSource::BingDict(dict) => dict.dictionary(),
        }
    }

    async fn lookup(&self, keyword: &str) -> Result<Entry, LookupError> {
        match self {
            DictSource::Collins(dict) => dict.lookup(keyword).await,
            DictSource::Webster(dict) => dict.lookup(keyword).await,
            DictSource::Dictcn(dict) => dict.lookup(keyword).await,
            DictSource::BingDict(dict) => dict.lookup(keyword).await,
        }
    }
}
