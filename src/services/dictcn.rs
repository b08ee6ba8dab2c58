//! 海词 (dict.cn) 适配器
//!
//! 只提取基本释义（`dict-basic-ul`）与美式发音，
//! 美式女声优先，缺失时退回英式。

use async_trait::async_trait;
use reqwest::Client;

use crate::models::{Definition, Dictionary, Entry, Sense};
use crate::services::html::{self, capture_first, capture_raw};
use crate::services::source::{LookupError, SourceAdapter};

const SEARCH_URL: &str = "http://dict.cn/";
const AUDIO_URL: &str = "http://audio.dict.cn/";

/// 海词
pub struct DictcnDict {
    client: Client,
}

impl DictcnDict {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for DictcnDict {
    fn dictionary(&self) -> Dictionary {
        Dictionary::Dictcn
    }

    async fn lookup(&self, keyword: &str) -> Result<Entry, LookupError> {
        let url = html::url_with_segment(SEARCH_URL, keyword)?;
        let page = html::fetch_page(&self.client, url).await?;
        parse_page(keyword, &page)?.ok_or(LookupError::NotFound)
    }
}

/// 从页面提取词条；没有关键词标题时返回 None
pub fn parse_page(keyword: &str, page: &str) -> Result<Option<Entry>, LookupError> {
    let Some(word) = capture_first(r#"(?s)<h1 class="keyword"[^>]*>(.*?)</h1>"#, page)? else {
        return Ok(None);
    };
    let mut entry = Entry::new(Dictionary::Dictcn, word, keyword);

    // phonetic 下第一个 span 为英式，第二个为美式
    if let Some(phonetic) = capture_raw(r#"(?s)<div class="phonetic"[^>]*>(.*?)</div>"#, page)?
        .into_iter()
        .next()
    {
        let spans = capture_raw(r#"(?s)<span[^>]*>(.*?)</span>"#, &phonetic)?;
        let preferred = spans.get(1).or_else(|| spans.first());
        if let Some(span) = preferred {
            if let Some(pron) = capture_first(r#"(?s)<bdo[^>]*>(.*?)</bdo>"#, span)? {
                let bare = pron.trim_matches(|c| matches!(c, '[' | ']' | '/'));
                entry.pronunciation = format!("/{}/", bare);
            }
            if let Some(file) = capture_raw(r#"naudio="([^"]+)""#, span)?.into_iter().next() {
                entry.audio.push(format!("{}{}", AUDIO_URL, file.trim_start_matches('/')));
            }
        }
        if entry.audio.is_empty() {
            if let Some(file) = capture_raw(r#"naudio="([^"]+)""#, &phonetic)?.into_iter().next() {
                entry.audio.push(format!("{}{}", AUDIO_URL, file.trim_start_matches('/')));
            }
        }
    }

    if let Some(basic) = capture_raw(r#"(?s)<ul class="dict-basic-ul"[^>]*>(.*?)</ul>"#, page)?
        .into_iter()
        .next()
    {
        for item in capture_raw(r#"(?s)<li[^>]*>(.*?)</li>"#, &basic)? {
            let Some(def) = capture_first(r#"(?s)<strong[^>]*>(.*?)</strong>"#, &item)? else {
                continue;
            };
            let part_of_speech =
                capture_first(r#"(?s)<span[^>]*>(.*?)</span>"#, &item)?.unwrap_or_default();
            entry.definitions.push(Definition {
                part_of_speech,
                senses: vec![Sense {
                    text: def,
                    examples: Vec::new(),
                }],
            });
        }
    }

    Ok(Some(entry))
}
