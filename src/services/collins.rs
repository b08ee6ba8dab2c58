//! Collins 词典适配器

use async_trait::async_trait;
use reqwest::Client;

use crate::models::{Definition, Dictionary, Entry};
use crate::services::html::{self, capture_first, capture_raw, dedup_keep_order, senses_with_examples};
use crate::services::source::{LookupError, SourceAdapter};

const SEARCH_URL: &str = "https://www.collinsdictionary.com/dictionary/english/";

/// 柯林斯词典
pub struct CollinsDict {
    client: Client,
}

impl CollinsDict {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for CollinsDict {
    fn dictionary(&self) -> Dictionary {
        Dictionary::Collins
    }

    async fn lookup(&self, keyword: &str) -> Result<Entry, LookupError> {
        let url = html::url_with_segment(SEARCH_URL, keyword)?;
        let page = html::fetch_page(&self.client, url).await?;
        parse_page(keyword, &page)?.ok_or(LookupError::NotFound)
    }
}

/// 从页面提取词条；没有词头时返回 None
pub fn parse_page(keyword: &str, page: &str) -> Result<Option<Entry>, LookupError> {
    let Some(word) = capture_first(
        r#"(?s)<h2 class="h2_entry"[^>]*>.*?<span class="orth"[^>]*>(.*?)</span>"#,
        page,
    )?
    else {
        return Ok(None);
    };

    let mut entry = Entry::new(Dictionary::Collins, word, keyword);
    entry.pronunciation = capture_first(r#"(?s)<span class="pron[^"]*"[^>]*>(.*?)</span>"#, page)?
        .map(|p| format!("/{}/", p.trim_matches('/')))
        .unwrap_or_default();
    entry.audio = dedup_keep_order(capture_raw(r#"data-src-mp3="([^"]+)""#, page)?);

    for section in page.split(r#"<div class="hom""#).skip(1) {
        let part_of_speech =
            capture_first(r#"(?s)<span class="pos"[^>]*>(.*?)</span>"#, section)?.unwrap_or_default();
        let senses = senses_with_examples(
            section,
            r#"(?s)<div class="def"[^>]*>(.*?)</div>"#,
            r#"(?s)<span class="quote"[^>]*>(.*?)</span>"#,
        )?;
        if senses.is_empty() {
            continue;
        }
        entry.definitions.push(Definition {
            part_of_speech: short_part_of_speech(&part_of_speech),
            senses,
        });
    }

    Ok(Some(entry))
}

fn short_part_of_speech(pos: &str) -> String {
    match pos {
        "transitive verb" => "vt.".to_string(),
        "intransitive verb" => "vi.".to_string(),
        other => other.to_string(),
    }
}
