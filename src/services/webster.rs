//! Merriam-Webster 词典适配器

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

use crate::models::{Definition, Dictionary, Entry};
use crate::services::html::{self, attr, capture_all, capture_first, senses_with_examples};
use crate::services::source::{LookupError, SourceAdapter};

const SEARCH_URL: &str = "https://www.merriam-webster.com/dictionary/";
const AUDIO_URL: &str = "https://media.merriam-webster.com/audio/prons/en/us/mp3";

/// 韦氏词典
pub struct WebsterDict {
    client: Client,
}

impl WebsterDict {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for WebsterDict {
    fn dictionary(&self) -> Dictionary {
        Dictionary::Webster
    }

    async fn lookup(&self, keyword: &str) -> Result<Entry, LookupError> {
        let url = html::url_with_segment(SEARCH_URL, keyword)?;
        let page = html::fetch_page(&self.client, url).await?;
        parse_page(keyword, &page)?.ok_or(LookupError::NotFound)
    }
}

/// 从页面提取词条；没有词头时返回 None
pub fn parse_page(keyword: &str, page: &str) -> Result<Option<Entry>, LookupError> {
    let Some(word) = capture_first(r#"(?s)<h1 class="hword"[^>]*>(.*?)</h1>"#, page)? else {
        return Ok(None);
    };

    let mut entry = Entry::new(Dictionary::Webster, word, keyword);
    entry.pronunciation =
        capture_first(r#"(?s)<span class="prs[^"]*">.*?<span class="pr">(.*?)</span>"#, page)?
            .unwrap_or_default();
    entry.syllables = capture_first(r#"(?s)<span class="word-syllables[^"]*">(.*?)</span>"#, page)?;

    // 第一个发音按钮：data-dir + data-file 拼出 mp3 地址
    let play = Regex::new(r#"<a[^>]*class="[^"]*play-pron[^"]*"[^>]*>"#)?;
    if let Some(tag) = play.find(page) {
        if let (Some(dir), Some(file)) = (attr(tag.as_str(), "data-dir"), attr(tag.as_str(), "data-file")) {
            entry.audio.push(format!("{}/{}/{}.mp3", AUDIO_URL, dir, file));
        }
    }

    // 每个 entry-header 开始一个词性分组，直到下一个 header
    for section in page.split(r#"class="row entry-header"#).skip(1) {
        let part_of_speech = capture_all(r#"(?s)class="fl"[^>]*>(.*?)</"#, section)?
            .into_iter()
            .next()
            .unwrap_or_default();
        let senses = senses_with_examples(
            section,
            r#"(?s)<span class="dtText">(.*?)</span>"#,
            r#"(?s)<span class="[^"]*mw_t_sp[^"]*">(.*?)</span>"#,
        )?
        .into_iter()
        .map(|mut sense| {
            sense.text = sense.text.trim_start_matches(':').trim().to_string();
            sense
        })
        .collect();

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
