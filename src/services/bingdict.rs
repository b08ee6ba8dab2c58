//! 必应词典适配器

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::models::{Definition, Dictionary, Entry, Sense};
use crate::services::html::{self, capture_all, capture_first, capture_raw, dedup_keep_order};
use crate::services::source::{LookupError, SourceAdapter};

const SEARCH_URL: &str = "https://cn.bing.com/dict/search";

/// 必应词典
pub struct BingDict {
    client: Client,
}

impl BingDict {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for BingDict {
    fn dictionary(&self) -> Dictionary {
        Dictionary::BingDict
    }

    async fn lookup(&self, keyword: &str) -> Result<Entry, LookupError> {
        let url = Url::parse_with_params(SEARCH_URL, &[("q", keyword), ("qs", "n"), ("form", "Z9LH5")])
            .map_err(LookupError::parse)?;
        let page = html::fetch_page(&self.client, url).await?;
        parse_page(keyword, &page)?.ok_or(LookupError::NotFound)
    }
}

/// 从页面提取词条；没有词头时返回 None
pub fn parse_page(keyword: &str, page: &str) -> Result<Option<Entry>, LookupError> {
    let Some(word) = capture_first(
        r#"(?s)<div id="headword"[^>]*>\s*<h1[^>]*>\s*<strong[^>]*>(.*?)</strong>"#,
        page,
    )?
    else {
        return Ok(None);
    };
    let mut entry = Entry::new(Dictionary::BingDict, word, keyword);

    // 美式音标优先
    let pronunciation = match capture_first(r#"(?s)<div class="hd_prUS[^"]*"[^>]*>(.*?)</div>"#, page)? {
        Some(us) => Some(us),
        None => capture_first(r#"(?s)<div class="hd_pr(?:\s[^"]*)?"[^>]*>(.*?)</div>"#, page)?,
    };
    entry.pronunciation = pronunciation.unwrap_or_default();

    // 发音链接写在 onclick 脚本里
    entry.audio = dedup_keep_order(capture_raw(
        r#"<div class="hd_tf"[^>]*>\s*<a[^>]*onclick="[^"]*?(https://[^"']+?\.mp3)"#,
        page,
    )?);

    if let Some(qdef) = capture_raw(r#"(?s)<div class="qdef"[^>]*>(.*?)</ul>"#, page)?
        .into_iter()
        .next()
    {
        for item in capture_raw(r#"(?s)<li[^>]*>(.*?)</li>"#, &qdef)? {
            let Some(def) = capture_first(r#"(?s)<span class="def[^"]*"[^>]*>(.*?)</span>"#, &item)? else {
                continue;
            };
            let part_of_speech =
                capture_first(r#"(?s)<span class="pos[^"]*"[^>]*>(.*?)</span>"#, &item)?.unwrap_or_default();
            entry.definitions.push(Definition {
                part_of_speech,
                senses: vec![Sense {
                    text: def,
                    examples: Vec::new(),
                }],
            });
        }
    }

    // 例句按英文与中文配对，挂在第一个义项下
    let english = capture_all(r#"(?s)<div class="sen_en[^"]*"[^>]*>(.*?)</div>"#, page)?;
    let chinese = capture_all(r#"(?s)<div class="sen_cn[^"]*"[^>]*>(.*?)</div>"#, page)?;
    let examples: Vec<String> = english
        .into_iter()
        .enumerate()
        .map(|(i, en)| match chinese.get(i) {
            Some(cn) => format!("{} {}", en, cn),
            None => en,
        })
        .collect();
    if let Some(sense) = entry
        .definitions
        .first_mut()
        .and_then(|def| def.senses.first_mut())
    {
        sense.examples = examples;
    }

    if let Some(area) = capture_raw(r#"(?s)<div class="img_area"[^>]*>(.*?)</div>"#, page)?
        .into_iter()
        .next()
    {
        let pictures = capture_raw(r#"<img\s+[^>]*src="([^"]+)""#, &area)?
            .iter()
            .filter_map(|src| picture_url(src))
            .collect();
        entry.pictures = dedup_keep_order(pictures);
    }

    Ok(Some(entry))
}

/// 缩略图地址形如 `/th?id=OIP.xxx&pid=Api`，文件名都是 `th`，
/// 改写成 `/th/id/OIP.xxx` 让每张图有独立的文件名
fn picture_url(src: &str) -> Option<String> {
    let src = src.replace("&amp;", "&");
    let url = Url::parse(&src).ok()?;
    let is_thumbnail = url.path_segments().and_then(|mut s| s.next_back()) == Some("th");
    if !is_thumbnail {
        return Some(url.to_string());
    }
    let id = url.query_pairs().find(|(k, _)| k == "id").map(|(_, v)| v.into_owned())?;
    let host = url.host_str()?;
    Some(format!("{}://{}/th/id/{}", url.scheme(), host, id))
}
