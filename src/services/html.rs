//! 页面抓取与文本提取辅助函数
//!
//! 只做尽力而为的正则提取，不追求 HTML 解析的正确性

use regex::Regex;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::models::Sense;
use crate::services::source::LookupError;

/// 请求页面
///
/// 404 视为确认不存在，其它非成功状态码为暂时性错误
pub async fn fetch_page(client: &Client, url: Url) -> Result<String, LookupError> {
    debug!("请求页面: {}", url);
    let response = client.get(url).send().await?;
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(LookupError::NotFound);
    }
    if !status.is_success() {
        return Err(LookupError::Http {
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

/// 在基础地址后追加一个经过编码的路径段
pub fn url_with_segment(base: &str, segment: &str) -> Result<Url, LookupError> {
    let mut url = Url::parse(base).map_err(LookupError::parse)?;
    url.path_segments_mut()
        .map_err(|_| LookupError::parse(format!("无法拼接 URL: {}", base)))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

/// 去掉标签、解码常见实体并压缩空白
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 第一个捕获组（已去标签），无匹配或内容为空返回 None
pub fn capture_first(pattern: &str, html: &str) -> Result<Option<String>, LookupError> {
    let re = Regex::new(pattern)?;
    Ok(re
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| strip_tags(m.as_str()))
        .filter(|s| !s.is_empty()))
}

/// 所有匹配的第一个捕获组（已去标签，跳过空值）
pub fn capture_all(pattern: &str, html: &str) -> Result<Vec<String>, LookupError> {
    let re = Regex::new(pattern)?;
    Ok(re
        .captures_iter(html)
        .filter_map(|cap| cap.get(1).map(|m| strip_tags(m.as_str())))
        .filter(|s| !s.is_empty())
        .collect())
}

/// 所有匹配的第一个捕获组原文（用于属性值，不去标签）
pub fn capture_raw(pattern: &str, html: &str) -> Result<Vec<String>, LookupError> {
    let re = Regex::new(pattern)?;
    Ok(re
        .captures_iter(html)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|s| !s.is_empty())
        .collect())
}

/// 从单个标签中读取属性值
pub fn attr(tag: &str, name: &str) -> Option<String> {
    let re = Regex::new(&format!(r#"\b{}\s*=\s*"([^"]*)""#, regex::escape(name))).ok()?;
    re.captures(tag)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
}

/// 按出现位置把例句挂到它之前最近的义项上
pub fn senses_with_examples(
    html: &str,
    sense_pattern: &str,
    example_pattern: &str,
) -> Result<Vec<Sense>, LookupError> {
    let sense_re = Regex::new(sense_pattern)?;
    let example_re = Regex::new(example_pattern)?;

    let mut marks: Vec<(usize, bool, String)> = Vec::new();
    for cap in sense_re.captures_iter(html) {
        if let Some(m) = cap.get(1) {
            marks.push((m.start(), true, strip_tags(m.as_str())));
        }
    }
    for cap in example_re.captures_iter(html) {
        if let Some(m) = cap.get(1) {
            marks.push((m.start(), false, strip_tags(m.as_str())));
        }
    }
    marks.sort_by_key(|(pos, _, _)| *pos);

    let mut senses: Vec<Sense> = Vec::new();
    for (_, is_sense, text) in marks {
        if text.is_empty() {
            continue;
        }
        if is_sense {
            senses.push(Sense {
                text,
                examples: Vec::new(),
            });
        } else if let Some(last) = senses.last_mut() {
            last.examples.push(text);
        }
    }
    Ok(senses)
}

/// 去重并保持顺序
pub fn dedup_keep_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags_decodes_entities() {
        assert_eq!(
            strip_tags("<b>fish</b> &amp;\n <i>chips</i>&nbsp;&lt;n&gt;"),
            "fish & chips <n>"
        );
    }

    #[test]
    fn test_url_with_segment_encodes() {
        let url = url_with_segment("https://example.com/dictionary/", "ice cream").unwrap();
        assert_eq!(url.as_str(), "https://example.com/dictionary/ice%20cream");
    }

    #[test]
    fn test_attr_reads_value() {
        let tag = r#"<a class="play-pron" data-dir="k" data-file="kestre01">"#;
        assert_eq!(attr(tag, "data-file").as_deref(), Some("kestre01"));
        assert_eq!(attr(tag, "data-lang"), None);
    }

    #[test]
    fn test_examples_attach_to_preceding_sense() {
        let html = r#"<p class="def">first</p><q>one</q><q>two</q><p class="def">second</p><q>three</q>"#;
        let senses =
            senses_with_examples(html, r#"<p class="def">(.*?)</p>"#, r"<q>(.*?)</q>").unwrap();
        assert_eq!(senses.len(), 2);
        assert_eq!(senses[0].examples, vec!["one", "two"]);
        assert_eq!(senses[1].text, "second");
        assert_eq!(senses[1].examples, vec!["three"]);
    }
}
