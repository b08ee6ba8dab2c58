//! HTTP 客户端构建
//!
//! 所有词典查询和资源下载共用同一个连接池

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use tracing::debug;

use crate::config::Config;

/// 根据配置创建 HTTP 客户端
pub fn build_client(config: &Config) -> Result<Client> {
    debug!(
        "创建 HTTP 客户端: 超时 {}s, UA: {}",
        config.http_timeout_secs, config.user_agent
    );

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(config.http_timeout_secs))
        .timeout(Duration::from_secs(config.http_timeout_secs * 2))
        .pool_max_idle_per_host(256)
        .pool_idle_timeout(Duration::from_secs(600))
        .build()
        .context("无法创建 HTTP 客户端")
}
