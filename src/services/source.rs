//! 词典查询能力契约
//!
//! 核心只依赖这里定义的接口：给定关键词，返回词条、确认不存在或暂时性错误。
//! 适配器必须正确区分"不存在"与"暂时失败"：前者会被永久记为墓碑，后者下次运行会重试。

use async_trait::async_trait;

use crate::models::{Dictionary, Entry};

/// 查询错误
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// 确认不存在
    #[error("not found")]
    NotFound,
    /// 服务端返回非成功状态码
    #[error("HTTP {status}")]
    Http { status: u16 },
    /// 网络请求失败
    #[error("请求失败: {0}")]
    Request(#[from] reqwest::Error),
    /// 页面无法解析
    #[error("页面解析失败: {reason}")]
    Parse { reason: String },
}

impl LookupError {
    /// 是否为确认不存在
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound)
    }

    pub(crate) fn parse(reason: impl std::fmt::Display) -> Self {
        LookupError::Parse {
            reason: reason.to_string(),
        }
    }
}

impl From<regex::Error> for LookupError {
    fn from(err: regex::Error) -> Self {
        LookupError::parse(err)
    }
}

/// 词典查询能力
///
/// 不要求幂等：同一关键词可以被重复调用，去重由缓存层负责
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// 词典标识
    fn dictionary(&self) -> Dictionary;

    /// 查询关键词
    ///
    /// 返回的词条 `keyword` 字段必须是本次提交的拼写
    async fn lookup(&self, keyword: &str) -> Result<Entry, LookupError>;
}
