//! 单个单词处理器 - 编排层
//!
//! ## 职责
//!
//! 按固定优先级依次调用每个词典的 `CacheOrchestrator`，收集词条并决定节流。
//!
//! ## 规则
//!
//! 1. **顺序固定**：启动时按优先级排序一次，之后每个单词都按同一顺序处理
//! 2. **互不影响**：一个词典的暂时性错误不会中断其他词典
//! 3. **免费判定**：每个词典都"已缓存"或"不存在"时，单词才是免费的
//! 4. **落盘失败即中止**：日志写不进去时立刻返回错误

use tracing::{debug, error};

use crate::infrastructure::EntryLogError;
use crate::models::{Dictionary, Entry};
use crate::services::SourceAdapter;
use crate::utils::logging::truncate_text;
use crate::workflow::{CacheOrchestrator, LookupState, ResolveError, WordCtx};

/// 单个词典对一个单词的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub dictionary: Dictionary,
    /// 暂时性错误时为 None
    pub state: Option<LookupState>,
    /// 该词典是否没有产生网络请求
    pub cached: bool,
    pub assets_downloaded: usize,
    pub asset_failures: usize,
}

impl SourceReport {
    /// 是否不需要为它等待
    pub fn is_free(&self) -> bool {
        match self.state {
            None => false,
            Some(LookupState::TombstoneHit | LookupState::FreshMiss | LookupState::Offline) => true,
            Some(LookupState::CacheHit | LookupState::FreshHit) => self.cached,
        }
    }
}

/// 单词处理结果
#[derive(Debug, Clone)]
pub struct WordOutcome {
    pub keyword: String,
    /// 按优先级排列的词条（可能为空）
    pub entries: Vec<Entry>,
    /// 每个词典的处理结果（按优先级）
    pub reports: Vec<SourceReport>,
    /// 是否可以不等待直接处理下一个单词
    pub free: bool,
}

/// 多词典协调器
pub struct MultiSourceCoordinator<S> {
    orchestrators: Vec<CacheOrchestrator<S>>,
}

impl<S: SourceAdapter> MultiSourceCoordinator<S> {
    /// 创建协调器，按词典优先级排序
    pub fn new(mut orchestrators: Vec<CacheOrchestrator<S>>) -> Self {
        orchestrators.sort_by_key(|o| o.dictionary().priority());
        Self { orchestrators }
    }

    /// 处理顺序
    pub fn dictionaries(&self) -> Vec<Dictionary> {
        self.orchestrators.iter().map(|o| o.dictionary()).collect()
    }

    pub fn orchestrators(&self) -> &[CacheOrchestrator<S>] {
        &self.orchestrators
    }

    /// 处理一个单词
    ///
    /// # 参数
    /// - `ctx`: 单词上下文
    ///
    /// # 返回
    /// 只有日志写入失败才返回错误，其余情况都体现在 `WordOutcome` 中
    pub async fn process_word(&mut self, ctx: &WordCtx) -> Result<WordOutcome, EntryLogError> {
        let mut entries = Vec::new();
        let mut reports = Vec::with_capacity(self.orchestrators.len());

        for orch in self.orchestrators.iter_mut() {
            let dictionary = orch.dictionary();
            let report = match orch.resolve(ctx).await {
                Ok(resolution) => {
                    let report = SourceReport {
                        dictionary,
                        state: Some(resolution.state),
                        cached: resolution.cached,
                        assets_downloaded: resolution.assets_downloaded,
                        asset_failures: resolution.asset_failures.len(),
                    };
                    if let Some(entry) = resolution.entry {
                        if let Some(sense) = entry.definitions.first().and_then(|d| d.senses.first()) {
                            debug!("{} [{}] {}", ctx, dictionary, truncate_text(&sense.text, 60));
                        }
                        entries.push(entry);
                    }
                    report
                }
                Err(ResolveError::Transient(_)) => SourceReport {
                    dictionary,
                    state: None,
                    cached: false,
                    assets_downloaded: 0,
                    asset_failures: 0,
                },
                Err(ResolveError::Durability(e)) => {
                    error!("{} [{}] ❌ 日志写入失败，停止处理: {}", ctx, dictionary, e);
                    return Err(e);
                }
            };
            reports.push(report);
        }

        let free = reports.iter().all(SourceReport::is_free);
        Ok(WordOutcome {
            keyword: ctx.keyword.clone(),
            entries,
            reports,
            free,
        })
    }
}
