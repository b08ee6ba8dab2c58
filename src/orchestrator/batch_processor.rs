//! 单词流处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责单词流的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：运行日志、HTTP 客户端、每个词典的数据目录与日志重放
//! 2. **逐个处理**：一个单词在所有词典处理完之后才开始下一个
//! 3. **节流**：上一个单词访问过网络时，处理下一个之前等待
//! 4. **导出**：有词条的单词合并后写入导出文件
//! 5. **全局统计**：汇总整次运行的结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个词典的细节
//! - **资源所有者**：唯一持有协调器与导出文件的模块
//! - **向下委托**：委托 word_processor 处理单个单词

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::config::Config;
use crate::infrastructure::build_client;
use crate::models::WordStream;
use crate::orchestrator::merge::MergedRecord;
use crate::orchestrator::pacing::{Pacer, Pacing};
use crate::orchestrator::word_processor::{MultiSourceCoordinator, WordOutcome};
use crate::services::{DictSource, ExportWriter, SourceAdapter};
use crate::utils::logging;
use crate::workflow::{CacheOrchestrator, LookupState, ResolveOptions, WordCtx};

/// 应用主结构
pub struct App {
    config: Config,
    coordinator: MultiSourceCoordinator<DictSource>,
    export: Option<ExportWriter>,
}

impl App {
    /// 初始化应用
    ///
    /// 任何词典日志损坏都会中止启动
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;

        let dicts = config.ordered_dicts();
        logging::log_startup(
            &dicts,
            &config.data_dir,
            config.query_online,
            config.download_assets,
        );

        let client = build_client(&config)?;
        let options = ResolveOptions {
            query_online: config.query_online,
            download_assets: config.download_assets,
        };

        let mut orchestrators = Vec::with_capacity(dicts.len());
        for dict in dicts {
            let dir = config.dict_dir(dict);
            let source = DictSource::new(dict, client.clone());
            let orch = CacheOrchestrator::open(source, &dir, client.clone(), options)
                .with_context(|| format!("无法初始化词典 {} ({})", dict.name(), dir.display()))?;
            logging::log_dictionary_loaded(dict, orch.log().record_count(), orch.log().key_count());
            orchestrators.push(orch);
        }

        let export = match &config.export_file {
            Some(path) => Some(ExportWriter::open(path).await?),
            None => None,
        };

        Ok(Self {
            config,
            coordinator: MultiSourceCoordinator::new(orchestrators),
            export,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<RunStats> {
        let mut words = WordStream::from_config(self.config.word_list.as_deref()).await?;
        let pacer = Pacer::new(self.config.sleep_interval());

        let result = process_stream(
            &mut self.coordinator,
            &mut words,
            &pacer,
            self.export.as_mut(),
            &self.config.output_log_file,
        )
        .await;

        let stats = match &result {
            Ok(stats) => stats,
            Err(failure) => &failure.stats,
        };
        let lines = stats.summary_lines();
        logging::print_final_stats(&lines, &self.config.output_log_file);
        for line in &lines {
            logging::append_log_line(&self.config.output_log_file, line)?;
        }

        result.map_err(|failure| failure.error)
    }
}

/// 中途失败时仍保留已完成部分的统计
#[derive(Debug)]
pub struct StreamFailure {
    pub stats: RunStats,
    pub error: anyhow::Error,
}

/// 处理整个单词流
///
/// # 参数
/// - `coordinator`: 多词典协调器
/// - `words`: 单词流
/// - `pacer`: 节流器
/// - `export`: 导出文件（可选）
/// - `log_file_path`: 运行日志，每个单词追加一行
///
/// # 返回
/// 正常结束返回统计；日志写入失败等致命错误返回 `StreamFailure`
pub async fn process_stream<S: SourceAdapter>(
    coordinator: &mut MultiSourceCoordinator<S>,
    words: &mut WordStream,
    pacer: &Pacer,
    mut export: Option<&mut ExportWriter>,
    log_file_path: &str,
) -> Result<RunStats, StreamFailure> {
    let mut stats = RunStats::default();
    let mut pending = Pacing::Free;

    loop {
        let keyword = match words.next_word().await {
            Ok(Some(keyword)) => keyword,
            Ok(None) => break,
            Err(error) => return Err(StreamFailure { stats, error }),
        };

        // 上一个单词访问过网络，等待后再继续
        pacer.pause(pending).await;

        let ctx = WordCtx::new(keyword, stats.words + 1);
        let outcome = match coordinator.process_word(&ctx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{} ❌ 致命错误，中止运行: {}", ctx, e);
                return Err(StreamFailure {
                    stats,
                    error: e.into(),
                });
            }
        };

        pending = pacer.decide(outcome.free);
        stats.record(&outcome, pending != Pacing::Free);

        if let Err(error) = finish_word(&ctx, outcome, export.as_deref_mut(), log_file_path).await {
            return Err(StreamFailure { stats, error });
        }
        logging::log_progress(stats.words);
    }

    Ok(stats)
}

async fn finish_word(
    ctx: &WordCtx,
    outcome: WordOutcome,
    export: Option<&mut ExportWriter>,
    log_file_path: &str,
) -> Result<()> {
    let sources: Vec<&str> = outcome
        .entries
        .iter()
        .map(|e| e.dictionary.id())
        .collect();
    logging::append_log_line(
        log_file_path,
        &format!("{}\t{}\t{}", ctx.keyword, outcome.entries.len(), sources.join(",")),
    )?;

    match MergedRecord::merge(&ctx.keyword, outcome.entries) {
        Some(record) => {
            info!("{} ✓ {} 个词典有结果", ctx, record.sources.len());
            if let Some(writer) = export {
                writer.write(&record).await?;
            }
        }
        None => info!("{} ✗ 所有词典均无结果", ctx),
    }
    Ok(())
}

/// 运行统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// 处理的单词数
    pub words: usize,
    /// 至少一个词典有结果
    pub words_with_entries: usize,
    /// 所有词典均无结果
    pub words_without_entries: usize,
    /// 在线查询次数（成功或确认不存在）
    pub fresh_lookups: usize,
    pub cache_hits: usize,
    pub tombstone_hits: usize,
    /// 暂时性错误（未写日志，下次重试）
    pub transient_errors: usize,
    pub assets_downloaded: usize,
    pub asset_failures: usize,
    /// 处理后需要等待的单词数
    pub throttled_words: usize,
}

impl RunStats {
    /// 记录一个单词的结果
    pub fn record(&mut self, outcome: &WordOutcome, throttled: bool) {
        self.words += 1;
        if outcome.entries.is_empty() {
            self.words_without_entries += 1;
        } else {
            self.words_with_entries += 1;
        }
        if throttled {
            self.throttled_words += 1;
        }

        for report in &outcome.reports {
            match report.state {
                Some(LookupState::FreshHit | LookupState::FreshMiss) => self.fresh_lookups += 1,
                Some(LookupState::CacheHit) => self.cache_hits += 1,
                Some(LookupState::TombstoneHit) => self.tombstone_hits += 1,
                Some(LookupState::Offline) => {}
                None => self.transient_errors += 1,
            }
            self.assets_downloaded += report.assets_downloaded;
            self.asset_failures += report.asset_failures;
        }
    }

    /// 统计输出行
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("📝 处理单词: {}", self.words),
            format!("✅ 有结果: {}", self.words_with_entries),
            format!("❌ 无结果: {}", self.words_without_entries),
            format!(
                "🌐 在线查询: {} | 缓存命中: {} | 墓碑命中: {}",
                self.fresh_lookups, self.cache_hits, self.tombstone_hits
            ),
            format!("⚠️ 暂时性错误: {}（下次运行重试）", self.transient_errors),
            format!(
                "🎵 资源下载: {} | 下载失败: {}",
                self.assets_downloaded, self.asset_failures
            ),
            format!("⏳ 节流单词: {}", self.throttled_words),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::EntryLogError;
    use crate::models::{Dictionary, Entry};
    use crate::orchestrator::word_processor::SourceReport;
    use crate::services::LookupError;
    use async_trait::async_trait;
    use reqwest::Client;
    use std::time::Duration;

    /// 任何关键词都能查到
    struct EchoSource(Dictionary);

    #[async_trait]
    impl SourceAdapter for EchoSource {
        fn dictionary(&self) -> Dictionary {
            self.0
        }

        async fn lookup(&self, keyword: &str) -> Result<Entry, LookupError> {
            Ok(Entry::new(self.0, keyword, keyword))
        }
    }

    fn report(state: Option<LookupState>, downloaded: usize, failures: usize) -> SourceReport {
        SourceReport {
            dictionary: Dictionary::Webster,
            state,
            cached: false,
            assets_downloaded: downloaded,
            asset_failures: failures,
        }
    }

    #[test]
    fn test_stats_record_counts_each_source() {
        let outcome = WordOutcome {
            keyword: "owl".to_string(),
            entries: vec![Entry::new(Dictionary::Webster, "owl", "owl")],
            reports: vec![
                report(Some(LookupState::FreshHit), 2, 1),
                report(Some(LookupState::TombstoneHit), 0, 0),
                report(None, 0, 0),
            ],
            free: false,
        };
        let mut stats = RunStats::default();
        stats.record(&outcome, true);

        assert_eq!(stats.words, 1);
        assert_eq!(stats.words_with_entries, 1);
        assert_eq!(stats.fresh_lookups, 1);
        assert_eq!(stats.tombstone_hits, 1);
        assert_eq!(stats.transient_errors, 1);
        assert_eq!(stats.assets_downloaded, 2);
        assert_eq!(stats.asset_failures, 1);
        assert_eq!(stats.throttled_words, 1);
        assert!(stats.summary_lines()[0].contains('1'));
    }

    #[tokio::test]
    async fn test_log_write_failure_aborts_stream_with_partial_stats() {
        let root = tempfile::tempdir().unwrap();
        let options = ResolveOptions {
            query_online: true,
            download_assets: false,
        };
        let client = Client::builder().no_proxy().build().unwrap();
        let dir = root.path().join("webster");
        let mut orch = CacheOrchestrator::open(EchoSource(Dictionary::Webster), &dir, client, options).unwrap();

        // owl 已在日志中，之后日志无法写入
        orch.resolve(&WordCtx::new("owl", 1)).await.unwrap();
        orch.log_mut().reopen_read_only().unwrap();

        let mut coordinator = MultiSourceCoordinator::new(vec![orch]);
        let mut words = WordStream::from_reader(&b"owl\nhawk\nkestrel\n"[..]);
        let pacer = Pacer::new(Duration::ZERO);
        let log_path = root.path().join("run.log");
        let log_path = log_path.to_str().unwrap();

        let failure = process_stream(&mut coordinator, &mut words, &pacer, None, log_path)
            .await
            .unwrap_err();

        assert_eq!(failure.stats.words, 1);
        assert_eq!(failure.stats.cache_hits, 1);
        assert!(matches!(
            failure.error.downcast_ref::<EntryLogError>(),
            Some(EntryLogError::Append { .. })
        ));

        let run_log = std::fs::read_to_string(log_path).unwrap();
        assert!(run_log.contains("owl\t1\twebster"));
        assert!(!run_log.contains("hawk"));
        assert!(!run_log.contains("kestrel"));
    }
}
