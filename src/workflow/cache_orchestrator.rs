//! 缓存优先的单词解析流程 - 流程层
//!
//! 核心职责：定义"一个词典查一个关键词"的完整流程
//!
//! 流程顺序：
//! 1. 查内存索引：墓碑 → 不存在；词条 → 命中
//! 2. 离线模式且未命中 → 视为不存在（不写日志）
//! 3. 调用词典：不存在 → 写墓碑；暂时性错误 → 原样返回，不写日志；成功 → 写词条
//! 4. 下载词条引用的音频与图片，全部无需联网才算"已缓存"

use std::path::Path;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::{AssetError, AssetStore, EntryLog, EntryLogError, FetchOutcome, IndexLookup};
use crate::models::{Dictionary, Entry};
use crate::services::{AssetFailureWriter, LookupError, SourceAdapter};
use crate::workflow::word_ctx::WordCtx;

/// 日志文件名
pub const LOG_FILE_NAME: &str = "words.txt";
/// 音频子目录
pub const AUDIO_DIR_NAME: &str = "audio";
/// 图片子目录
pub const PICTURE_DIR_NAME: &str = "pic";

/// 解析失败
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// 暂时性错误：未写日志，下次运行会重试
    #[error("暂时性查询失败: {0}")]
    Transient(LookupError),
    /// 日志无法落盘：继续运行会丢失结果，必须中止
    #[error(transparent)]
    Durability(#[from] EntryLogError),
}

/// 单个（词典, 关键词）的解析状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupState {
    /// 日志中已有词条
    CacheHit,
    /// 日志中已有墓碑
    TombstoneHit,
    /// 在线查询成功并已写入日志
    FreshHit,
    /// 在线确认不存在并已写入墓碑
    FreshMiss,
    /// 离线模式下未命中，未写日志
    Offline,
}

/// 一次资源下载失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFailure {
    pub url: String,
    pub reason: String,
}

/// 解析结果
#[derive(Debug, Clone)]
pub struct Resolution {
    pub state: LookupState,
    /// 不存在时为 None
    pub entry: Option<Entry>,
    /// 整个解析过程（包括资源下载）没有产生网络请求
    pub cached: bool,
    /// 新下载的资源数
    pub assets_downloaded: usize,
    pub asset_failures: Vec<AssetFailure>,
}

impl Resolution {
    fn not_found(state: LookupState, cached: bool) -> Self {
        Self {
            state,
            entry: None,
            cached,
            assets_downloaded: 0,
            asset_failures: Vec::new(),
        }
    }

    /// 是否为"不存在"（墓碑、在线确认不存在、离线未命中）
    pub fn is_not_found(&self) -> bool {
        self.entry.is_none()
    }
}

/// 解析选项
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// 缓存未命中时是否在线查询
    pub query_online: bool,
    /// 是否下载音频与图片
    pub download_assets: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            query_online: true,
            download_assets: true,
        }
    }
}

/// 缓存优先的解析流程
///
/// - 独占一个词典的日志与索引
/// - 只依赖 `SourceAdapter` 能力，不关心具体网站
/// - 不在两次调用之间保存任何状态（状态都在日志与资源目录里）
pub struct CacheOrchestrator<S> {
    source: S,
    log: EntryLog,
    audio_store: AssetStore,
    picture_store: AssetStore,
    failure_writer: AssetFailureWriter,
    options: ResolveOptions,
}

impl<S: SourceAdapter> CacheOrchestrator<S> {
    /// 在词典目录下打开日志与资源目录
    ///
    /// # 参数
    /// - `source`: 词典适配器
    /// - `dir`: 词典数据目录（`words.txt`、`audio/`、`pic/` 所在目录）
    /// - `client`: 下载资源使用的 HTTP 客户端
    ///
    /// # 返回
    /// 日志损坏时返回错误，调用方应中止启动
    pub fn open(source: S, dir: &Path, client: Client, options: ResolveOptions) -> AppResult<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::create_dir_failed(dir.display().to_string(), e))?;

        let log = EntryLog::open(dir.join(LOG_FILE_NAME))?;
        let audio_store = AssetStore::new(dir.join(AUDIO_DIR_NAME), client.clone())?;
        let picture_store = AssetStore::new(dir.join(PICTURE_DIR_NAME), client)?;

        Ok(Self {
            source,
            log,
            audio_store,
            picture_store,
            failure_writer: AssetFailureWriter::in_dir(dir),
            options,
        })
    }

    pub fn dictionary(&self) -> Dictionary {
        self.source.dictionary()
    }

    /// 底层日志（只读）
    pub fn log(&self) -> &EntryLog {
        &self.log
    }

    #[cfg(test)]
    pub(crate) fn log_mut(&mut self) -> &mut EntryLog {
        &mut self.log
    }

    /// 解析一个关键词
    ///
    /// # 返回
    /// - `Ok(Resolution)`: 命中、不存在或离线未命中
    /// - `Err(Transient)`: 本次失败，未写日志
    /// - `Err(Durability)`: 日志写入失败，必须中止
    pub async fn resolve(&mut self, ctx: &WordCtx) -> Result<Resolution, ResolveError> {
        let dict = self.source.dictionary();
        let keyword = ctx.keyword.as_str();

        let cached_entry = match self.log.lookup(keyword) {
            IndexLookup::Tombstone => {
                debug!("{} [{}] 墓碑命中，跳过查询", ctx, dict);
                return Ok(Resolution::not_found(LookupState::TombstoneHit, true));
            }
            IndexLookup::Hit(entry) => Some(entry.clone()),
            IndexLookup::Missing => None,
        };

        let (state, entry) = match cached_entry {
            Some(entry) => {
                debug!("{} [{}] 缓存命中: {}", ctx, dict, entry.identity());
                (LookupState::CacheHit, entry)
            }
            None if !self.options.query_online => {
                debug!("{} [{}] 离线模式，未命中", ctx, dict);
                return Ok(Resolution::not_found(LookupState::Offline, true));
            }
            None => match self.source.lookup(keyword).await {
                Ok(mut entry) => {
                    // 以提交的拼写为准，重放后同一个关键词仍能命中
                    entry.keyword = keyword.to_string();
                    self.log.append(keyword, &entry)?;
                    info!("{} [{}] ✓ 查询成功: {}", ctx, dict, entry.identity());
                    (LookupState::FreshHit, entry)
                }
                Err(LookupError::NotFound) => {
                    self.log.append_tombstone(keyword)?;
                    info!("{} [{}] ✗ 未收录，已记录", ctx, dict);
                    return Ok(Resolution::not_found(LookupState::FreshMiss, false));
                }
                Err(e) => {
                    warn!("{} [{}] ⚠️ 查询失败（下次重试）: {}", ctx, dict, e);
                    return Err(ResolveError::Transient(e));
                }
            },
        };

        let mut resolution = Resolution {
            state,
            cached: state != LookupState::FreshHit,
            entry: None,
            assets_downloaded: 0,
            asset_failures: Vec::new(),
        };
        if self.options.download_assets {
            self.fetch_assets(ctx, &entry, &mut resolution).await;
        }
        resolution.entry = Some(entry);
        Ok(resolution)
    }

    /// 下载词条引用的全部资源；失败只记录，不中断
    async fn fetch_assets(&self, ctx: &WordCtx, entry: &Entry, resolution: &mut Resolution) {
        let jobs = entry
            .audio
            .iter()
            .map(|url| (&self.audio_store, url))
            .chain(entry.pictures.iter().map(|url| (&self.picture_store, url)));

        for (store, url) in jobs {
            match store.fetch(url).await {
                Ok(FetchOutcome::Downloaded { .. }) => {
                    resolution.cached = false;
                    resolution.assets_downloaded += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    resolution.cached = false;
                    self.record_failure(ctx, url, &e).await;
                    resolution.asset_failures.push(AssetFailure {
                        url: url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    async fn record_failure(&self, ctx: &WordCtx, url: &str, err: &AssetError) {
        warn!("{} [{}] ⚠️ 资源下载失败 {}: {}", ctx, self.source.dictionary(), url, err);
        if let Err(e) = self
            .failure_writer
            .write(&ctx.keyword, url, &err.to_string())
            .await
        {
            warn!("无法写入 {}: {}", self.failure_writer.path().display(), e);
        }
    }
}
