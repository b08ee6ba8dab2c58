//! # Word Downloader
//!
//! 从多个在线词典批量查询单词、下载发音与图片，并合并为一条记录的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（日志文件、资源目录、HTTP 连接池），只暴露能力
//! - `EntryLog` - 只追加的查询结果日志，启动时重放为内存索引
//! - `AssetStore` - 每个资源最多下载一次，临时文件 + 重命名
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个关键词
//! - `SourceAdapter` / `DictSource` - 词典查询能力（Collins / Webster / 海词 / 必应）
//! - `AssetFailureWriter` - 写 audio-error.txt 能力
//! - `ExportWriter` - 写合并结果能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个词典查一个单词"的完整流程
//! - `WordCtx` - 上下文封装（序号 + 关键词）
//! - `CacheOrchestrator` - 流程编排（索引 → 词典 → 日志 → 资源）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 单词流处理器，管理资源、节流与统计
//! - `orchestrator/word_processor` - 单个单词处理器，按优先级遍历词典
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{AssetStore, EntryLog};
pub use models::{Dictionary, Entry, WordStream};
pub use orchestrator::{App, MergedRecord, MultiSourceCoordinator, RunStats};
pub use services::{DictSource, LookupError, SourceAdapter};
pub use workflow::{CacheOrchestrator, LookupState, Resolution, WordCtx};
