//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责单词流处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 单词流处理器
//! - 管理应用生命周期（初始化、运行、统计）
//! - 逐个读取单词，决定是否节流
//! - 写运行日志与导出文件
//!
//! ### `word_processor` - 单个单词处理器
//! - 按优先级依次调用每个词典的 CacheOrchestrator
//! - 收集词条，判定单词是否"免费"
//!
//! ### `merge` / `pacing`
//! - 合并多个词典的词条
//! - 单词间的等待策略
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理单词流)
//!     ↓
//! word_processor (处理一个单词 × N 个词典)
//!     ↓
//! workflow::CacheOrchestrator (处理一个单词 × 一个词典)
//!     ↓
//! services (能力层：词典适配器 / 失败记录 / 导出)
//!     ↓
//! infrastructure (基础设施：EntryLog / AssetStore / HTTP)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管整个流，word_processor 管单个单词
//! 2. **严格顺序**：一个单词全部处理完才开始下一个，不并发访问网络
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure

pub mod batch_processor;
pub mod merge;
pub mod pacing;
pub mod word_processor;

// 重新导出主要类型
pub use batch_processor::{process_stream, App, RunStats, StreamFailure};
pub use merge::MergedRecord;
pub use pacing::{Pacer, Pacing};
pub use word_processor::{MultiSourceCoordinator, SourceReport, WordOutcome};
