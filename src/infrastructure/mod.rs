//! 基础设施层
//!
//! 持有稀缺资源（日志文件、资源目录、HTTP 连接池），只暴露能力，不认识流程

pub mod asset_store;
pub mod entry_log;
pub mod http;

pub use asset_store::{AssetError, AssetStore, FetchOutcome};
pub use entry_log::{EntryLog, EntryLogError, IndexLookup, LogRecord};
pub use http::build_client;
