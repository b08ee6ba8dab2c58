pub mod cache_orchestrator;
pub mod word_ctx;

pub use cache_orchestrator::{
    AssetFailure, CacheOrchestrator, LookupState, Resolution, ResolveError, ResolveOptions,
};
pub use word_ctx::WordCtx;
