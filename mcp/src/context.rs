//! Shared execution context for tool handlers

use pubdex_config::Settings;
use pubdex_model::{DependencyGraph, ScoreInsight};
use pubdex_registry::{MemoCache, RegistryOps};
use std::sync::Arc;
use std::time::Duration;

/// Memoized results stay valid this long
const CACHE_TTL: Duration = Duration::from_secs(600);

/// Process-wide state handed to every tool execution: the registry client
/// and the two memo caches. Only score insights and dependency graphs are
/// cached; everything else goes straight upstream.
pub struct ToolContext {
    pub registry: Arc<dyn RegistryOps>,
    pub score_cache: MemoCache<ScoreInsight>,
    pub graph_cache: MemoCache<DependencyGraph>,
    pub settings: Settings,
}

impl ToolContext {
    pub fn new(registry: Arc<dyn RegistryOps>, settings: Settings) -> Self {
        Self {
            registry,
            score_cache: MemoCache::new(CACHE_TTL),
            graph_cache: MemoCache::new(CACHE_TTL),
            settings,
        }
    }
}
