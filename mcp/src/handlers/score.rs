//! Score insight handler, memoized through the score cache

use crate::context::ToolContext;
use crate::error::{McpError, Result};
use pubdex_model::{validate, ScoreInsight};
use pubdex_registry::MemoCache;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreParams {
    pub package: String,
}

pub async fn handle_score_insights(
    ctx: &ToolContext,
    params: ScoreParams,
    cancel: &CancellationToken,
) -> Result<Value> {
    validate::package_name(&params.package)
        .map_err(|e| McpError::invalid_param("package", e.to_string()))?;

    info!(package = %params.package, "aggregating score insights");

    let key = MemoCache::<ScoreInsight>::score_key(&params.package);
    let registry = ctx.registry.clone();
    let package = params.package.clone();

    let insight = ctx
        .score_cache
        .get_or_try_insert(&key, || async move { registry.score(&package, cancel).await })
        .await
        .map_err(McpError::from)?;

    Ok(serde_json::to_value(insight)?)
}
