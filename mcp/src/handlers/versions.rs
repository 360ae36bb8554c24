//! Version lookup handlers: latest stable and bounded history listing

use crate::context::ToolContext;
use crate::error::{McpError, Result};
use pubdex_model::validate;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// `take` default and clamp bounds for `list_versions`
const DEFAULT_TAKE: usize = 50;
const MAX_TAKE: usize = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestVersionParams {
    pub package: String,
}

pub async fn handle_latest_version(
    ctx: &ToolContext,
    params: LatestVersionParams,
    cancel: &CancellationToken,
) -> Result<Value> {
    validate::package_name(&params.package)
        .map_err(|e| McpError::invalid_param("package", e.to_string()))?;

    info!(package = %params.package, "looking up latest version");

    let latest = ctx.registry.latest_version(&params.package, cancel).await?;
    Ok(json!({
        "package": params.package,
        "latest": latest,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVersionsParams {
    pub package: String,
    #[serde(default)]
    pub take: Option<usize>,
    #[serde(default)]
    pub include_prerelease: bool,
}

pub async fn handle_list_versions(
    ctx: &ToolContext,
    params: ListVersionsParams,
    cancel: &CancellationToken,
) -> Result<Value> {
    validate::package_name(&params.package)
        .map_err(|e| McpError::invalid_param("package", e.to_string()))?;

    let take = params.take.unwrap_or(DEFAULT_TAKE).clamp(1, MAX_TAKE);

    info!(package = %params.package, take, "listing version history");

    let history = ctx.registry.version_history(&params.package, cancel).await?;
    let versions: Vec<_> = history
        .into_iter()
        .filter(|v| params.include_prerelease || !v.is_prerelease())
        .take(take)
        .collect();

    Ok(json!({
        "package": params.package,
        "count": versions.len(),
        "versions": versions,
    }))
}
