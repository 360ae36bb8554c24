//! Package search handler

use crate::context::ToolContext;
use crate::error::{McpError, Result};
use pubdex_model::{validate, VersionConstraint};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub query: String,
    #[serde(default)]
    pub include_prerelease: bool,
    #[serde(default)]
    pub sdk_constraint: Option<String>,
}

pub async fn handle_search(
    ctx: &ToolContext,
    params: SearchParams,
    cancel: &CancellationToken,
) -> Result<Value> {
    let query = validate::query(&params.query)
        .map_err(|e| McpError::invalid_param("query", e.to_string()))?;

    if let Some(expr) = &params.sdk_constraint {
        VersionConstraint::parse(expr)
            .map_err(|_| McpError::invalid_param("sdkConstraint", "not a valid constraint"))?;
    }

    info!(query = %query, include_prerelease = params.include_prerelease, "searching packages");

    let result = ctx
        .registry
        .search(
            &query,
            params.include_prerelease,
            params.sdk_constraint.as_deref(),
            cancel,
        )
        .await?;

    Ok(serde_json::to_value(result)?)
}
