//! Package details and publisher listing handlers

use crate::context::ToolContext;
use crate::error::{McpError, Result};
use pubdex_model::validate;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDetailsParams {
    pub package: String,
}

pub async fn handle_package_details(
    ctx: &ToolContext,
    params: PackageDetailsParams,
    cancel: &CancellationToken,
) -> Result<Value> {
    validate::package_name(&params.package)
        .map_err(|e| McpError::invalid_param("package", e.to_string()))?;

    info!(package = %params.package, "fetching package details");

    let details = ctx.registry.package_details(&params.package, cancel).await?;
    Ok(serde_json::to_value(details)?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherPackagesParams {
    pub publisher: String,
}

pub async fn handle_publisher_packages(
    ctx: &ToolContext,
    params: PublisherPackagesParams,
    cancel: &CancellationToken,
) -> Result<Value> {
    validate::publisher_id(&params.publisher)
        .map_err(|e| McpError::invalid_param("publisher", e.to_string()))?;

    info!(publisher = %params.publisher, "listing publisher packages");

    let packages = ctx
        .registry
        .publisher_packages(&params.publisher, cancel)
        .await?;

    Ok(json!({
        "publisher": params.publisher,
        "count": packages.len(),
        "packages": packages,
    }))
}
