//! SDK compatibility handler and solver
//!
//! The solver probes a bounded window of the newest versions against the
//! declared SDK constraint of each, preferring stable releases and falling
//! back to prereleases before reporting incompatibility.

use crate::context::ToolContext;
use crate::error::{McpError, Result};
use pubdex_model::{CompatibilityRequest, CompatibilityResult, VersionDetail};
use pubdex_registry::RegistryError;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Newest versions considered per evaluation, bounded for latency and
/// determinism
const EVALUATION_WINDOW: usize = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityParams {
    pub package: String,
    pub flutter_sdk: String,
    #[serde(default)]
    pub project_constraint: Option<String>,
}

pub async fn handle_check_compatibility(
    ctx: &ToolContext,
    params: CompatibilityParams,
    cancel: &CancellationToken,
) -> Result<Value> {
    let request = CompatibilityRequest::new(
        params.package,
        params.flutter_sdk,
        params.project_constraint,
    )?;

    info!(
        package = %request.package(),
        sdk = %request.flutter_sdk(),
        probe = %request.probe(),
        "evaluating compatibility"
    );

    let history = ctx.registry.version_history(request.package(), cancel).await?;
    let result = solve(request, &history)?;
    Ok(serde_json::to_value(result)?)
}

/// Evaluate a compatibility request against a release-descending history.
pub fn solve(
    request: CompatibilityRequest,
    history: &[VersionDetail],
) -> Result<CompatibilityResult> {
    let window: Vec<VersionDetail> = history.iter().take(EVALUATION_WINDOW).cloned().collect();
    if window.is_empty() {
        return Err(McpError::Registry(RegistryError::NotFound(format!(
            "package '{}' has no versions",
            request.package()
        ))));
    }

    let probe = request.probe().clone();
    let pick = |allow_prerelease: bool| {
        window
            .iter()
            .filter(|v| v.sdk().matches(&probe))
            .filter(|v| request.project().map_or(true, |c| c.matches(v.parsed())))
            .filter(|v| allow_prerelease || !v.is_prerelease())
            .max_by(|a, b| {
                a.released()
                    .cmp(&b.released())
                    .then_with(|| a.parsed().cmp(b.parsed()))
            })
            .cloned()
    };

    let project_suffix = request
        .project_constraint()
        .map(|c| format!(" and project constraint {c}"))
        .unwrap_or_default();

    if let Some(best) = pick(false) {
        let explanation = format!(
            "Version {} of {} supports SDK {}{}.",
            best.version(),
            request.package(),
            probe,
            project_suffix
        );
        return Ok(CompatibilityResult::new(
            request,
            Some(best),
            true,
            explanation,
            window,
        )?);
    }

    if let Some(best) = pick(true) {
        let explanation = format!(
            "No stable version of {} supports SDK {}{}; falling back to prerelease {}.",
            request.package(),
            probe,
            project_suffix,
            best.version()
        );
        return Ok(CompatibilityResult::new(
            request,
            Some(best),
            true,
            explanation,
            window,
        )?);
    }

    let explanation = format!(
        "Evaluated {} versions of {}; none support SDK {}{}.",
        window.len(),
        request.package(),
        probe,
        project_suffix
    );
    Ok(CompatibilityResult::new(
        request,
        None,
        false,
        explanation,
        window,
    )?)
}
