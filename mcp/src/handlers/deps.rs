//! Dependency graph inspection
//!
//! Depth-first graph construction over the registry with a depth cap,
//! path-based cycle detection, and per-child failure isolation: one
//! unresolvable branch becomes an issue, never a failed graph.

use crate::context::ToolContext;
use crate::error::{McpError, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use pubdex_model::{validate, DependencyGraph, DependencyNode, VersionConstraint, VersionDetail};
use pubdex_registry::{DeclaredDependency, MemoCache, RegistryError};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Maximum traversal depth below the root
const MAX_DEPTH: usize = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyInspectorParams {
    pub package: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub include_dev_dependencies: bool,
}

pub async fn handle_dependency_inspector(
    ctx: &ToolContext,
    params: DependencyInspectorParams,
    cancel: &CancellationToken,
) -> Result<Value> {
    validate::package_name(&params.package)
        .map_err(|e| McpError::invalid_param("package", e.to_string()))?;

    let version = params.version.unwrap_or_default();

    info!(
        package = %params.package,
        version = %version,
        include_dev = params.include_dev_dependencies,
        "inspecting dependency graph"
    );

    let cache_version = if version.is_empty() { "latest" } else { &version };
    let key = MemoCache::<DependencyGraph>::deps_key(
        &params.package,
        cache_version,
        params.include_dev_dependencies,
    );

    let graph = ctx
        .graph_cache
        .get_or_try_insert(&key, || {
            build_graph(
                ctx,
                &params.package,
                &version,
                params.include_dev_dependencies,
                cancel,
            )
        })
        .await?;

    Ok(serde_json::to_value(graph)?)
}

/// Build the graph rooted at `package`. Dev dependencies participate only at
/// the root and only when requested.
pub async fn build_graph(
    ctx: &ToolContext,
    package: &str,
    version: &str,
    include_dev: bool,
    cancel: &CancellationToken,
) -> Result<DependencyGraph> {
    let root = ctx
        .registry
        .inspect_dependencies(package, version, include_dev, cancel)
        .await?;

    let mut issues = Vec::new();
    let mut path = HashSet::new();
    path.insert((package.to_string(), root.version.clone()));

    let mut children = Vec::new();
    for dep in root.dependencies.iter().chain(root.dev_dependencies.iter()) {
        if let Some(node) =
            walk(ctx, dep.clone(), 1, &mut path, &mut issues, cancel).await?
        {
            children.push(node);
        }
    }

    let requested = if version.is_empty() { "any" } else { version };
    let root_node = DependencyNode::new(package, requested, &root.version, true, children)
        .map_err(|e| McpError::Internal(e.to_string()))?;

    DependencyGraph::new(package, &root.version, vec![root_node], issues)
        .map_err(|e| McpError::Internal(e.to_string()))
}

fn walk<'a>(
    ctx: &'a ToolContext,
    dep: DeclaredDependency,
    depth: usize,
    path: &'a mut HashSet<(String, String)>,
    issues: &'a mut Vec<String>,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, Result<Option<DependencyNode>>> {
    async move {
        if cancel.is_cancelled() {
            return Err(McpError::Cancelled);
        }

        // Pubspec maps can declare sdk/git entries under names this server
        // cannot address; they become issues, not failed graphs.
        if validate::package_name(&dep.name).is_err() {
            issues.push(resolve_failure(&dep, "not an addressable package name"));
            return Ok(None);
        }

        if depth > MAX_DEPTH {
            issues.push(format!(
                "Dependency depth exceeded limit for {} ({})",
                dep.name, dep.constraint
            ));
            return Ok(Some(node(&dep, "", depth, vec![])?));
        }

        let history = match ctx.registry.version_history(&dep.name, cancel).await {
            Ok(history) => history,
            Err(RegistryError::Cancelled) => return Err(McpError::Cancelled),
            Err(e) => {
                issues.push(resolve_failure(&dep, &e.to_string()));
                return Ok(None);
            }
        };

        let Some(resolved) = resolve_version(&dep.constraint, &history) else {
            issues.push(resolve_failure(&dep, "no version satisfies the constraint"));
            return Ok(None);
        };
        let resolved = resolved.version().to_string();

        let key = (dep.name.clone(), resolved.clone());
        if path.contains(&key) {
            // Re-entry: materializing the node would repeat the
            // (package, version) pair on this path.
            issues.push(format!(
                "Detected circular dependency at {}@{}",
                dep.name, resolved
            ));
            return Ok(None);
        }

        path.insert(key.clone());
        let mut children = Vec::new();
        match ctx
            .registry
            .inspect_dependencies(&dep.name, &resolved, false, cancel)
            .await
        {
            Ok(meta) => {
                for child in meta.dependencies {
                    match walk(ctx, child, depth + 1, path, issues, cancel).await {
                        Ok(Some(child_node)) => children.push(child_node),
                        Ok(None) => {}
                        Err(e) => {
                            path.remove(&key);
                            return Err(e);
                        }
                    }
                }
            }
            Err(RegistryError::Cancelled) => {
                path.remove(&key);
                return Err(McpError::Cancelled);
            }
            Err(e) => issues.push(resolve_failure(&dep, &e.to_string())),
        }
        path.remove(&key);

        Ok(Some(node(&dep, &resolved, depth, children)?))
    }
    .boxed()
}

fn node(
    dep: &DeclaredDependency,
    resolved: &str,
    depth: usize,
    children: Vec<DependencyNode>,
) -> Result<DependencyNode> {
    DependencyNode::new(&dep.name, &dep.constraint, resolved, depth == 1, children)
        .map_err(|e| McpError::Internal(e.to_string()))
}

fn resolve_failure(dep: &DeclaredDependency, reason: &str) -> String {
    format!(
        "Failed to resolve dependency '{}' ({}): {}",
        dep.name, dep.constraint, reason
    )
}

/// Pick the newest version (parsed semver descending) satisfying the
/// constraint; an unparseable or `any` constraint takes the latest stable,
/// falling back to the latest overall.
fn resolve_version<'h>(
    constraint: &str,
    history: &'h [VersionDetail],
) -> Option<&'h VersionDetail> {
    match VersionConstraint::parse(constraint) {
        Ok(parsed) if !parsed.is_any() => history
            .iter()
            .filter(|v| parsed.matches(v.parsed()))
            .max_by(|a, b| a.parsed().cmp(b.parsed())),
        _ => history
            .iter()
            .find(|v| !v.is_prerelease())
            .or_else(|| history.first()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn detail(version: &str, prerelease: bool) -> VersionDetail {
        VersionDetail::new(
            version,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            "any",
            prerelease,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_picks_newest_satisfying() {
        let history = vec![
            detail("2.0.0", false),
            detail("1.9.0", false),
            detail("1.2.0", false),
        ];
        let resolved = resolve_version("^1.0.0", &history).unwrap();
        assert_eq!(resolved.version(), "1.9.0");
    }

    #[test]
    fn test_resolve_any_prefers_stable() {
        let history = vec![detail("2.0.0-beta.1", true), detail("1.9.0", false)];
        assert_eq!(resolve_version("any", &history).unwrap().version(), "1.9.0");
    }

    #[test]
    fn test_resolve_unparseable_falls_back_to_latest() {
        let history = vec![detail("2.0.0-beta.1", true)];
        assert_eq!(
            resolve_version("{sdk: flutter}", &history).unwrap().version(),
            "2.0.0-beta.1"
        );
    }

    #[test]
    fn test_resolve_none_when_nothing_satisfies() {
        let history = vec![detail("1.0.0", false)];
        assert!(resolve_version(">=2.0.0", &history).is_none());
    }
}
