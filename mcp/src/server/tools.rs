//! Tool descriptor table
//!
//! All eight tools are declared once, statically: name, description, JSON
//! input schema, and an executor that binds the concrete params type,
//! validates, runs the handler, and returns the JSON response.

use crate::context::ToolContext;
use crate::error::{McpError, Result};
use crate::handlers::{compat, deps, details, score, search, versions};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

type ToolRun =
    for<'a> fn(&'a ToolContext, Value, &'a CancellationToken) -> BoxFuture<'a, Result<Value>>;

/// One tool's registration entry
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    run: ToolRun,
}

impl ToolDescriptor {
    /// Bind params, validate, execute, and encode.
    pub async fn execute(
        &self,
        ctx: &ToolContext,
        params: Value,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        (self.run)(ctx, params, cancel).await
    }
}

/// Name → descriptor table, built once at startup
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: vec![
                search_packages(),
                latest_version(),
                check_compatibility(),
                list_versions(),
                package_details(),
                publisher_packages(),
                score_insights(),
                dependency_inspector(),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn bind<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_json::from_value(params).map_err(|e| McpError::invalid_param("params", e.to_string()))
}

fn run_search<'a>(
    ctx: &'a ToolContext,
    params: Value,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, Result<Value>> {
    async move { search::handle_search(ctx, bind(params)?, cancel).await }.boxed()
}

fn run_latest_version<'a>(
    ctx: &'a ToolContext,
    params: Value,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, Result<Value>> {
    async move { versions::handle_latest_version(ctx, bind(params)?, cancel).await }.boxed()
}

fn run_check_compatibility<'a>(
    ctx: &'a ToolContext,
    params: Value,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, Result<Value>> {
    async move { compat::handle_check_compatibility(ctx, bind(params)?, cancel).await }.boxed()
}

fn run_list_versions<'a>(
    ctx: &'a ToolContext,
    params: Value,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, Result<Value>> {
    async move { versions::handle_list_versions(ctx, bind(params)?, cancel).await }.boxed()
}

fn run_package_details<'a>(
    ctx: &'a ToolContext,
    params: Value,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, Result<Value>> {
    async move { details::handle_package_details(ctx, bind(params)?, cancel).await }.boxed()
}

fn run_publisher_packages<'a>(
    ctx: &'a ToolContext,
    params: Value,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, Result<Value>> {
    async move { details::handle_publisher_packages(ctx, bind(params)?, cancel).await }.boxed()
}

fn run_score_insights<'a>(
    ctx: &'a ToolContext,
    params: Value,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, Result<Value>> {
    async move { score::handle_score_insights(ctx, bind(params)?, cancel).await }.boxed()
}

fn run_dependency_inspector<'a>(
    ctx: &'a ToolContext,
    params: Value,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, Result<Value>> {
    async move { deps::handle_dependency_inspector(ctx, bind(params)?, cancel).await }.boxed()
}

fn package_property() -> Value {
    json!({
        "type": "string",
        "description": "Package name (lowercase letters, digits, underscores)",
        "pattern": "^[a-z0-9_]+$"
    })
}

fn search_packages() -> ToolDescriptor {
    ToolDescriptor {
        name: "search_packages",
        description: "Search pub.dev for packages matching a query. Returns at \
            most ten results in relevance order with scoring data attached.",
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query, at most 80 characters",
                    "minLength": 1,
                    "maxLength": 80
                },
                "includePrerelease": {
                    "type": "boolean",
                    "description": "Consider prerelease versions when reporting the latest version",
                    "default": false
                },
                "sdkConstraint": {
                    "type": "string",
                    "description": "Drop packages whose latest release does not admit this SDK constraint"
                }
            },
            "required": ["query"]
        }),
        run: run_search,
    }
}

fn latest_version() -> ToolDescriptor {
    ToolDescriptor {
        name: "latest_version",
        description: "Look up the latest stable version of a package. The \
            release-notes link points at the declared changelog, falling back \
            to the issue tracker when no changelog is declared.",
        input_schema: json!({
            "type": "object",
            "properties": { "package": package_property() },
            "required": ["package"]
        }),
        run: run_latest_version,
    }
}

fn check_compatibility() -> ToolDescriptor {
    ToolDescriptor {
        name: "check_compatibility",
        description: "Evaluate which version of a package supports a given \
            Flutter SDK, optionally narrowed by the project's own version \
            constraint. A constraint expression probes at its lower bound.",
        input_schema: json!({
            "type": "object",
            "properties": {
                "package": package_property(),
                "flutterSdk": {
                    "type": "string",
                    "description": "Exact SDK version (3.24.0) or constraint (^3.13.0, >=3.13.0 <4.0.0)"
                },
                "projectConstraint": {
                    "type": "string",
                    "description": "Version range the project already declares for this package"
                }
            },
            "required": ["package", "flutterSdk"]
        }),
        run: run_check_compatibility,
    }
}

fn list_versions() -> ToolDescriptor {
    ToolDescriptor {
        name: "list_versions",
        description: "List a package's version history, newest first. \
            Release-notes links fall back to the issue tracker when no \
            changelog is declared.",
        input_schema: json!({
            "type": "object",
            "properties": {
                "package": package_property(),
                "take": {
                    "type": "integer",
                    "description": "Maximum versions returned, clamped to [1, 200]",
                    "default": 50
                },
                "includePrerelease": {
                    "type": "boolean",
                    "description": "Include prerelease versions",
                    "default": false
                }
            },
            "required": ["package"]
        }),
        run: run_list_versions,
    }
}

fn package_details() -> ToolDescriptor {
    ToolDescriptor {
        name: "package_details",
        description: "Fetch full metadata for a package: description, \
            publisher, project links, topics, and the latest stable release.",
        input_schema: json!({
            "type": "object",
            "properties": { "package": package_property() },
            "required": ["package"]
        }),
        run: run_package_details,
    }
}

fn publisher_packages() -> ToolDescriptor {
    ToolDescriptor {
        name: "publisher_packages",
        description: "List the packages belonging to a pub.dev publisher.",
        input_schema: json!({
            "type": "object",
            "properties": {
                "publisher": {
                    "type": "string",
                    "description": "Publisher id, e.g. dart.dev",
                    "pattern": "^[a-z0-9._-]+$"
                }
            },
            "required": ["publisher"]
        }),
        run: run_publisher_packages,
    }
}

fn score_insights() -> ToolDescriptor {
    ToolDescriptor {
        name: "score_insights",
        description: "Aggregate a package's pub.dev scoring: overall score, \
            popularity, likes, pub points, and per-component notes.",
        input_schema: json!({
            "type": "object",
            "properties": { "package": package_property() },
            "required": ["package"]
        }),
        run: run_score_insights,
    }
}

fn dependency_inspector() -> ToolDescriptor {
    ToolDescriptor {
        name: "dependency_inspector",
        description: "Resolve and walk a package's dependency graph to a \
            bounded depth, reporting cycles and unresolvable branches as \
            issues instead of failures.",
        input_schema: json!({
            "type": "object",
            "properties": {
                "package": package_property(),
                "version": {
                    "type": "string",
                    "description": "Concrete version to inspect; latest stable when omitted"
                },
                "includeDevDependencies": {
                    "type": "boolean",
                    "description": "Also walk dev dependencies of the root package",
                    "default": false
                }
            },
            "required": ["package"]
        }),
        run: run_dependency_inspector,
    }
}
