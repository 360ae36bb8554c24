//! End-to-end tool behavior through the pipeline against a fake registry

mod common;

use common::{http_fixture, server_with, summary, version, FakeRegistry};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

async fn call_tool(server: &pubdex_mcp::McpServer, method: &str, params: Value) -> Value {
    let payload = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params});
    server
        .handle_payload(&payload.to_string(), &CancellationToken::new())
        .await
        .unwrap()
}

fn result(response: &Value) -> &Value {
    assert!(
        response["error"].is_null(),
        "unexpected error: {}",
        response["error"]
    );
    &response["result"]
}

#[tokio::test]
async fn test_search_truncates_and_hints() {
    let registry = Arc::new(FakeRegistry::new());
    registry.set_search_hits((0..15).map(|i| summary(&format!("pkg{i}"))).collect());
    let server = server_with(registry);

    let response = call_tool(&server, "search_packages", json!({"query": "http client"})).await;
    let result = result(&response);

    let packages = result["packages"].as_array().unwrap();
    assert_eq!(packages.len(), 10);
    assert_eq!(packages[0]["name"], "pkg0");
    assert_eq!(packages[9]["name"], "pkg9");
    assert!(result["moreResultsHint"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn test_latest_version_excludes_prerelease() {
    let server = server_with(http_fixture());

    let response = call_tool(&server, "latest_version", json!({"package": "http"})).await;
    let latest = &result(&response)["latest"];

    assert_eq!(latest["version"], "1.2.1");
    assert_eq!(latest["isPrerelease"], false);
}

#[tokio::test]
async fn test_compatibility_success_names_sdk() {
    let server = server_with(http_fixture());

    let response = call_tool(
        &server,
        "check_compatibility",
        json!({"package": "http", "flutterSdk": "3.24.0"}),
    )
    .await;
    let result = result(&response);

    assert_eq!(result["satisfies"], true);
    assert_eq!(result["recommendedVersion"]["version"], "1.2.1");
    assert!(result["explanation"].as_str().unwrap().contains("3.24.0"));
}

#[tokio::test]
async fn test_compatibility_failure_evaluates_versions() {
    let server = server_with(http_fixture());

    let response = call_tool(
        &server,
        "check_compatibility",
        json!({"package": "http", "flutterSdk": "2.0.0"}),
    )
    .await;
    let result = result(&response);

    assert_eq!(result["satisfies"], false);
    assert!(result["recommendedVersion"].is_null());
    assert!(!result["evaluatedVersions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_compatibility_project_constraint_applied() {
    let registry = Arc::new(FakeRegistry::new());
    registry.add_history(
        "http",
        vec![
            version("2.0.0", 0, ">=3.13.0 <4.0.0", false),
            version("1.2.1", 30, ">=3.13.0 <4.0.0", false),
        ],
    );
    let server = server_with(registry);

    let unconstrained = call_tool(
        &server,
        "check_compatibility",
        json!({"package": "http", "flutterSdk": "3.24.0"}),
    )
    .await;
    assert_eq!(
        unconstrained["result"]["recommendedVersion"]["version"],
        "2.0.0"
    );

    let constrained = call_tool(
        &server,
        "check_compatibility",
        json!({
            "package": "http",
            "flutterSdk": "3.24.0",
            "projectConstraint": ">=1.0.0 <2.0.0"
        }),
    )
    .await;
    assert_eq!(
        constrained["result"]["recommendedVersion"]["version"],
        "1.2.1"
    );
}

#[tokio::test]
async fn test_dependency_cycle_detected() {
    let registry = Arc::new(FakeRegistry::new());
    registry.add_history("a", vec![version("1.0.0", 0, "any", false)]);
    registry.add_history("b", vec![version("2.0.0", 0, "any", false)]);
    registry.add_deps("a", "1.0.0", &[("b", "^2.0.0")], &[]);
    registry.add_deps("b", "2.0.0", &[("a", "any")], &[]);
    let server = server_with(registry);

    let response = call_tool(&server, "dependency_inspector", json!({"package": "a"})).await;
    let graph = result(&response);

    let issues = graph["issues"].as_array().unwrap();
    assert!(issues
        .iter()
        .any(|i| i.as_str().unwrap() == "Detected circular dependency at a@1.0.0"));

    // One node per package: the edge closing the cycle is not materialized.
    let root = &graph["nodes"][0];
    assert_eq!(root["package"], "a");
    let b = &root["children"][0];
    assert_eq!(b["package"], "b");
    assert!(b["children"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_dependency_depth_cap() {
    let registry = Arc::new(FakeRegistry::new());
    for i in 0..=12 {
        let name = format!("p{i}");
        registry.add_history(&name, vec![version("1.0.0", 0, "any", false)]);
        if i < 12 {
            let child = format!("p{}", i + 1);
            registry.add_deps(&name, "1.0.0", &[(child.as_str(), "any")], &[]);
        }
    }
    let server = server_with(registry);

    let response = call_tool(&server, "dependency_inspector", json!({"package": "p0"})).await;
    let graph = result(&response);

    let issues = graph["issues"].as_array().unwrap();
    assert!(issues
        .iter()
        .any(|i| i.as_str().unwrap().starts_with("Dependency depth exceeded limit for p11")));
}

#[tokio::test]
async fn test_dependency_child_failure_isolated() {
    let registry = Arc::new(FakeRegistry::new());
    registry.add_history("root", vec![version("1.0.0", 0, "any", false)]);
    registry.add_history("good", vec![version("1.1.0", 0, "any", false)]);
    // "ghost" has no history: its branch must fail without sinking the graph.
    registry.add_deps(
        "root",
        "1.0.0",
        &[("ghost", "^1.0.0"), ("good", "any")],
        &[],
    );
    let server = server_with(registry);

    let response = call_tool(&server, "dependency_inspector", json!({"package": "root"})).await;
    let graph = result(&response);

    let issues = graph["issues"].as_array().unwrap();
    assert!(issues
        .iter()
        .any(|i| i.as_str().unwrap().starts_with("Failed to resolve dependency 'ghost' (^1.0.0)")));

    let children = graph["nodes"][0]["children"].as_array().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["package"], "good");
    assert_eq!(children[0]["resolved"], "1.1.0");
    assert_eq!(children[0]["isDirect"], true);
}

#[tokio::test]
async fn test_dev_dependencies_only_at_root_when_requested() {
    let registry = Arc::new(FakeRegistry::new());
    registry.add_history("root", vec![version("1.0.0", 0, "any", false)]);
    registry.add_history("runtime_dep", vec![version("1.0.0", 0, "any", false)]);
    registry.add_history("dev_dep", vec![version("1.0.0", 0, "any", false)]);
    registry.add_history("nested_dev", vec![version("1.0.0", 0, "any", false)]);
    registry.add_deps(
        "root",
        "1.0.0",
        &[("runtime_dep", "any")],
        &[("dev_dep", "any")],
    );
    // A dev dependency of a child must never be walked.
    registry.add_deps("runtime_dep", "1.0.0", &[], &[("nested_dev", "any")]);
    let server = server_with(registry);

    let with_dev = call_tool(
        &server,
        "dependency_inspector",
        json!({"package": "root", "includeDevDependencies": true}),
    )
    .await;
    let children = with_dev["result"]["nodes"][0]["children"].as_array().unwrap();
    let names: Vec<_> = children.iter().map(|c| c["package"].as_str().unwrap()).collect();
    // Dev dependencies come after runtime dependencies.
    assert_eq!(names, ["runtime_dep", "dev_dep"]);
    assert!(children[0]["children"].as_array().unwrap().is_empty());

    let without_dev = call_tool(
        &server,
        "dependency_inspector",
        json!({"package": "root"}),
    )
    .await;
    let children = without_dev["result"]["nodes"][0]["children"].as_array().unwrap();
    assert_eq!(children.len(), 1);
}

#[tokio::test]
async fn test_score_insights_cached_across_calls() {
    let registry = http_fixture();
    let server = server_with(registry.clone());

    for _ in 0..3 {
        let response = call_tool(&server, "score_insights", json!({"package": "http"})).await;
        let result = result(&response);
        assert_eq!(result["overallScore"], 130);
        let popularity = result["popularity"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&popularity));
    }

    assert_eq!(registry.score_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_list_versions_take_and_prerelease_filter() {
    let server = server_with(http_fixture());

    let response = call_tool(
        &server,
        "list_versions",
        json!({"package": "http", "take": 2, "includePrerelease": true}),
    )
    .await;
    let versions = result(&response)["versions"].as_array().unwrap().clone();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["version"], "1.3.0-beta.1");

    let response = call_tool(&server, "list_versions", json!({"package": "http"})).await;
    let versions = result(&response)["versions"].as_array().unwrap().clone();
    assert!(versions.iter().all(|v| v["isPrerelease"] == false));
}

#[tokio::test]
async fn test_package_details_shape() {
    let server = server_with(http_fixture());

    let response = call_tool(&server, "package_details", json!({"package": "http"})).await;
    let details = result(&response);

    assert_eq!(details["package"], "http");
    assert_eq!(details["publisher"], "dart.dev");
    assert_eq!(details["latestStable"]["version"], "1.2.1");
}

#[tokio::test]
async fn test_publisher_packages_validates_id() {
    let server = server_with(http_fixture());

    let response = call_tool(
        &server,
        "publisher_packages",
        json!({"publisher": "Dart Dev"}),
    )
    .await;
    assert_eq!(response["error"]["code"], -32602);
}

#[tokio::test]
async fn test_publisher_packages_lists() {
    let registry = Arc::new(FakeRegistry::new());
    registry.set_search_hits(vec![summary("http"), summary("path")]);
    let server = server_with(registry);

    let response = call_tool(
        &server,
        "publisher_packages",
        json!({"publisher": "dart.dev"}),
    )
    .await;
    let result = result(&response);

    assert_eq!(result["count"], 2);
    assert_eq!(result["packages"][0]["name"], "http");
}
