//! Dependency graph value objects

use crate::error::{ModelError, Result};
use crate::validate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One resolved dependency in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDependencyNode", rename_all = "camelCase")]
pub struct DependencyNode {
    package: String,
    requested: String,
    resolved: String,
    is_direct: bool,
    children: Vec<DependencyNode>,
}

impl DependencyNode {
    pub fn new(
        package: impl Into<String>,
        requested: impl Into<String>,
        resolved: impl Into<String>,
        is_direct: bool,
        children: Vec<DependencyNode>,
    ) -> Result<Self> {
        let package = package.into();
        validate::package_name(&package)?;

        Ok(Self {
            package,
            requested: requested.into(),
            resolved: resolved.into(),
            is_direct,
            children,
        })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// The constraint the parent declared.
    pub fn requested(&self) -> &str {
        &self.requested
    }

    /// The concrete version resolution picked.
    pub fn resolved(&self) -> &str {
        &self.resolved
    }

    pub fn is_direct(&self) -> bool {
        self.is_direct
    }

    pub fn children(&self) -> &[DependencyNode] {
        &self.children
    }

    /// Check that no `(package, resolved)` pair repeats along any path from
    /// this node down.
    fn check_acyclic(&self, path: &mut HashSet<(String, String)>) -> Result<()> {
        let key = (self.package.clone(), self.resolved.clone());
        if !path.insert(key.clone()) {
            return Err(ModelError::invalid(
                "nodes",
                format!("{}@{} repeats on its own path", self.package, self.resolved),
            ));
        }
        for child in &self.children {
            child.check_acyclic(path)?;
        }
        path.remove(&key);
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDependencyNode {
    package: String,
    #[serde(default)]
    requested: String,
    #[serde(default)]
    resolved: String,
    #[serde(default)]
    is_direct: bool,
    #[serde(default)]
    children: Vec<RawDependencyNode>,
}

impl TryFrom<RawDependencyNode> for DependencyNode {
    type Error = ModelError;

    fn try_from(raw: RawDependencyNode) -> Result<Self> {
        let children = raw
            .children
            .into_iter()
            .map(DependencyNode::try_from)
            .collect::<Result<Vec<_>>>()?;
        DependencyNode::new(
            raw.package,
            raw.requested,
            raw.resolved,
            raw.is_direct,
            children,
        )
    }
}

/// A single-rooted dependency graph with resolution issues attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDependencyGraph", rename_all = "camelCase")]
pub struct DependencyGraph {
    root_package: String,
    root_version: String,
    nodes: Vec<DependencyNode>,
    issues: Vec<String>,
}

impl DependencyGraph {
    pub fn new(
        root_package: impl Into<String>,
        root_version: impl Into<String>,
        nodes: Vec<DependencyNode>,
        issues: Vec<String>,
    ) -> Result<Self> {
        let root_package = root_package.into();
        validate::package_name(&root_package)?;
        if nodes.is_empty() {
            return Err(ModelError::invalid("nodes", "graph carries at least one node"));
        }
        for node in &nodes {
            node.check_acyclic(&mut HashSet::new())?;
        }

        Ok(Self {
            root_package,
            root_version: root_version.into(),
            nodes,
            issues,
        })
    }

    pub fn root_package(&self) -> &str {
        &self.root_package
    }

    pub fn root_version(&self) -> &str {
        &self.root_version
    }

    pub fn nodes(&self) -> &[DependencyNode] {
        &self.nodes
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDependencyGraph {
    root_package: String,
    #[serde(default)]
    root_version: String,
    nodes: Vec<DependencyNode>,
    #[serde(default)]
    issues: Vec<String>,
}

impl TryFrom<RawDependencyGraph> for DependencyGraph {
    type Error = ModelError;

    fn try_from(raw: RawDependencyGraph) -> Result<Self> {
        DependencyGraph::new(raw.root_package, raw.root_version, raw.nodes, raw.issues)
    }
}
