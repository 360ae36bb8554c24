//! Shared test support: an in-memory registry and a server constructor

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use pubdex_config::Settings;
use pubdex_mcp::{McpServer, ServerConfig, ToolContext};
use pubdex_model::{
    PackageDetails, PackageSummary, ScoreInsight, SearchResultSet, VersionDetail,
};
use pubdex_registry::{
    DeclaredDependency, PackageDependencies, RegistryError, RegistryOps,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub fn release_time(days_ago: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() - Duration::days(days_ago)
}

pub fn version(v: &str, days_ago: i64, sdk: &str, prerelease: bool) -> VersionDetail {
    VersionDetail::new(v, release_time(days_ago), sdk, prerelease, None).unwrap()
}

pub fn summary(name: &str) -> PackageSummary {
    PackageSummary::new(name, format!("{name} package"), "dart.dev", 100, 130, 0.9, None)
        .unwrap()
}

/// In-memory registry: packages, dependencies, and scores are scripted per
/// test, and any operation can be forced to fail.
#[derive(Default)]
pub struct FakeRegistry {
    /// Version history per package, newest first
    pub histories: Mutex<HashMap<String, Vec<VersionDetail>>>,
    /// Declared dependencies keyed by (package, version)
    pub deps: Mutex<HashMap<(String, String), (Vec<DeclaredDependency>, Vec<DeclaredDependency>)>>,
    /// Search results returned for any query
    pub search_hits: Mutex<Vec<PackageSummary>>,
    /// When set, every operation fails with a clone of this error
    pub fail_with: Mutex<Option<RegistryError>>,
    /// Number of score fetches that reached the registry
    pub score_calls: AtomicU32,
    /// Delay injected into latest_version, for ordering tests
    pub latest_delay: Mutex<Option<std::time::Duration>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_history(&self, package: &str, history: Vec<VersionDetail>) {
        self.histories
            .lock()
            .unwrap()
            .insert(package.to_string(), history);
    }

    pub fn add_deps(
        &self,
        package: &str,
        version: &str,
        runtime: &[(&str, &str)],
        dev: &[(&str, &str)],
    ) {
        let declare = |list: &[(&str, &str)]| {
            list.iter()
                .map(|(name, constraint)| DeclaredDependency {
                    name: name.to_string(),
                    constraint: constraint.to_string(),
                })
                .collect()
        };
        self.deps.lock().unwrap().insert(
            (package.to_string(), version.to_string()),
            (declare(runtime), declare(dev)),
        );
    }

    pub fn set_search_hits(&self, hits: Vec<PackageSummary>) {
        *self.search_hits.lock().unwrap() = hits;
    }

    pub fn fail_all(&self, error: RegistryError) {
        *self.fail_with.lock().unwrap() = Some(error);
    }

    fn check_failure(&self) -> Result<(), RegistryError> {
        match &*self.fail_with.lock().unwrap() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn history(&self, package: &str) -> Result<Vec<VersionDetail>, RegistryError> {
        self.histories
            .lock()
            .unwrap()
            .get(package)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(format!("package '{package}'")))
    }
}

#[async_trait]
impl RegistryOps for FakeRegistry {
    async fn search(
        &self,
        query: &str,
        _include_prerelease: bool,
        _sdk_constraint: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SearchResultSet, RegistryError> {
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }
        self.check_failure()?;

        let hits = self.search_hits.lock().unwrap().clone();
        if hits.is_empty() {
            return Err(RegistryError::NotFound(format!(
                "no packages matched '{query}'"
            )));
        }
        let more = hits.len() > 10;
        let kept: Vec<_> = hits.into_iter().take(10).collect();
        SearchResultSet::new(query, kept, more.then(|| "More packages available…".to_string()))
            .map_err(|e| RegistryError::Decode(e.to_string()))
    }

    async fn latest_version(
        &self,
        package: &str,
        cancel: &CancellationToken,
    ) -> Result<VersionDetail, RegistryError> {
        let delay = *self.latest_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }
        self.check_failure()?;

        let history = self.history(package)?;
        history
            .iter()
            .find(|v| !v.is_prerelease())
            .or_else(|| history.first())
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(format!("package '{package}' has no versions")))
    }

    async fn version_history(
        &self,
        package: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<VersionDetail>, RegistryError> {
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }
        self.check_failure()?;
        self.history(package)
    }

    async fn package_details(
        &self,
        package: &str,
        cancel: &CancellationToken,
    ) -> Result<PackageDetails, RegistryError> {
        let latest = self.latest_version(package, cancel).await?;
        PackageDetails::new(
            package,
            format!("{package} package"),
            "dart.dev",
            None,
            None,
            None,
            latest,
            vec![],
        )
        .map_err(|e| RegistryError::Decode(e.to_string()))
    }

    async fn publisher_packages(
        &self,
        publisher: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<PackageSummary>, RegistryError> {
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }
        self.check_failure()?;
        if publisher == "ghost.dev" {
            return Err(RegistryError::NotFound(format!("publisher '{publisher}'")));
        }
        Ok(self.search_hits.lock().unwrap().clone())
    }

    async fn score(
        &self,
        package: &str,
        cancel: &CancellationToken,
    ) -> Result<ScoreInsight, RegistryError> {
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }
        self.check_failure()?;
        self.score_calls.fetch_add(1, Ordering::SeqCst);

        ScoreInsight::new(
            package,
            130,
            0.9,
            4200,
            130,
            vec![("popularity".to_string(), "top decile".to_string())],
            Utc::now(),
        )
        .map_err(|e| RegistryError::Decode(e.to_string()))
    }

    async fn inspect_dependencies(
        &self,
        package: &str,
        version: &str,
        include_dev: bool,
        cancel: &CancellationToken,
    ) -> Result<PackageDependencies, RegistryError> {
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }
        self.check_failure()?;

        let resolved = if version.is_empty() {
            let history = self.history(package)?;
            history
                .iter()
                .find(|v| !v.is_prerelease())
                .or_else(|| history.first())
                .map(|v| v.version().to_string())
                .ok_or_else(|| {
                    RegistryError::NotFound(format!("package '{package}' has no versions"))
                })?
        } else {
            version.to_string()
        };

        let deps = self.deps.lock().unwrap();
        let (runtime, dev) = deps
            .get(&(package.to_string(), resolved.clone()))
            .cloned()
            .unwrap_or_default();

        Ok(PackageDependencies {
            package: package.to_string(),
            version: resolved,
            dependencies: runtime,
            dev_dependencies: if include_dev { dev } else { Vec::new() },
        })
    }
}

/// Build a server over a fake registry.
pub fn server_with(registry: Arc<FakeRegistry>) -> Arc<McpServer> {
    let context = Arc::new(ToolContext::new(registry, Settings::default()));
    Arc::new(McpServer::new(context, ServerConfig::default()))
}

/// A fake registry pre-loaded with the `http` package fixture used across
/// scenarios.
pub fn http_fixture() -> Arc<FakeRegistry> {
    let registry = Arc::new(FakeRegistry::new());
    registry.add_history(
        "http",
        vec![
            version("1.3.0-beta.1", 0, ">=3.13.0 <4.0.0", true),
            version("1.2.1", 30, ">=3.13.0 <4.0.0", false),
            version("1.2.0", 90, ">=3.0.0 <4.0.0", false),
        ],
    );
    registry
}
