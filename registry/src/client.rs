//! Typed pub.dev client over the resilience pipeline
//!
//! Seven operations mapped 1:1 onto upstream endpoints. Inputs are assumed
//! pre-validated at the tool boundary; the client owns wire concerns only.

use crate::decode::{self, PackageDependencies, PackagePayload, PublisherPackagesPage,
    PublisherPayload, ScorePayload, SearchPage};
use crate::error::{RegistryError, Result};
use crate::http::{Fetch, ReqwestFetch};
use crate::resilience::{CircuitState, ResilientFetch};
use async_trait::async_trait;
use futures::future::join_all;
use pubdex_config::Settings;
use pubdex_model::{
    PackageDetails, PackageSummary, ScoreInsight, SearchResultSet, VersionConstraint,
    VersionDetail,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use url::Url;

/// Hint text attached when upstream has more candidates than the result cap
const MORE_RESULTS_HINT: &str = "More packages available…";

/// The seven registry operations, behind a trait so handlers and tests can
/// swap in an in-memory registry.
#[async_trait]
pub trait RegistryOps: Send + Sync {
    async fn search(
        &self,
        query: &str,
        include_prerelease: bool,
        sdk_constraint: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SearchResultSet>;

    async fn latest_version(
        &self,
        package: &str,
        cancel: &CancellationToken,
    ) -> Result<VersionDetail>;

    async fn version_history(
        &self,
        package: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<VersionDetail>>;

    async fn package_details(
        &self,
        package: &str,
        cancel: &CancellationToken,
    ) -> Result<PackageDetails>;

    async fn publisher_packages(
        &self,
        publisher: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<PackageSummary>>;

    async fn score(&self, package: &str, cancel: &CancellationToken) -> Result<ScoreInsight>;

    async fn inspect_dependencies(
        &self,
        package: &str,
        version: &str,
        include_dev: bool,
        cancel: &CancellationToken,
    ) -> Result<PackageDependencies>;
}

/// Live pub.dev client
pub struct PubDevClient {
    http: ResilientFetch,
    base: Url,
    search_limit: usize,
}

impl PubDevClient {
    /// Build a client over an arbitrary fetcher.
    pub fn new(settings: &Settings, fetch: Arc<dyn Fetch>) -> Self {
        Self {
            http: ResilientFetch::new(fetch, &settings.resilience),
            base: settings.api.base_address.clone(),
            search_limit: settings.api.search_result_limit.max(1),
        }
    }

    /// Build a client over the production reqwest fetcher.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let fetch = Arc::new(ReqwestFetch::new(&settings.api.user_agent)?);
        Ok(Self::new(settings, fetch))
    }

    /// Breaker state, surfaced by the readiness probe.
    pub fn circuit_state(&self) -> CircuitState {
        self.http.circuit_state()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| RegistryError::InvalidInput("base URL cannot be a base".to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let response = self.http.get(&url, cancel).await?;
        serde_json::from_str(&response.body).map_err(|e| {
            warn!(url = %url, error = %e, "upstream payload failed to decode");
            RegistryError::Decode(format!("{url}: {e}"))
        })
    }

    async fn fetch_package(
        &self,
        package: &str,
        cancel: &CancellationToken,
    ) -> Result<PackagePayload> {
        let url = self.endpoint(&["api", "packages", package])?;
        match self.get_json(url, cancel).await {
            Err(RegistryError::NotFound(_)) => {
                Err(RegistryError::NotFound(format!("package '{package}'")))
            }
            other => other,
        }
    }

    /// Assemble one search summary from the package and score endpoints,
    /// fetched concurrently. A failed score fetch degrades to zeros.
    async fn summary(
        &self,
        package: &str,
        include_prerelease: bool,
        cancel: &CancellationToken,
    ) -> Result<PackageSummary> {
        let score_url = self.endpoint(&["api", "packages", package, "score"])?;
        let (payload, score) = tokio::join!(
            self.fetch_package(package, cancel),
            self.get_json::<ScorePayload>(score_url, cancel),
        );

        let payload = payload?;
        let history = decode::version_history(&payload)?;
        let latest = if include_prerelease {
            history.first()
        } else {
            decode::latest_or_newest(&history)
        };

        let (likes, points, popularity) = match score {
            Ok(score) => (
                score.like_count.unwrap_or(0),
                score.granted_points.unwrap_or(0),
                decode::rescale_popularity(score.popularity_score),
            ),
            Err(RegistryError::Cancelled) => return Err(RegistryError::Cancelled),
            Err(e) => {
                warn!(package, error = %e, "score fetch failed, degrading summary");
                (0, 0, 0.0)
            }
        };

        let description = latest
            .map(|v| v.version().to_string())
            .and_then(|version| {
                payload
                    .versions
                    .iter()
                    .find(|p| p.version.as_deref() == Some(version.as_str()))
                    .and_then(|p| p.pubspec.description.clone())
            })
            .unwrap_or_default();

        let publisher = self.fetch_publisher(package, cancel).await;

        PackageSummary::new(
            package,
            description,
            publisher,
            likes,
            points,
            popularity,
            latest.cloned(),
        )
        .map_err(|e| RegistryError::Decode(e.to_string()))
    }

    /// Publisher id for a package; unverified publishers decode to an empty
    /// string and failures degrade the same way.
    async fn fetch_publisher(&self, package: &str, cancel: &CancellationToken) -> String {
        let url = match self.endpoint(&["api", "packages", package, "publisher"]) {
            Ok(url) => url,
            Err(_) => return String::new(),
        };
        match self.get_json::<PublisherPayload>(url, cancel).await {
            Ok(payload) => payload.publisher_id.unwrap_or_default(),
            Err(e) => {
                warn!(package, error = %e, "publisher fetch failed");
                String::new()
            }
        }
    }

    /// Fan out summary assembly for a list of package names, dropping
    /// branches that fail so one bad package never sinks the page.
    async fn summaries(
        &self,
        names: &[String],
        include_prerelease: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<PackageSummary>> {
        let fetched = join_all(
            names
                .iter()
                .map(|name| self.summary(name, include_prerelease, cancel)),
        )
        .await;

        let mut summaries = Vec::with_capacity(names.len());
        for (name, outcome) in names.iter().zip(fetched) {
            match outcome {
                Ok(summary) => summaries.push(summary),
                Err(RegistryError::Cancelled) => return Err(RegistryError::Cancelled),
                Err(e) => warn!(package = %name, error = %e, "dropping failed summary"),
            }
        }
        Ok(summaries)
    }
}

#[async_trait]
impl RegistryOps for PubDevClient {
    async fn search(
        &self,
        query: &str,
        include_prerelease: bool,
        sdk_constraint: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SearchResultSet> {
        let mut url = self.endpoint(&["api", "search"])?;
        url.query_pairs_mut().append_pair("q", query);

        let page: SearchPage = self.get_json(url, cancel).await?;

        // Distinct names in order of first appearance, capped.
        let mut names: Vec<String> = Vec::new();
        for hit in &page.packages {
            if names.len() >= self.search_limit {
                break;
            }
            if !names.iter().any(|n| n == &hit.package) {
                names.push(hit.package.clone());
            }
        }

        let more = page.next.is_some()
            || page.total.map(|t| t as usize > names.len()).unwrap_or(false)
            || page.packages.len() > names.len();

        let mut packages = self.summaries(&names, include_prerelease, cancel).await?;

        if let Some(expr) = sdk_constraint {
            let probe = VersionConstraint::parse(expr)
                .map_err(|e| RegistryError::InvalidInput(e.to_string()))?
                .lower_bound();
            if let Some(probe) = probe {
                packages.retain(|summary| {
                    summary
                        .latest_stable()
                        .map(|latest| latest.sdk().matches(&probe))
                        .unwrap_or(true)
                });
            }
        }

        if packages.is_empty() {
            return Err(RegistryError::NotFound(format!(
                "no packages matched '{query}'"
            )));
        }

        SearchResultSet::new(
            query,
            packages,
            more.then(|| MORE_RESULTS_HINT.to_string()),
        )
        .map_err(|e| RegistryError::Decode(e.to_string()))
    }

    async fn latest_version(
        &self,
        package: &str,
        cancel: &CancellationToken,
    ) -> Result<VersionDetail> {
        let payload = self.fetch_package(package, cancel).await?;
        let history = decode::version_history(&payload)?;
        decode::latest_or_newest(&history)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(format!("package '{package}' has no versions")))
    }

    async fn version_history(
        &self,
        package: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<VersionDetail>> {
        let payload = self.fetch_package(package, cancel).await?;
        decode::version_history(&payload)
    }

    async fn package_details(
        &self,
        package: &str,
        cancel: &CancellationToken,
    ) -> Result<PackageDetails> {
        let payload = self.fetch_package(package, cancel).await?;
        let history = decode::version_history(&payload)?;
        let latest = decode::latest_or_newest(&history).cloned().ok_or_else(|| {
            RegistryError::NotFound(format!("package '{package}' has no versions"))
        })?;

        let pubspec = payload
            .versions
            .iter()
            .find(|v| v.version.as_deref() == Some(latest.version()))
            .map(|v| v.pubspec.clone())
            .unwrap_or_default();

        let publisher = self.fetch_publisher(package, cancel).await;

        let parse_url = |raw: &Option<String>| raw.as_deref().and_then(|s| Url::parse(s).ok());

        PackageDetails::new(
            package,
            pubspec.description.clone().unwrap_or_default(),
            publisher,
            parse_url(&pubspec.homepage),
            parse_url(&pubspec.repository),
            parse_url(&pubspec.issue_tracker),
            latest,
            pubspec.topics.clone(),
        )
        .map_err(|e| RegistryError::Decode(e.to_string()))
    }

    async fn publisher_packages(
        &self,
        publisher: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<PackageSummary>> {
        let url = self.endpoint(&["api", "publishers", publisher, "packages"])?;
        let page: PublisherPackagesPage = match self.get_json(url, cancel).await {
            Err(RegistryError::NotFound(_)) => {
                return Err(RegistryError::NotFound(format!("publisher '{publisher}'")))
            }
            other => other?,
        };

        let names: Vec<String> = page
            .packages
            .iter()
            .take(self.search_limit)
            .map(|hit| hit.package.clone())
            .collect();

        self.summaries(&names, false, cancel).await
    }

    async fn score(&self, package: &str, cancel: &CancellationToken) -> Result<ScoreInsight> {
        let url = self.endpoint(&["api", "packages", package, "score"])?;
        let payload: ScorePayload = match self.get_json(url, cancel).await {
            Err(RegistryError::NotFound(_)) => {
                return Err(RegistryError::NotFound(format!("package '{package}'")))
            }
            other => other?,
        };
        decode::score_insight(package, &payload)
    }

    async fn inspect_dependencies(
        &self,
        package: &str,
        version: &str,
        include_dev: bool,
        cancel: &CancellationToken,
    ) -> Result<PackageDependencies> {
        let payload = self.fetch_package(package, cancel).await?;
        let history = decode::version_history(&payload)?;

        let target = if version.is_empty() {
            decode::latest_or_newest(&history).cloned().ok_or_else(|| {
                RegistryError::NotFound(format!("package '{package}' has no versions"))
            })?
        } else {
            history
                .iter()
                .find(|v| v.version() == version)
                .cloned()
                .ok_or_else(|| {
                    RegistryError::NotFound(format!("version '{version}' of '{package}'"))
                })?
        };

        let pubspec = payload
            .versions
            .iter()
            .find(|v| v.version.as_deref() == Some(target.version()))
            .map(|v| v.pubspec.clone())
            .unwrap_or_default();

        Ok(PackageDependencies {
            package: package.to_string(),
            version: target.version().to_string(),
            dependencies: decode::declared_dependencies(&pubspec.dependencies),
            dev_dependencies: if include_dev {
                decode::declared_dependencies(&pubspec.dev_dependencies)
            } else {
                Vec::new()
            },
        })
    }
}
