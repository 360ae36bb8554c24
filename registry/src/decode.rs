//! Upstream wire payloads and their mapping into domain values
//!
//! Serde structs mirror the pub.dev API shapes; unknown fields are ignored,
//! missing required fields (package name, version string, release time)
//! fail decoding.

use crate::error::{RegistryError, Result};
use chrono::{DateTime, Utc};
use pubdex_model::{parse_version, ScoreInsight, VersionDetail};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

// ── Wire shapes ───────────────────────────────────────────────────

/// One page of `/api/search` results
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub packages: Vec<SearchHit>,
    /// Continuation marker for the next page
    #[serde(default)]
    pub next: Option<String>,
    /// Total candidate count, when upstream reports one
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchHit {
    pub package: String,
}

/// `/api/packages/<pkg>` payload
#[derive(Debug, Deserialize)]
pub struct PackagePayload {
    pub name: Option<String>,
    #[serde(default)]
    pub versions: Vec<VersionPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionPayload {
    pub version: Option<String>,
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub retracted: bool,
    #[serde(default)]
    pub pubspec: PubspecPayload,
}

/// The pubspec fields this server reads; keys are snake_case upstream
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PubspecPayload {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub issue_tracker: Option<String>,
    #[serde(default)]
    pub changelog: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub environment: EnvironmentPayload,
    /// Declared order is preserved (`serde_json` preserve_order)
    #[serde(default)]
    pub dependencies: serde_json::Map<String, Value>,
    #[serde(default)]
    pub dev_dependencies: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentPayload {
    #[serde(default)]
    pub sdk: Option<String>,
    #[serde(default)]
    pub flutter: Option<String>,
}

/// `/api/packages/<pkg>/score` payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePayload {
    #[serde(default)]
    pub granted_points: Option<u64>,
    #[serde(default)]
    pub max_points: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    /// Upstream popularity on a 0..100 scale
    #[serde(default)]
    pub popularity_score: Option<f64>,
}

/// `/api/packages/<pkg>/publisher` payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherPayload {
    #[serde(default)]
    pub publisher_id: Option<String>,
}

/// `/api/publishers/<id>/packages` payload
#[derive(Debug, Deserialize)]
pub struct PublisherPackagesPage {
    #[serde(default)]
    pub packages: Vec<SearchHit>,
}

// ── Declared dependencies ─────────────────────────────────────────

/// A dependency as declared in a pubspec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    pub name: String,
    /// Raw constraint expression; `any` for hosted deps without one and for
    /// sdk/git/path dependency objects
    pub constraint: String,
}

/// Declared dependencies of one package version
#[derive(Debug, Clone)]
pub struct PackageDependencies {
    pub package: String,
    pub version: String,
    pub dependencies: Vec<DeclaredDependency>,
    pub dev_dependencies: Vec<DeclaredDependency>,
}

// ── Mapping ───────────────────────────────────────────────────────

/// Map one version payload into the domain, deriving prerelease status from
/// the parsed version and the release-notes URL from the pubspec (changelog,
/// falling back to the issue tracker).
pub fn version_detail(payload: &VersionPayload) -> Result<VersionDetail> {
    let version = payload
        .version
        .as_deref()
        .ok_or_else(|| RegistryError::Decode("version entry missing 'version'".to_string()))?;
    let published = payload
        .published
        .ok_or_else(|| RegistryError::Decode(format!("version {version} missing 'published'")))?;

    let parsed = parse_version(version)
        .map_err(|_| RegistryError::Decode(format!("unparseable version '{version}'")))?;

    let sdk = payload
        .pubspec
        .environment
        .sdk
        .clone()
        .unwrap_or_else(|| "any".to_string());

    let release_notes = payload
        .pubspec
        .changelog
        .as_deref()
        .or(payload.pubspec.issue_tracker.as_deref())
        .and_then(|raw| Url::parse(raw).ok());

    VersionDetail::new(version, published, sdk, !parsed.pre.is_empty(), release_notes)
        .map_err(|e| RegistryError::Decode(e.to_string()))
}

/// Decode a package payload into version history sorted descending by
/// release time, tiebroken by descending lexicographic version.
pub fn version_history(payload: &PackagePayload) -> Result<Vec<VersionDetail>> {
    if payload.name.is_none() {
        return Err(RegistryError::Decode(
            "package payload missing 'name'".to_string(),
        ));
    }

    let mut history = payload
        .versions
        .iter()
        .filter(|v| !v.retracted)
        .map(version_detail)
        .collect::<Result<Vec<_>>>()?;

    history.sort_by(|a, b| {
        b.released()
            .cmp(&a.released())
            .then_with(|| b.version().cmp(a.version()))
    });
    Ok(history)
}

/// Newest non-prerelease entry of a descending-sorted history.
pub fn latest_stable(history: &[VersionDetail]) -> Option<&VersionDetail> {
    history.iter().find(|v| !v.is_prerelease())
}

/// Newest stable, falling back to the newest overall for packages that have
/// only ever shipped prereleases.
pub fn latest_or_newest(history: &[VersionDetail]) -> Option<&VersionDetail> {
    latest_stable(history).or_else(|| history.first())
}

/// Rescale upstream popularity (0..100) into the unit interval.
pub fn rescale_popularity(raw: Option<f64>) -> f64 {
    (raw.unwrap_or(0.0) / 100.0).clamp(0.0, 1.0)
}

/// Build a score insight from the score payload.
pub fn score_insight(package: &str, payload: &ScorePayload) -> Result<ScoreInsight> {
    let granted = payload.granted_points.unwrap_or(0);
    let max = payload.max_points.unwrap_or(0);
    let likes = payload.like_count.unwrap_or(0);
    let popularity = rescale_popularity(payload.popularity_score);

    let notes = vec![
        (
            "pub points".to_string(),
            format!("granted {granted} of {max} pub points"),
        ),
        (
            "popularity".to_string(),
            format!(
                "scores {:.0} of 100 on downloads-weighted popularity",
                popularity * 100.0
            ),
        ),
        (
            "likes".to_string(),
            format!("{likes} developers have liked this package"),
        ),
    ];

    ScoreInsight::new(package, granted, popularity, likes, granted, notes, Utc::now())
        .map_err(|e| RegistryError::Decode(e.to_string()))
}

/// Extract declared dependencies in pubspec order. Constraint values that
/// are not plain strings (sdk, git, path dependencies) count as `any`.
pub fn declared_dependencies(map: &serde_json::Map<String, Value>) -> Vec<DeclaredDependency> {
    map.iter()
        .map(|(name, value)| DeclaredDependency {
            name: name.clone(),
            constraint: value
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| "any".to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKAGE_FIXTURE: &str = r#"{
        "name": "http",
        "latest": {"version": "1.3.0-beta.1"},
        "versions": [
            {
                "version": "1.2.0",
                "published": "2024-01-10T00:00:00Z",
                "pubspec": {
                    "environment": {"sdk": ">=3.0.0 <4.0.0"},
                    "dependencies": {"async": "^2.11.0", "meta": "^1.9.0"}
                }
            },
            {
                "version": "1.2.1",
                "published": "2024-03-01T00:00:00Z",
                "pubspec": {
                    "environment": {"sdk": ">=3.13.0 <4.0.0"},
                    "issue_tracker": "https://github.com/dart-lang/http/issues"
                }
            },
            {
                "version": "1.3.0-beta.1",
                "published": "2024-05-01T00:00:00Z",
                "pubspec": {"environment": {"sdk": ">=3.13.0 <4.0.0"}}
            }
        ],
        "somethingNew": {"ignored": true}
    }"#;

    fn package() -> PackagePayload {
        serde_json::from_str(PACKAGE_FIXTURE).unwrap()
    }

    #[test]
    fn test_history_sorted_descending_by_release() {
        let history = version_history(&package()).unwrap();
        let versions: Vec<_> = history.iter().map(|v| v.version()).collect();
        assert_eq!(versions, ["1.3.0-beta.1", "1.2.1", "1.2.0"]);
    }

    #[test]
    fn test_history_tiebreak_lexicographic_descending() {
        let payload: PackagePayload = serde_json::from_str(
            r#"{
                "name": "tie",
                "versions": [
                    {"version": "1.0.0", "published": "2024-01-01T00:00:00Z"},
                    {"version": "1.0.1", "published": "2024-01-01T00:00:00Z"}
                ]
            }"#,
        )
        .unwrap();
        let history = version_history(&payload).unwrap();
        assert_eq!(history[0].version(), "1.0.1");
    }

    #[test]
    fn test_latest_stable_skips_prerelease() {
        let history = version_history(&package()).unwrap();
        assert_eq!(latest_stable(&history).unwrap().version(), "1.2.1");
        assert!(!latest_stable(&history).unwrap().is_prerelease());
    }

    #[test]
    fn test_release_notes_falls_back_to_issue_tracker() {
        let history = version_history(&package()).unwrap();
        let v121 = history.iter().find(|v| v.version() == "1.2.1").unwrap();
        assert_eq!(
            v121.release_notes_url().unwrap().as_str(),
            "https://github.com/dart-lang/http/issues"
        );
        let v120 = history.iter().find(|v| v.version() == "1.2.0").unwrap();
        assert!(v120.release_notes_url().is_none());
    }

    #[test]
    fn test_missing_required_fields_fail_decode() {
        let payload: PackagePayload = serde_json::from_str(
            r#"{"name": "x", "versions": [{"version": "1.0.0"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            version_history(&payload),
            Err(RegistryError::Decode(_))
        ));

        let payload: PackagePayload =
            serde_json::from_str(r#"{"versions": []}"#).unwrap();
        assert!(matches!(
            version_history(&payload),
            Err(RegistryError::Decode(_))
        ));
    }

    #[test]
    fn test_declared_dependency_order_preserved() {
        let history = package();
        let v120 = history
            .versions
            .iter()
            .find(|v| v.version.as_deref() == Some("1.2.0"))
            .unwrap();
        let deps = declared_dependencies(&v120.pubspec.dependencies);
        let names: Vec<_> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["async", "meta"]);
        assert_eq!(deps[0].constraint, "^2.11.0");
    }

    #[test]
    fn test_non_string_constraints_become_any() {
        let map: serde_json::Map<String, Value> = serde_json::from_str(
            r#"{"flutter": {"sdk": "flutter"}, "http": "^1.0.0"}"#,
        )
        .unwrap();
        let deps = declared_dependencies(&map);
        assert_eq!(deps[0].constraint, "any");
        assert_eq!(deps[1].constraint, "^1.0.0");
    }

    #[test]
    fn test_popularity_rescaled_and_clamped() {
        assert_eq!(rescale_popularity(Some(98.0)), 0.98);
        assert_eq!(rescale_popularity(Some(150.0)), 1.0);
        assert_eq!(rescale_popularity(Some(-3.0)), 0.0);
        assert_eq!(rescale_popularity(None), 0.0);
    }

    #[test]
    fn test_score_insight_mapping() {
        let payload: ScorePayload = serde_json::from_str(
            r#"{"grantedPoints": 130, "maxPoints": 160, "likeCount": 5000,
                "popularityScore": 98.2, "unknown": 1}"#,
        )
        .unwrap();
        let insight = score_insight("http", &payload).unwrap();
        assert_eq!(insight.overall_score(), 130);
        assert_eq!(insight.likes(), 5000);
        assert!((insight.popularity() - 0.982).abs() < 1e-9);
        assert!(insight.component_notes().contains_key("pub points"));
        assert!(insight.component_notes().contains_key("popularity"));
        assert!(insight.component_notes().contains_key("likes"));
    }
}
