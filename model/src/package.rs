//! Package-level value objects: summaries, details, and score insights

use crate::error::{ModelError, Result};
use crate::validate;
use crate::version::VersionDetail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

fn check_unit_interval(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ModelError::invalid(
            field,
            format!("{value} is outside [0, 1]"),
        ));
    }
    Ok(value)
}

/// A search-result entry for one package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPackageSummary", rename_all = "camelCase")]
pub struct PackageSummary {
    name: String,
    description: String,
    publisher: String,
    likes: u64,
    pub_points: u64,
    popularity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest_stable: Option<VersionDetail>,
}

impl PackageSummary {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        publisher: impl Into<String>,
        likes: u64,
        pub_points: u64,
        popularity: f64,
        latest_stable: Option<VersionDetail>,
    ) -> Result<Self> {
        let name = name.into();
        validate::package_name(&name)?;
        let popularity = check_unit_interval("popularity", popularity)?;

        Ok(Self {
            name,
            description: description.into(),
            publisher: publisher.into(),
            likes,
            pub_points,
            popularity,
            latest_stable,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn likes(&self) -> u64 {
        self.likes
    }

    pub fn pub_points(&self) -> u64 {
        self.pub_points
    }

    pub fn popularity(&self) -> f64 {
        self.popularity
    }

    pub fn latest_stable(&self) -> Option<&VersionDetail> {
        self.latest_stable.as_ref()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPackageSummary {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    publisher: String,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    pub_points: u64,
    #[serde(default)]
    popularity: f64,
    #[serde(default)]
    latest_stable: Option<VersionDetail>,
}

impl TryFrom<RawPackageSummary> for PackageSummary {
    type Error = ModelError;

    fn try_from(raw: RawPackageSummary) -> Result<Self> {
        PackageSummary::new(
            raw.name,
            raw.description,
            raw.publisher,
            raw.likes,
            raw.pub_points,
            raw.popularity,
            raw.latest_stable,
        )
    }
}

/// Full metadata for one package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPackageDetails", rename_all = "camelCase")]
pub struct PackageDetails {
    package: String,
    description: String,
    publisher: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    homepage: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repository: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issue_tracker: Option<Url>,
    latest_stable: VersionDetail,
    topics: Vec<String>,
}

impl PackageDetails {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        package: impl Into<String>,
        description: impl Into<String>,
        publisher: impl Into<String>,
        homepage: Option<Url>,
        repository: Option<Url>,
        issue_tracker: Option<Url>,
        latest_stable: VersionDetail,
        topics: Vec<String>,
    ) -> Result<Self> {
        let package = package.into();
        validate::package_name(&package)?;

        Ok(Self {
            package,
            description: description.into(),
            publisher: publisher.into(),
            homepage,
            repository,
            issue_tracker,
            latest_stable,
            topics,
        })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn homepage(&self) -> Option<&Url> {
        self.homepage.as_ref()
    }

    pub fn repository(&self) -> Option<&Url> {
        self.repository.as_ref()
    }

    pub fn issue_tracker(&self) -> Option<&Url> {
        self.issue_tracker.as_ref()
    }

    pub fn latest_stable(&self) -> &VersionDetail {
        &self.latest_stable
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPackageDetails {
    package: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    publisher: String,
    #[serde(default)]
    homepage: Option<Url>,
    #[serde(default)]
    repository: Option<Url>,
    #[serde(default)]
    issue_tracker: Option<Url>,
    latest_stable: VersionDetail,
    #[serde(default)]
    topics: Vec<String>,
}

impl TryFrom<RawPackageDetails> for PackageDetails {
    type Error = ModelError;

    fn try_from(raw: RawPackageDetails) -> Result<Self> {
        PackageDetails::new(
            raw.package,
            raw.description,
            raw.publisher,
            raw.homepage,
            raw.repository,
            raw.issue_tracker,
            raw.latest_stable,
            raw.topics,
        )
    }
}

/// Aggregated scoring data for one package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScoreInsight", rename_all = "camelCase")]
pub struct ScoreInsight {
    package: String,
    overall_score: u64,
    popularity: f64,
    likes: u64,
    pub_points: u64,
    component_notes: BTreeMap<String, String>,
    fetched_at: DateTime<Utc>,
}

impl ScoreInsight {
    /// Create a score insight. Component note keys are lowercased.
    pub fn new(
        package: impl Into<String>,
        overall_score: u64,
        popularity: f64,
        likes: u64,
        pub_points: u64,
        component_notes: impl IntoIterator<Item = (String, String)>,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self> {
        let package = package.into();
        validate::package_name(&package)?;
        let popularity = check_unit_interval("popularity", popularity)?;

        let component_notes = component_notes
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();

        Ok(Self {
            package,
            overall_score,
            popularity,
            likes,
            pub_points,
            component_notes,
            fetched_at,
        })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn overall_score(&self) -> u64 {
        self.overall_score
    }

    pub fn popularity(&self) -> f64 {
        self.popularity
    }

    pub fn likes(&self) -> u64 {
        self.likes
    }

    pub fn pub_points(&self) -> u64 {
        self.pub_points
    }

    pub fn component_notes(&self) -> &BTreeMap<String, String> {
        &self.component_notes
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScoreInsight {
    package: String,
    #[serde(default)]
    overall_score: u64,
    #[serde(default)]
    popularity: f64,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    pub_points: u64,
    #[serde(default)]
    component_notes: BTreeMap<String, String>,
    fetched_at: DateTime<Utc>,
}

impl TryFrom<RawScoreInsight> for ScoreInsight {
    type Error = ModelError;

    fn try_from(raw: RawScoreInsight) -> Result<Self> {
        ScoreInsight::new(
            raw.package,
            raw.overall_score,
            raw.popularity,
            raw.likes,
            raw.pub_points,
            raw.component_notes,
            raw.fetched_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_summary_popularity_bounds() {
        assert!(PackageSummary::new("http", "", "dart.dev", 100, 140, 0.5, None).is_ok());
        assert!(PackageSummary::new("http", "", "dart.dev", 100, 140, 1.2, None).is_err());
        assert!(PackageSummary::new("http", "", "dart.dev", 100, 140, -0.1, None).is_err());
        assert!(PackageSummary::new("http", "", "dart.dev", 100, 140, f64::NAN, None).is_err());
    }

    #[test]
    fn test_summary_rejects_bad_name() {
        assert!(PackageSummary::new("Not-Valid", "", "", 0, 0, 0.0, None).is_err());
    }

    #[test]
    fn test_score_insight_lowercases_component_keys() {
        let insight = ScoreInsight::new(
            "http",
            130,
            0.98,
            5000,
            140,
            vec![("Popularity".to_string(), "top decile".to_string())],
            now(),
        )
        .unwrap();
        assert!(insight.component_notes().contains_key("popularity"));
        assert!(!insight.component_notes().contains_key("Popularity"));
    }

    #[test]
    fn test_score_insight_round_trip() {
        let insight = ScoreInsight::new(
            "http",
            130,
            0.98,
            5000,
            140,
            vec![("likes".to_string(), "well liked".to_string())],
            now(),
        )
        .unwrap();

        let json = serde_json::to_value(&insight).unwrap();
        let back: ScoreInsight = serde_json::from_value(json).unwrap();
        assert_eq!(insight, back);
    }

    #[test]
    fn test_details_round_trip_omits_none_urls() {
        let latest = VersionDetail::new("1.2.1", now(), "any", false, None).unwrap();
        let details = PackageDetails::new(
            "http",
            "HTTP client",
            "dart.dev",
            None,
            Some(Url::parse("https://github.com/dart-lang/http").unwrap()),
            None,
            latest,
            vec!["network".to_string()],
        )
        .unwrap();

        let json = serde_json::to_string(&details).unwrap();
        assert!(!json.contains("homepage"));
        assert!(!json.contains("issueTracker"));
        let back: PackageDetails = serde_json::from_str(&json).unwrap();
        assert_eq!(details, back);
    }
}
