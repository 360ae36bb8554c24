//! Version parsing and per-version release metadata
//!
//! pub.dev version strings are standard SemVer 2.0, with tolerance for the
//! shortened `X` and `X.Y` forms that appear in SDK constraints.

use crate::constraint::VersionConstraint;
use crate::error::{ModelError, Result};
use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use url::Url;

/// Parse a version string, padding `X` and `X.Y` forms to full semver.
pub fn parse_version(s: &str) -> Result<Version> {
    let s = s.trim();
    let core_end = s
        .find(|c| c == '-' || c == '+')
        .unwrap_or(s.len());
    let dots = s[..core_end].matches('.').count();

    let padded;
    let candidate = match dots {
        0 => {
            padded = format!("{}.0.0{}", &s[..core_end], &s[core_end..]);
            padded.as_str()
        }
        1 => {
            padded = format!("{}.0{}", &s[..core_end], &s[core_end..]);
            padded.as_str()
        }
        _ => s,
    };

    Version::parse(candidate).map_err(|_| ModelError::InvalidVersion(s.to_string()))
}

/// A single released version of a package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVersionDetail", rename_all = "camelCase")]
pub struct VersionDetail {
    version: String,
    released: DateTime<Utc>,
    sdk_constraint: String,
    is_prerelease: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    release_notes_url: Option<Url>,
    #[serde(skip)]
    parsed: Version,
    #[serde(skip)]
    parsed_sdk: VersionConstraint,
}

impl VersionDetail {
    /// Create a version detail, validating the version string and SDK
    /// constraint expression.
    pub fn new(
        version: impl Into<String>,
        released: DateTime<Utc>,
        sdk_constraint: impl Into<String>,
        is_prerelease: bool,
        release_notes_url: Option<Url>,
    ) -> Result<Self> {
        let version = version.into();
        let parsed = parse_version(&version)?;

        let mut sdk_constraint = sdk_constraint.into();
        if sdk_constraint.trim().is_empty() {
            sdk_constraint = "any".to_string();
        }
        let parsed_sdk = VersionConstraint::parse(&sdk_constraint)?;

        Ok(Self {
            version,
            released,
            sdk_constraint,
            is_prerelease,
            release_notes_url,
            parsed,
            parsed_sdk,
        })
    }

    /// The version string as released.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The parsed semver form.
    pub fn parsed(&self) -> &Version {
        &self.parsed
    }

    /// When this version was published.
    pub fn released(&self) -> DateTime<Utc> {
        self.released
    }

    /// The SDK constraint expression, `any` when unconstrained.
    pub fn sdk_constraint(&self) -> &str {
        &self.sdk_constraint
    }

    /// The parsed SDK constraint.
    pub fn sdk(&self) -> &VersionConstraint {
        &self.parsed_sdk
    }

    /// Whether this is a prerelease.
    pub fn is_prerelease(&self) -> bool {
        self.is_prerelease
    }

    /// Link to release notes, when one could be derived.
    pub fn release_notes_url(&self) -> Option<&Url> {
        self.release_notes_url.as_ref()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVersionDetail {
    version: String,
    released: DateTime<Utc>,
    #[serde(default)]
    sdk_constraint: Option<String>,
    #[serde(default)]
    is_prerelease: bool,
    #[serde(default)]
    release_notes_url: Option<Url>,
}

impl TryFrom<RawVersionDetail> for VersionDetail {
    type Error = ModelError;

    fn try_from(raw: RawVersionDetail) -> Result<Self> {
        VersionDetail::new(
            raw.version,
            raw.released,
            raw.sdk_constraint.unwrap_or_default(),
            raw.is_prerelease,
            raw.release_notes_url,
        )
    }
}
