//! SDK compatibility requests and results

use crate::constraint::VersionConstraint;
use crate::error::{ModelError, Result};
use crate::validate;
use crate::version::{parse_version, VersionDetail};
use semver::Version;
use serde::{Deserialize, Serialize};

/// Upper bound on versions a compatibility evaluation may carry
pub const MAX_EVALUATED_VERSIONS: usize = 50;

/// What the caller asked to evaluate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCompatibilityRequest", rename_all = "camelCase")]
pub struct CompatibilityRequest {
    package: String,
    flutter_sdk: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_constraint: Option<String>,
    #[serde(skip)]
    probe: Version,
    #[serde(skip)]
    parsed_project: Option<VersionConstraint>,
}

impl CompatibilityRequest {
    /// Create a request. `flutter_sdk` is either an exact version (the probe)
    /// or a constraint whose lower bound becomes the probe.
    pub fn new(
        package: impl Into<String>,
        flutter_sdk: impl Into<String>,
        project_constraint: Option<String>,
    ) -> Result<Self> {
        let package = package.into();
        validate::package_name(&package)?;

        let flutter_sdk = flutter_sdk.into();
        let probe = match parse_version(&flutter_sdk) {
            Ok(version) => version,
            Err(_) => {
                let constraint = VersionConstraint::parse(&flutter_sdk)
                    .map_err(|_| ModelError::invalid("flutterSdk", "not a version or constraint"))?;
                constraint.lower_bound().ok_or_else(|| {
                    ModelError::invalid("flutterSdk", "constraint has no lower bound to probe")
                })?
            }
        };

        let parsed_project = match &project_constraint {
            Some(expr) => Some(
                VersionConstraint::parse(expr)
                    .map_err(|_| ModelError::invalid("projectConstraint", "not a valid range"))?,
            ),
            None => None,
        };

        Ok(Self {
            package,
            flutter_sdk,
            project_constraint,
            probe,
            parsed_project,
        })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn flutter_sdk(&self) -> &str {
        &self.flutter_sdk
    }

    pub fn project_constraint(&self) -> Option<&str> {
        self.project_constraint.as_deref()
    }

    /// The SDK version used as the point estimate during evaluation.
    pub fn probe(&self) -> &Version {
        &self.probe
    }

    /// The parsed project constraint, when one was given.
    pub fn project(&self) -> Option<&VersionConstraint> {
        self.parsed_project.as_ref()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompatibilityRequest {
    package: String,
    flutter_sdk: String,
    #[serde(default)]
    project_constraint: Option<String>,
}

impl TryFrom<RawCompatibilityRequest> for CompatibilityRequest {
    type Error = ModelError;

    fn try_from(raw: RawCompatibilityRequest) -> Result<Self> {
        CompatibilityRequest::new(raw.package, raw.flutter_sdk, raw.project_constraint)
    }
}

/// Outcome of a compatibility evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCompatibilityResult", rename_all = "camelCase")]
pub struct CompatibilityResult {
    request: CompatibilityRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommended_version: Option<VersionDetail>,
    satisfies: bool,
    explanation: String,
    evaluated_versions: Vec<VersionDetail>,
}

impl CompatibilityResult {
    pub fn new(
        request: CompatibilityRequest,
        recommended_version: Option<VersionDetail>,
        satisfies: bool,
        explanation: impl Into<String>,
        evaluated_versions: Vec<VersionDetail>,
    ) -> Result<Self> {
        let explanation = explanation.into();
        if explanation.trim().is_empty() {
            return Err(ModelError::invalid("explanation", "must not be empty"));
        }
        if satisfies && recommended_version.is_none() {
            return Err(ModelError::invalid(
                "recommendedVersion",
                "required when satisfies is true",
            ));
        }
        if evaluated_versions.is_empty() || evaluated_versions.len() > MAX_EVALUATED_VERSIONS {
            return Err(ModelError::invalid(
                "evaluatedVersions",
                format!("must hold between 1 and {MAX_EVALUATED_VERSIONS} versions"),
            ));
        }

        Ok(Self {
            request,
            recommended_version,
            satisfies,
            explanation,
            evaluated_versions,
        })
    }

    pub fn request(&self) -> &CompatibilityRequest {
        &self.request
    }

    pub fn recommended_version(&self) -> Option<&VersionDetail> {
        self.recommended_version.as_ref()
    }

    pub fn satisfies(&self) -> bool {
        self.satisfies
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn evaluated_versions(&self) -> &[VersionDetail] {
        &self.evaluated_versions
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompatibilityResult {
    request: CompatibilityRequest,
    #[serde(default)]
    recommended_version: Option<VersionDetail>,
    satisfies: bool,
    explanation: String,
    evaluated_versions: Vec<VersionDetail>,
}

impl TryFrom<RawCompatibilityResult> for CompatibilityResult {
    type Error = ModelError;

    fn try_from(raw: RawCompatibilityResult) -> Result<Self> {
        CompatibilityResult::new(
            raw.request,
            raw.recommended_version,
            raw.satisfies,
            raw.explanation,
            raw.evaluated_versions,
        )
    }
}
