//! Version constraint expressions in pub.dev's grammar
//!
//! Clauses separated by `||` form a disjunction; whitespace-separated tokens
//! within a clause form a conjunction. `any` or an empty expression matches
//! every version.

use crate::error::{ModelError, Result};
use crate::version::parse_version;
use semver::Version;

/// A single comparison token within a clause
#[derive(Debug, Clone, PartialEq, Eq)]
enum Comparator {
    /// `^X.Y.Z`: at least the version, strictly below the next leftmost
    /// non-zero bump
    Caret(Version),
    GreaterEq(Version),
    Greater(Version),
    LessEq(Version),
    Less(Version),
    /// `=X.Y.Z` or a bare `X.Y.Z`
    Exact(Version),
}

impl Comparator {
    fn matches(&self, version: &Version) -> bool {
        match self {
            Comparator::Caret(base) => version >= base && *version < caret_upper(base),
            Comparator::GreaterEq(v) => version >= v,
            Comparator::Greater(v) => version > v,
            Comparator::LessEq(v) => version <= v,
            Comparator::Less(v) => version < v,
            Comparator::Exact(v) => version == v,
        }
    }

    /// The version a clause admits at its low end, if this token bounds it
    fn lower_bound(&self) -> Option<&Version> {
        match self {
            Comparator::Caret(v)
            | Comparator::GreaterEq(v)
            | Comparator::Greater(v)
            | Comparator::Exact(v) => Some(v),
            Comparator::LessEq(_) | Comparator::Less(_) => None,
        }
    }
}

/// Exclusive upper bound of a caret requirement
fn caret_upper(base: &Version) -> Version {
    if base.major > 0 {
        Version::new(base.major + 1, 0, 0)
    } else if base.minor > 0 {
        Version::new(0, base.minor + 1, 0)
    } else {
        Version::new(0, 0, base.patch + 1)
    }
}

/// A parsed constraint expression
#[derive(Debug, Clone, PartialEq)]
pub struct VersionConstraint {
    raw: String,
    /// Disjunction of conjunctions; empty means `any`
    clauses: Vec<Vec<Comparator>>,
}

impl VersionConstraint {
    /// Parse a constraint expression.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("any") {
            return Ok(Self {
                raw: "any".to_string(),
                clauses: Vec::new(),
            });
        }

        let mut clauses = Vec::new();
        for clause_text in trimmed.split("||") {
            let mut clause = Vec::new();
            for token in clause_text.split_whitespace() {
                clause.push(parse_token(token, input)?);
            }
            if clause.is_empty() {
                return Err(ModelError::InvalidConstraint(input.to_string()));
            }
            clauses.push(clause);
        }

        Ok(Self {
            raw: trimmed.to_string(),
            clauses,
        })
    }

    /// A constraint matching every version.
    pub fn any() -> Self {
        Self {
            raw: "any".to_string(),
            clauses: Vec::new(),
        }
    }

    /// Whether this constraint admits every version.
    pub fn is_any(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Whether `version` satisfies this constraint.
    pub fn matches(&self, version: &Version) -> bool {
        self.clauses.is_empty()
            || self
                .clauses
                .iter()
                .any(|clause| clause.iter().all(|c| c.matches(version)))
    }

    /// The smallest lower bound across clauses, used as the probe version
    /// when a range stands in for a concrete SDK version.
    pub fn lower_bound(&self) -> Option<Version> {
        self.clauses
            .iter()
            .filter_map(|clause| {
                // Within a conjunction the effective lower bound is the
                // largest of the tokens' bounds.
                clause.iter().filter_map(|c| c.lower_bound()).max().cloned()
            })
            .min()
    }

    /// The original expression text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for VersionConstraint {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_token(token: &str, whole: &str) -> Result<Comparator> {
    let (op, rest) = if let Some(rest) = token.strip_prefix('^') {
        ("^", rest)
    } else if let Some(rest) = token.strip_prefix(">=") {
        (">=", rest)
    } else if let Some(rest) = token.strip_prefix("<=") {
        ("<=", rest)
    } else if let Some(rest) = token.strip_prefix('>') {
        (">", rest)
    } else if let Some(rest) = token.strip_prefix('<') {
        ("<", rest)
    } else if let Some(rest) = token.strip_prefix('=') {
        ("=", rest)
    } else {
        ("", token)
    };

    let version =
        parse_version(rest).map_err(|_| ModelError::InvalidConstraint(whole.to_string()))?;

    Ok(match op {
        "^" => Comparator::Caret(version),
        ">=" => Comparator::GreaterEq(version),
        ">" => Comparator::Greater(version),
        "<=" => Comparator::LessEq(version),
        "<" => Comparator::Less(version),
        _ => Comparator::Exact(version),
    })
}
