//! Search result sets

use crate::error::{ModelError, Result};
use crate::package::PackageSummary;
use crate::validate;
use serde::{Deserialize, Serialize};

/// Maximum packages carried in a single search result
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Outcome of a package search, capped at ten entries in upstream order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSearchResultSet", rename_all = "camelCase")]
pub struct SearchResultSet {
    query: String,
    packages: Vec<PackageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    more_results_hint: Option<String>,
}

impl SearchResultSet {
    pub fn new(
        query: impl Into<String>,
        packages: Vec<PackageSummary>,
        more_results_hint: Option<String>,
    ) -> Result<Self> {
        let query = validate::query(&query.into())?;
        if packages.is_empty() {
            return Err(ModelError::invalid(
                "packages",
                "a search result carries at least one package",
            ));
        }
        if packages.len() > MAX_SEARCH_RESULTS {
            return Err(ModelError::invalid(
                "packages",
                format!("at most {MAX_SEARCH_RESULTS} packages per search result"),
            ));
        }

        Ok(Self {
            query,
            packages,
            more_results_hint,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn packages(&self) -> &[PackageSummary] {
        &self.packages
    }

    pub fn more_results_hint(&self) -> Option<&str> {
        self.more_results_hint.as_deref()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSearchResultSet {
    query: String,
    packages: Vec<PackageSummary>,
    #[serde(default)]
    more_results_hint: Option<String>,
}

impl TryFrom<RawSearchResultSet> for SearchResultSet {
    type Error = ModelError;

    fn try_from(raw: RawSearchResultSet) -> Result<Self> {
        SearchResultSet::new(raw.query, raw.packages, raw.more_results_hint)
    }
}
