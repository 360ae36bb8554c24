//! # pubdex domain model
//!
//! Immutable value objects shared across the pubdex MCP server: package
//! summaries and details, version metadata, SDK constraint expressions,
//! compatibility evaluations, dependency graphs, score insights, and audit
//! entries.
//!
//! Every entity validates its invariants at construction and exposes only
//! getters; decoding goes through the same constructors, so a value that
//! exists is a value that holds.

pub mod audit;
pub mod compat;
pub mod constraint;
pub mod error;
pub mod graph;
pub mod package;
pub mod search;
pub mod validate;
pub mod version;

pub use audit::AuditLogEntry;
pub use compat::{CompatibilityRequest, CompatibilityResult, MAX_EVALUATED_VERSIONS};
pub use constraint::VersionConstraint;
pub use error::{ModelError, Result};
pub use graph::{DependencyGraph, DependencyNode};
pub use package::{PackageDetails, PackageSummary, ScoreInsight};
pub use search::{SearchResultSet, MAX_SEARCH_RESULTS};
pub use version::{parse_version, VersionDetail};
