//! # pubdex registry client
//!
//! Typed, resilient access to the pub.dev API: seven endpoint operations
//! behind the [`RegistryOps`] trait, a composed resilience pipeline
//! (circuit breaker → retry → per-attempt timeout), and a TTL memo cache
//! with single-flight factories.

pub mod cache;
pub mod client;
pub mod decode;
pub mod error;
pub mod http;
pub mod resilience;

pub use cache::MemoCache;
pub use client::{PubDevClient, RegistryOps};
pub use decode::{DeclaredDependency, PackageDependencies};
pub use error::{RegistryError, Result};
pub use http::{Fetch, HttpResponse, ReqwestFetch};
pub use resilience::{CircuitBreaker, CircuitState, ResilientFetch, RetryPolicy};
