//! Audit log entries with payload digests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// One audited tool execution, identified by payload digests rather than the
/// payloads themselves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    timestamp: DateTime<Utc>,
    tool: String,
    request_digest: String,
    response_digest: String,
}

impl AuditLogEntry {
    /// Record a tool execution, hashing both JSON payloads.
    pub fn new(tool: impl Into<String>, request: &Value, response: &Value) -> Self {
        Self {
            timestamp: Utc::now(),
            tool: tool.into(),
            request_digest: digest(request),
            response_digest: digest(response),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Hex SHA-256 of the request payload.
    pub fn request_digest(&self) -> &str {
        &self.request_digest
    }

    /// Hex SHA-256 of the response payload.
    pub fn response_digest(&self) -> &str {
        &self.response_digest
    }
}

/// Hex SHA-256 over a JSON value's compact encoding
pub fn digest(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_digest_is_hex_sha256() {
        let d = digest(&json!({"package": "http"}));
        assert_eq!(d.len(), 64);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_digest_is_deterministic() {
        let a = digest(&json!({"query": "http client"}));
        let b = digest(&json!({"query": "http client"}));
        assert_eq!(a, b);
        assert_ne!(a, digest(&json!({"query": "other"})));
    }

    #[test]
    fn test_entry_carries_both_digests() {
        let entry = AuditLogEntry::new(
            "search_packages",
            &json!({"query": "http"}),
            &json!({"packages": []}),
        );
        assert_eq!(entry.tool(), "search_packages");
        assert_ne!(entry.request_digest(), entry.response_digest());
    }

    #[test]
    fn test_round_trip() {
        let entry = AuditLogEntry::new("latest_version", &json!({"package": "http"}), &json!({}));
        let json = serde_json::to_string(&entry).unwrap();
        let back: AuditLogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
