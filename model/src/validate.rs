//! Input validation rules for the tool boundary
//!
//! Package names, publisher ids, and search queries are validated here once;
//! downstream layers assume pre-validated inputs.

use crate::error::{ModelError, Result};

/// Maximum accepted search query length after trimming
pub const MAX_QUERY_LEN: usize = 80;

/// Validate a pub.dev package name: lowercase letters, digits, underscores.
pub fn package_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ModelError::invalid("package", "must not be empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ModelError::invalid(
            "package",
            format!("'{name}' must match [a-z0-9_]+"),
        ));
    }
    Ok(())
}

/// Validate a publisher id: lowercase letters, digits, dots, underscores, dashes.
pub fn publisher_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(ModelError::invalid("publisher", "must not be empty"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '_' || c == '-')
    {
        return Err(ModelError::invalid(
            "publisher",
            format!("'{id}' must match [a-z0-9._-]+"),
        ));
    }
    Ok(())
}

/// Validate a search query. Returns the trimmed query on success.
pub fn query(q: &str) -> Result<String> {
    let trimmed = q.trim();
    if trimmed.is_empty() {
        return Err(ModelError::invalid("query", "must not be empty"));
    }
    if trimmed.len() > MAX_QUERY_LEN {
        return Err(ModelError::invalid(
            "query",
            format!("must be at most {MAX_QUERY_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name_valid() {
        assert!(package_name("http").is_ok());
        assert!(package_name("flutter_bloc").is_ok());
        assert!(package_name("json_annotation2").is_ok());
    }

    #[test]
    fn test_package_name_invalid() {
        assert!(package_name("").is_err());
        assert!(package_name("Http").is_err());
        assert!(package_name("my-package").is_err());
        assert!(package_name("pkg name").is_err());
        assert!(package_name("pkg.name").is_err());
    }

    #[test]
    fn test_publisher_id_valid() {
        assert!(publisher_id("dart.dev").is_ok());
        assert!(publisher_id("tools.dart.dev").is_ok());
        assert!(publisher_id("my-org_2").is_ok());
    }

    #[test]
    fn test_publisher_id_invalid() {
        assert!(publisher_id("").is_err());
        assert!(publisher_id("Dart.Dev").is_err());
        assert!(publisher_id("dart dev").is_err());
    }

    #[test]
    fn test_query_trimming_and_bounds() {
        assert_eq!(query("  http client ").unwrap(), "http client");
        assert!(query("   ").is_err());
        assert!(query(&"x".repeat(81)).is_err());
        assert!(query(&"x".repeat(80)).is_ok());
    }
}
