//! Utility functions shared across the codebase.

use std::sync::LazyLock;

use if_addrs::IfAddr;

/// Regex pattern for validating identifiers (node names, queue names)
static VALID_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new("^[a-zA-Z0-9_.:-]*$").expect("Invalid regex pattern"));

/// Validate a string contains only allowed characters
///
/// Allowed characters: alphanumeric, underscore, dot, colon, hyphen
///
/// # Examples
///
/// ```
/// use logmesh_common::is_valid;
///
/// assert!(is_valid("node-1"));
/// assert!(is_valid("10.0.0.2:8648"));
/// assert!(!is_valid("invalid/name"));
/// assert!(!is_valid("with spaces"));
/// ```
pub fn is_valid(str: &str) -> bool {
    VALID_PATTERN.is_match(str)
}

/// Get the local IP address
///
/// Returns the first non-loopback IPv4 address found,
/// or "127.0.0.1" as fallback.
pub fn local_ip() -> String {
    if_addrs::get_if_addrs()
        .ok()
        .and_then(|addrs| {
            addrs
                .into_iter()
                .find(|iface| !iface.is_loopback() && matches!(iface.addr, IfAddr::V4(_)))
                .and_then(|iface| match iface.addr {
                    IfAddr::V4(addr) => Some(addr.ip.to_string()),
                    _ => None,
                })
        })
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_identifiers() {
        assert!(is_valid("abc123"));
        assert!(is_valid("node_a"));
        assert!(is_valid("node-a.internal:8648"));
        assert!(is_valid(""));
    }

    #[test]
    fn test_is_valid_rejects() {
        assert!(!is_valid("a b"));
        assert!(!is_valid("a/b"));
        assert!(!is_valid("a@b"));
    }

    #[test]
    fn test_local_ip_never_empty() {
        assert!(!local_ip().is_empty());
    }
}
