//! Log data models: entries as stored locally and the query bounds applied
//! to them.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

/// Severity of a stored log entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

/// Immutable log entry value
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub logger: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub message: String,
}

impl LogEntry {
    pub fn new(
        level: LogLevel,
        logger: impl Into<String>,
        timestamp: i64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            logger: logger.into(),
            timestamp,
            message: message.into(),
        }
    }
}

/// Timestamp filter with optional strict bounds on both sides.
///
/// Omitting a bound removes that side of the filter entirely.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    /// Only entries with timestamp strictly greater than this
    pub newer_than: Option<i64>,
    /// Only entries with timestamp strictly less than this
    pub older_than: Option<i64>,
}

impl LogQuery {
    /// Query matching every entry
    pub fn all() -> Self {
        Self::default()
    }

    pub fn newer_than(timestamp: i64) -> Self {
        Self {
            newer_than: Some(timestamp),
            older_than: None,
        }
    }

    pub fn older_than(timestamp: i64) -> Self {
        Self {
            newer_than: None,
            older_than: Some(timestamp),
        }
    }

    pub fn between(newer_than: i64, older_than: i64) -> Self {
        Self {
            newer_than: Some(newer_than),
            older_than: Some(older_than),
        }
    }

    /// Both bounds strict: `newer_than < timestamp < older_than`
    pub fn matches(&self, timestamp: i64) -> bool {
        if let Some(lower) = self.newer_than
            && timestamp <= lower
        {
            return false;
        }
        if let Some(upper) = self.older_than
            && timestamp >= upper
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_no_bounds_matches_everything() {
        let query = LogQuery::all();
        assert!(query.matches(i64::MIN));
        assert!(query.matches(0));
        assert!(query.matches(i64::MAX));
    }

    #[test]
    fn test_query_bounds_are_strict() {
        let query = LogQuery::newer_than(100);
        assert!(!query.matches(100));
        assert!(query.matches(101));

        let query = LogQuery::between(100, 200);
        assert!(!query.matches(100));
        assert!(query.matches(101));
        assert!(query.matches(199));
        assert!(!query.matches(200));
    }

    #[test]
    fn test_log_entry_json_shape() {
        let entry = LogEntry::new(LogLevel::Warn, "cluster", 1_700_000_000_000, "slow peer");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"level\":\"WARN\""));
        assert!(json.contains("\"timestamp\":1700000000000"));

        let parsed: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }
}
