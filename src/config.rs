//! Export settings for a transform pass

use serde::{Deserialize, Serialize};

/// Triple count above which the buffer is flushed mid-row
pub const DEFAULT_EXPORT_LIMIT: usize = 10_737_418;

/// What a pass does when a root node fails to evaluate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Stop visiting at the first failing row or record
    #[default]
    FailFast,
    /// Log the failure, record it in the pass summary and keep going
    SkipAndCollect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Flush threshold in triples, `0` disables mid-row flushes
    pub export_limit: usize,
    /// Maximum rows or records to visit, `0` visits all of them
    pub item_limit: usize,
    pub error_policy: ErrorPolicy,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_limit: DEFAULT_EXPORT_LIMIT,
            item_limit: 0,
            error_policy: ErrorPolicy::FailFast,
        }
    }
}

impl ExportConfig {
    pub fn with_export_limit(mut self, export_limit: usize) -> Self {
        self.export_limit = export_limit;
        self
    }

    pub fn with_item_limit(mut self, item_limit: usize) -> Self {
        self.item_limit = item_limit;
        self
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    /// Whether `size` buffered triples call for a flush
    pub fn exceeds_export_limit(&self, size: usize) -> bool {
        self.export_limit != 0 && size > self.export_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_limit_is_unlimited() {
        let config = ExportConfig::default().with_export_limit(0);
        assert!(!config.exceeds_export_limit(usize::MAX));
    }

    #[test]
    fn test_limit_is_exclusive() {
        let config = ExportConfig::default().with_export_limit(10);
        assert!(!config.exceeds_export_limit(10));
        assert!(config.exceeds_export_limit(11));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ExportConfig =
            serde_json::from_str(r#"{ "error_policy": "skip-and-collect" }"#).unwrap();
        assert_eq!(config.export_limit, DEFAULT_EXPORT_LIMIT);
        assert_eq!(config.error_policy, ErrorPolicy::SkipAndCollect);
    }
}
