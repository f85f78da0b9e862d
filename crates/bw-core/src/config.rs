//! Workflow configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Seconds between background status refreshes.
    pub poll_interval_secs: u64,
    /// Seconds polling stays suppressed after marking messages read.
    pub read_cooldown_secs: u64,
    /// Restore the previous status when a transition's API call fails.
    pub rollback_on_failure: bool,
    /// Send notifications and tracking tasks to the counterparty.
    pub notify_counterparty: bool,
    pub request_timeout_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            read_cooldown_secs: 5,
            rollback_on_failure: true,
            notify_counterparty: true,
            request_timeout_secs: 30,
        }
    }
}

impl WorkflowConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(Error::config("poll_interval_secs must be positive"));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be positive"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn read_cooldown(&self) -> Duration {
        Duration::from_secs(self.read_cooldown_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"poll_interval_secs": 30, "rollback_on_failure": false}}"#).unwrap();

        let config = WorkflowConfig::from_file(file.path()).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert!(!config.rollback_on_failure);
        assert_eq!(config.read_cooldown(), Duration::from_secs(5));
        assert!(config.notify_counterparty);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"poll_interval_secs": 0}}"#).unwrap();

        assert!(matches!(WorkflowConfig::from_file(file.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            WorkflowConfig::from_file("/nonexistent/bw.json"),
            Err(Error::Io(_))
        ));
    }
}
