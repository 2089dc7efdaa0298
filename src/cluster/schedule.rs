//! Cron expression checks delegated to `supercronic -test`.
//!
//! A missing checker binary degrades to accepting the expression unchecked.

use std::path::PathBuf;
use tokio::process::Command;

use super::validate::ValidationError;

pub const DEFAULT_CHECKER: &str = "supercronic";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleCheck {
    Valid,
    /// Checker unavailable, expression accepted as-is
    Unchecked,
}

#[derive(Debug, Clone)]
pub struct ScheduleValidator {
    checker: PathBuf,
}

impl Default for ScheduleValidator {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKER)
    }
}

impl ScheduleValidator {
    pub fn new(checker: impl Into<PathBuf>) -> Self {
        Self {
            checker: checker.into(),
        }
    }

    pub async fn check(&self, expression: &str) -> Result<ScheduleCheck, ValidationError> {
        let expression = expression.trim();
        let reject = |reason: &str| ValidationError::Schedule {
            expression: expression.to_string(),
            reason: reason.to_string(),
        };
        if expression.is_empty() {
            return Err(reject("expression is empty"));
        }
        if expression.contains(['\r', '\n']) {
            return Err(reject("expression must be a single line"));
        }

        let crontab = std::env::temp_dir().join(format!("clusterd-cron-{}", uuid::Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&crontab, format!("{} true\n", expression)).await {
            tracing::warn!("Could not write temporary crontab, accepting schedule unchecked: {}", e);
            return Ok(ScheduleCheck::Unchecked);
        }

        let output = Command::new(&self.checker)
            .arg("-test")
            .arg(&crontab)
            .output()
            .await;
        let _ = tokio::fs::remove_file(&crontab).await;

        match output {
            Ok(output) if output.status.success() => Ok(ScheduleCheck::Valid),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let stdout = String::from_utf8_lossy(&output.stdout);
                let detail = if stderr.trim().is_empty() { stdout } else { stderr };
                Err(reject(detail.trim()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    checker = %self.checker.display(),
                    "Schedule checker not installed, accepting '{}' unchecked",
                    expression
                );
                Ok(ScheduleCheck::Unchecked)
            }
            Err(e) => Err(reject(&format!("failed to run checker: {}", e))),
        }
    }
}
