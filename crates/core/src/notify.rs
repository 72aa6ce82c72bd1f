use crate::config::Settings;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

/// External program run once the weekly tables are written. Its output is not inspected.
#[derive(Debug, Clone)]
pub struct Notifier {
    program: PathBuf,
    interpreter: Option<String>,
    delay: Duration,
}

impl Notifier {
    pub fn new(program: impl Into<PathBuf>, interpreter: Option<String>, delay: Duration) -> Self {
        Self {
            program: program.into(),
            interpreter,
            delay,
        }
    }

    /// `None` when NOTIFIER_PATH is not configured.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let program = settings.notifier_path.clone()?;
        Some(Self::new(
            program,
            settings.notifier_interpreter.clone(),
            settings.notifier_delay,
        ))
    }

    /// Waits `delay` so committed rows are visible to the notifier's own connection, then runs
    /// it to completion. Spawn failures are logged, never returned.
    pub async fn invoke(&self) -> Option<ExitStatus> {
        tracing::info!(delay_secs = self.delay.as_secs(), "sleeping before notifier handoff");
        tokio::time::sleep(self.delay).await;

        let mut cmd = match &self.interpreter {
            Some(interpreter) => {
                let mut c = tokio::process::Command::new(interpreter);
                c.arg(&self.program);
                c
            }
            None => tokio::process::Command::new(&self.program),
        };

        match cmd.status().await {
            Ok(status) => {
                tracing::info!(program = %self.program.display(), %status, "notifier finished");
                Some(status)
            }
            Err(err) => {
                tracing::error!(
                    program = %self.program.display(),
                    error = %err,
                    "error running notifier"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_logged_not_raised() {
        let n = Notifier::new("/nonexistent/notifier-bin", None, Duration::ZERO);
        assert!(n.invoke().await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_program_through_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("notify.sh");
        std::fs::write(&script, "exit 3\n").unwrap();

        let n = Notifier::new(&script, Some("sh".to_string()), Duration::ZERO);
        let status = n.invoke().await.unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn unconfigured_notifier_is_none() {
        let settings = Settings {
            database_url: None,
            log_file: None,
            notifier_path: None,
            notifier_interpreter: None,
            notifier_delay: Duration::from_secs(5),
            data_dir: PathBuf::from("daily_data_csv"),
            sentry_dsn: None,
            data_provider_base_url: None,
        };
        assert!(Notifier::from_settings(&settings).is_none());
    }
}
