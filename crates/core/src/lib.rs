pub mod domain;
pub mod ingest;
pub mod notify;
pub mod storage;
pub mod time;
pub mod universe;
pub mod weekly;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;
    use std::time::Duration;

    const DEFAULT_DATA_DIR: &str = "daily_data_csv";
    const DEFAULT_NOTIFIER_DELAY_SECS: u64 = 5;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub log_file: Option<PathBuf>,
        pub notifier_path: Option<PathBuf>,
        pub notifier_interpreter: Option<String>,
        pub notifier_delay: Duration,
        pub data_dir: PathBuf,
        pub sentry_dsn: Option<String>,
        pub data_provider_base_url: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let notifier_delay_secs = match non_empty_var("NOTIFIER_DELAY_SECS") {
                Some(s) => s
                    .parse::<u64>()
                    .with_context(|| format!("NOTIFIER_DELAY_SECS must be an integer (got {s})"))?,
                None => DEFAULT_NOTIFIER_DELAY_SECS,
            };

            Ok(Self {
                database_url: non_empty_var("DATABASE_URL"),
                log_file: non_empty_var("LOG_FILE").map(PathBuf::from),
                notifier_path: non_empty_var("NOTIFIER_PATH").map(PathBuf::from),
                notifier_interpreter: non_empty_var("NOTIFIER_INTERPRETER"),
                notifier_delay: Duration::from_secs(notifier_delay_secs),
                data_dir: non_empty_var("DAILY_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                data_provider_base_url: non_empty_var("DATA_PROVIDER_BASE_URL"),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}
