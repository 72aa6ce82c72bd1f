use chrono::NaiveDate;
use std::fmt;

/// Why a single ticker could not get a percentage change.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeError {
    MissingBar { date: NaiveDate },
    ZeroBaseClose { date: NaiveDate },
    NonFinite { value: f64 },
}

impl fmt::Display for ChangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeError::MissingBar { date } => write!(f, "no price bar on {date}"),
            ChangeError::ZeroBaseClose { date } => write!(f, "comparison close on {date} is zero"),
            ChangeError::NonFinite { value } => write!(f, "change is not finite ({value})"),
        }
    }
}

impl std::error::Error for ChangeError {}

/// A ticker skipped by a per-ticker loop.
#[derive(Debug, Clone, PartialEq)]
pub struct BadTicker {
    pub ticker: String,
    pub reason: ChangeError,
}
