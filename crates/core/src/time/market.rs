use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::HashSet;

/// Resolves the reference date ("last Friday" in a normal weekly run).
///
/// An explicit `YYYY-MM-DD` argument wins. Otherwise the job treats the previous UTC calendar
/// day as the most recent completed session and rolls back over weekends and holidays.
pub fn resolve_reference_date(
    as_of_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?);
    }

    let mut date = now_utc.date_naive() - Duration::days(1);

    let holidays = configured_holidays();
    while is_weekend(date) || holidays.contains(&date) {
        date = date - Duration::days(1);
    }

    Ok(date)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}

fn configured_holidays() -> HashSet<NaiveDate> {
    // Fixed-date closures only. Extend via MARKET_HOLIDAYS="YYYY-MM-DD,YYYY-MM-DD".
    let mut out = HashSet::new();
    let years = [2024, 2025, 2026, 2027, 2028, 2029, 2030];
    for y in years {
        if let Some(d) = NaiveDate::from_ymd_opt(y, 1, 1) {
            out.insert(d);
        }
        if let Some(d) = NaiveDate::from_ymd_opt(y, 12, 25) {
            out.insert(d);
        }
    }

    if let Ok(s) = std::env::var("MARKET_HOLIDAYS") {
        out.extend(parse_holiday_list(&s));
    }

    out
}

fn parse_holiday_list(s: &str) -> Vec<NaiveDate> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| NaiveDate::parse_from_str(part, "%Y-%m-%d").ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn saturday_run_lands_on_friday() {
        // 2025-11-29 is Saturday.
        let now = Utc.with_ymd_and_hms(2025, 11, 29, 9, 0, 0).unwrap();
        let d = resolve_reference_date(None, now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 11, 28).unwrap());
    }

    #[test]
    fn monday_run_rolls_back_over_weekend() {
        let now = Utc.with_ymd_and_hms(2025, 12, 1, 9, 0, 0).unwrap();
        let d = resolve_reference_date(None, now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 11, 28).unwrap());
    }

    #[test]
    fn skips_christmas() {
        // 2025-12-26 (Friday) run: previous day is Christmas, then Wednesday.
        let now = Utc.with_ymd_and_hms(2025, 12, 26, 9, 0, 0).unwrap();
        let d = resolve_reference_date(None, now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 12, 24).unwrap());
    }

    #[test]
    fn explicit_date_is_not_adjusted() {
        let now = Utc.with_ymd_and_hms(2025, 12, 1, 9, 0, 0).unwrap();
        let d = resolve_reference_date(Some("2025-11-30"), now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 11, 30).unwrap());
        assert!(resolve_reference_date(Some("30/11/2025"), now).is_err());
    }

    #[test]
    fn holiday_list_ignores_garbage() {
        let parsed = parse_holiday_list(" 2025-07-04, ,nope,2025-11-27");
        assert_eq!(
            parsed,
            vec![
                NaiveDate::from_ymd_opt(2025, 7, 4).unwrap(),
                NaiveDate::from_ymd_opt(2025, 11, 27).unwrap(),
            ]
        );
    }
}
