use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use pricewatch_core::config::Settings;
use pricewatch_core::domain::weekly_change::{Category, ReportDates};
use pricewatch_core::ingest::provider::YahooChartProvider;
use pricewatch_core::notify::Notifier;
use pricewatch_core::storage::pg::PgStore;
use pricewatch_core::storage::MarketStore;
use pricewatch_core::universe::{self, TickerUniverse};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const TOP_MOVERS: usize = 3;

#[derive(Debug, Parser)]
#[command(name = "pricewatch_worker")]
struct Args {
    /// Reference date (YYYY-MM-DD). Defaults to the last completed weekday.
    #[arg(long, global = true)]
    as_of_date: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch bars from the provider into the intermediate CSV for --start.
    Download(FetchArgs),
    /// Insert the intermediate CSV for --start into the price table.
    Load {
        #[arg(long)]
        start: String,
    },
    /// Download then load.
    Ingest(FetchArgs),
    /// Compute the price table's weekly_change for the reference date.
    BackfillWeekly,
    /// Rank weekly snapshots, back-fill four-week changes, then run the notifier.
    Weekly {
        /// Resolve dates and universe without touching the database.
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, ClapArgs)]
struct FetchArgs {
    /// First date to fetch (YYYY-MM-DD); also names the intermediate file.
    #[arg(long)]
    start: String,

    /// Exclusive end date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,

    /// Restrict to one category: etfs, commodities, indexes or all.
    #[arg(long, default_value = "all")]
    category: String,

    /// Explicit comma-separated tickers; overrides --category.
    #[arg(long)]
    tickers: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);
    init_tracing(&settings)?;

    let args = Args::parse();
    let universe = TickerUniverse::from_env();

    match args.command {
        Command::Download(fetch) => {
            run_download(&settings, &universe, &fetch).await?;
        }
        Command::Load { start } => {
            let start = parse_date(&start)?;
            run_load(&settings, start).await?;
        }
        Command::Ingest(fetch) => {
            if run_download(&settings, &universe, &fetch).await?.is_some() {
                run_load(&settings, parse_date(&fetch.start)?).await?;
            }
        }
        Command::BackfillWeekly => {
            let dates = resolve_dates(args.as_of_date.as_deref())?;
            let store = PgStore::connect(settings.require_database_url()?).await?;
            let res = pricewatch_core::weekly::change::backfill_weekly_change(
                &store,
                &universe.all_tickers(),
                dates,
            )
            .await;
            store.close().await;
            if let Err(err) = res {
                report_failure(&err, "weekly change backfill failed");
            }
        }
        Command::Weekly { dry_run } => {
            let dates = resolve_dates(args.as_of_date.as_deref())?;
            if dry_run {
                tracing::info!(
                    reference_date = %dates.reference,
                    one_week_lookback = %dates.one_week_lookback,
                    four_week_lookback = %dates.four_week_lookback,
                    indexes = universe.indexes.len(),
                    commodities = universe.commodities.len(),
                    etfs = universe.etfs.len(),
                    dry_run = true,
                    "weekly run (dry-run)"
                );
                return Ok(());
            }
            run_weekly(&settings, &universe, dates).await?;
        }
    }

    Ok(())
}

async fn run_download(
    settings: &Settings,
    universe: &TickerUniverse,
    fetch: &FetchArgs,
) -> anyhow::Result<Option<pricewatch_core::ingest::DownloadOutcome>> {
    let start = parse_date(&fetch.start)?;
    let end = match fetch.end.as_deref() {
        Some(s) => parse_date(s)?,
        None => chrono::Utc::now().date_naive(),
    };
    let tickers = select_tickers(universe, &fetch.category, fetch.tickers.as_deref())?;

    tracing::info!(%start, %end, tickers = tickers.len(), "downloading price bars");
    let provider = YahooChartProvider::from_settings(settings)?;
    Ok(pricewatch_core::ingest::download(&provider, &tickers, start, end, &settings.data_dir).await)
}

async fn run_load(settings: &Settings, start: NaiveDate) -> anyhow::Result<()> {
    let store = match PgStore::connect(settings.require_database_url()?).await {
        Ok(store) => store,
        Err(err) => {
            report_failure(&err, "price table population failed");
            return Ok(());
        }
    };
    pricewatch_core::ingest::load(&store, start, &settings.data_dir).await;
    store.close().await;
    Ok(())
}

async fn run_weekly(
    settings: &Settings,
    universe: &TickerUniverse,
    dates: ReportDates,
) -> anyhow::Result<()> {
    let store = PgStore::connect(settings.require_database_url()?).await?;
    let notifier = Notifier::from_settings(settings);

    let res = pricewatch_core::weekly::pipeline::run_weekly_and_notify(
        &store,
        universe,
        dates,
        notifier.as_ref(),
    )
    .await;

    match res {
        Ok(report) => {
            for c in &report.categories {
                tracing::info!(
                    category = %c.category,
                    snapshot_rows = c.snapshot_rows,
                    four_week_updated = c.four_week.updated.len(),
                    bad_tickers = c.four_week.bad.len(),
                    no_snapshot_row = c.four_week.no_target_row.len(),
                    "weekly summary"
                );
            }
            if let Err(err) = log_top_movers(&store, dates).await {
                tracing::warn!(error = %format!("{err:#}"), "failed to read back weekly snapshot");
            }
        }
        Err(err) => report_failure(&err, "weekly change run failed"),
    }

    store.close().await;
    Ok(())
}

async fn log_top_movers(store: &PgStore, dates: ReportDates) -> anyhow::Result<()> {
    for category in Category::ALL {
        let records = store.change_records(category, dates.reference).await?;
        for (rank, r) in records.iter().take(TOP_MOVERS).enumerate() {
            tracing::info!(
                %category,
                rank = rank + 1,
                ticker = %r.ticker,
                one_week = r.one_week_pct_change,
                four_week = ?r.four_week_pct_change,
                "top mover"
            );
        }
    }
    Ok(())
}

fn select_tickers(
    universe: &TickerUniverse,
    category: &str,
    explicit: Option<&str>,
) -> anyhow::Result<Vec<String>> {
    if let Some(s) = explicit {
        return universe::parse_ticker_list(s).context("--tickers must name at least one ticker");
    }
    if category.trim().eq_ignore_ascii_case("all") {
        return Ok(universe.all_tickers());
    }
    let category: Category = category.parse()?;
    Ok(universe.tickers(category).to_vec())
}

fn resolve_dates(as_of_date_arg: Option<&str>) -> anyhow::Result<ReportDates> {
    let reference =
        pricewatch_core::time::market::resolve_reference_date(as_of_date_arg, chrono::Utc::now())?;
    Ok(ReportDates::for_reference(reference))
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").with_context(|| format!("invalid date: {s}"))
}

fn report_failure(err: &anyhow::Error, message: &str) {
    sentry_anyhow::capture_anyhow(err);
    tracing::error!(error = %format!("{err:#}"), "{message}");
}

fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let file_layer = match &settings.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open LOG_FILE {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .with(sentry_tracing::layer())
        .init();
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> TickerUniverse {
        TickerUniverse {
            etfs: vec!["XLK".into()],
            commodities: vec!["GC=F".into()],
            indexes: vec!["^GSPC".into()],
        }
    }

    #[test]
    fn selects_tickers_by_category_or_explicit_list() {
        let u = universe();
        assert_eq!(select_tickers(&u, "etfs", None).unwrap(), vec!["XLK"]);
        assert_eq!(
            select_tickers(&u, "ALL", None).unwrap(),
            vec!["^GSPC", "GC=F", "XLK"]
        );
        assert_eq!(
            select_tickers(&u, "etfs", Some("iren, cifr")).unwrap(),
            vec!["IREN", "CIFR"]
        );
        assert!(select_tickers(&u, "bonds", None).is_err());
        assert!(select_tickers(&u, "all", Some(" , ")).is_err());
    }

    #[test]
    fn parses_cli_subcommands() {
        let args = Args::parse_from([
            "pricewatch_worker",
            "--as-of-date",
            "2025-11-28",
            "weekly",
            "--dry-run",
        ]);
        assert_eq!(args.as_of_date.as_deref(), Some("2025-11-28"));
        assert!(matches!(args.command, Command::Weekly { dry_run: true }));

        let args = Args::parse_from(["pricewatch_worker", "download", "--start", "2025-10-28"]);
        match args.command {
            Command::Download(f) => {
                assert_eq!(f.start, "2025-10-28");
                assert_eq!(f.category, "all");
                assert!(f.end.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
