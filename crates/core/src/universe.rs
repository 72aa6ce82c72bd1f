use crate::domain::weekly_change::Category;

const DEFAULT_ETFS: &[&str] = &[
    "XLC", "VOX", "IYZ", "FCOM", "XLY", "VCR", "IYC", "FDIS", "XLP", "VDC", "IYK", "FSTA", "XLE",
    "VDE", "IYE", "FENY", "XLF", "VFH", "IYF", "FNCL", "XLV", "VHT", "IYH", "FHLC", "XLI", "VIS",
    "IYJ", "FIDU", "XLK", "VGT", "IYW", "FTEC", "XLB", "VAW", "IYM", "FMAT", "XLRE", "VNQ", "IYR",
    "FREL", "XLU", "VPU", "IDU", "FUTY", "IBUY", "FINX", "IBB", "IDNA", "IHI", "ITA", "SOXX", "IGV",
    "CIBR", "PICK", "ICF", "ICLN", "PAVE", "IFRA", "SMH", "XBI", "XHB", "ITB", "KRE", "XOP", "GDX",
    "XAR", "HACK", "TAN",
];

const DEFAULT_COMMODITIES: &[&str] = &[
    "GC=F", "SI=F", "PL=F", "HG=F", "CL=F", "BZ=F", "NG=F", "ZC=F", "ZW=F", "ZS=F", "KC=F",
    "CC=F", "SB=F", "CT=F",
];

const DEFAULT_INDEXES: &[&str] = &[
    "^GSPC", "^DJI", "^IXIC", "^RUT", "^VIX", "^FTSE", "^GDAXI", "^N225", "^HSI", "^STOXX50E",
];

/// Which tickers belong to each category. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerUniverse {
    pub etfs: Vec<String>,
    pub commodities: Vec<String>,
    pub indexes: Vec<String>,
}

impl Default for TickerUniverse {
    fn default() -> Self {
        Self {
            etfs: owned(DEFAULT_ETFS),
            commodities: owned(DEFAULT_COMMODITIES),
            indexes: owned(DEFAULT_INDEXES),
        }
    }
}

impl TickerUniverse {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("UNIVERSE_ETFS") {
            if let Some(list) = parse_ticker_list(&s) {
                out.etfs = list;
            }
        }

        if let Ok(s) = std::env::var("UNIVERSE_COMMODITIES") {
            if let Some(list) = parse_ticker_list(&s) {
                out.commodities = list;
            }
        }

        if let Ok(s) = std::env::var("UNIVERSE_INDEXES") {
            if let Some(list) = parse_ticker_list(&s) {
                out.indexes = list;
            }
        }

        out
    }

    pub fn tickers(&self, category: Category) -> &[String] {
        match category {
            Category::Indexes => &self.indexes,
            Category::Commodities => &self.commodities,
            Category::Etfs => &self.etfs,
        }
    }

    /// All tickers across categories, in category processing order, without duplicates.
    pub fn all_tickers(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for category in Category::ALL {
            for t in self.tickers(category) {
                if !out.contains(t) {
                    out.push(t.clone());
                }
            }
        }
        out
    }
}

/// Parses a comma-separated symbol list. Returns `None` when nothing usable remains so that
/// an empty override does not wipe a category.
pub fn parse_ticker_list(s: &str) -> Option<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for part in s.split(',') {
        let t = part.trim();
        if t.is_empty() {
            continue;
        }
        let t = t.to_ascii_uppercase();
        if !out.contains(&t) {
            out.push(t);
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_dedups_ticker_list() {
        let parsed = parse_ticker_list(" xlk, SMH,,XLK , gc=f").unwrap();
        assert_eq!(parsed, vec!["XLK", "SMH", "GC=F"]);
        assert_eq!(parse_ticker_list(" , ,"), None);
    }

    #[test]
    fn default_universe_has_every_category() {
        let u = TickerUniverse::default();
        assert_eq!(u.etfs.len(), 68);
        for category in Category::ALL {
            assert!(!u.tickers(category).is_empty(), "{category} is empty");
        }
    }

    #[test]
    fn all_tickers_keeps_category_order() {
        let u = TickerUniverse {
            etfs: vec!["XLK".into(), "SPY".into()],
            commodities: vec!["GC=F".into()],
            indexes: vec!["SPY".into(), "^GSPC".into()],
        };
        assert_eq!(u.all_tickers(), vec!["SPY", "^GSPC", "GC=F", "XLK"]);
    }
}
