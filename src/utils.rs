use anyhow::Context;
use time::macros::format_description;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::codec::{self, DateFormat};
use crate::filter::{self, FilterMode};
use crate::listing::Listing;

pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let timer = LocalTime::new(format_description!("[hour]:[minute]:[second].[subsecond digits:3]"));

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn format_number(num: u64) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Renders a compact date with `format`, or `-` when missing. Values that are
/// not compact dates are shown unchanged.
pub fn display_date(compact: Option<&str>, format: &DateFormat) -> String {
    match compact {
        None | Some("") => "-".to_string(),
        Some(value) => codec::decode(value)
            .map(|date| format.format(date))
            .unwrap_or_else(|_| value.to_string()),
    }
}

pub fn validate_args(args: &Args) -> anyhow::Result<()> {
    if let Some(top) = args.top {
        if top == 0 {
            anyhow::bail!("--top must be greater than 0");
        }
    }

    if let Some(bottom) = args.bottom {
        if bottom == 0 {
            anyhow::bail!("--bottom must be greater than 0");
        }
    }

    if args.start.is_some() != args.end.is_some() {
        anyhow::bail!("--start and --end must be given together");
    }

    if args.start.is_some() && args.mode != FilterMode::Day && args.list != Some(Listing::Predictions) {
        anyhow::bail!("--start/--end are only used with --mode day or --list predictions");
    }

    validate_listing_args(args)?;

    if let Some(year) = &args.year {
        if !matches!(args.mode, FilterMode::Year | FilterMode::Month) {
            anyhow::bail!("--year is only used with --mode year or --mode month");
        }
        if !year.is_empty() && (year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit())) {
            anyhow::bail!("--year must be a 4-digit year, got {:?}", year);
        }
    }

    if let Some(month) = &args.month {
        if args.mode != FilterMode::Month {
            anyhow::bail!("--month is only used with --mode month");
        }
        if !month.is_empty() && !filter::month_options().contains(month) {
            anyhow::bail!("--month must be between 01 and 12, got {:?}", month);
        }
    }

    Ok(())
}

fn validate_listing_args(args: &Args) -> anyhow::Result<()> {
    if args.page == 0 {
        anyhow::bail!("--page must be greater than 0");
    }
    if args.limit == 0 {
        anyhow::bail!("--limit must be greater than 0");
    }

    let occurrence_filters = args.farm.is_some() || args.species.is_some();
    let prediction_filters =
        args.region.is_some() || args.risk.is_some() || args.min_confidence.is_some() || args.upcoming;

    match args.list {
        None => {
            if occurrence_filters || prediction_filters || args.disease.is_some() || args.date.is_some() {
                anyhow::bail!("Listing filters are only used with --list");
            }
        }
        Some(Listing::Occurrences) => {
            if prediction_filters {
                anyhow::bail!("--region/--risk/--min-confidence/--upcoming are only used with --list predictions");
            }
        }
        Some(Listing::Predictions) => {
            if occurrence_filters {
                anyhow::bail!("--farm/--species are only used with --list occurrences");
            }
        }
        Some(Listing::PredictionsByDisease) | Some(Listing::PredictionsByDate) => {
            if occurrence_filters || prediction_filters {
                anyhow::bail!("Grouped prediction listings only take --disease or --date");
            }
        }
    }

    if let Some(min) = args.min_confidence {
        if !(0.0..=100.0).contains(&min) {
            anyhow::bail!("--min-confidence must be between 0 and 100, got {}", min);
        }
    }

    if let Some(date) = args.date.as_deref().filter(|d| !d.is_empty()) {
        codec::decode(date).with_context(|| format!("Invalid --date {:?}", date))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("epistat").chain(argv.iter().copied()))
    }

    #[test]
    fn formats_thousands() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn displays_dates() {
        let format = DateFormat::new("yyyy/MM/dd");
        assert_eq!(display_date(Some("20240301"), &format), "2024/03/01");
        assert_eq!(display_date(None, &format), "-");
        assert_eq!(display_date(Some("n/a"), &format), "n/a");
    }

    #[test]
    fn accepts_valid_combinations() {
        assert!(validate_args(&parse(&[])).is_ok());
        assert!(validate_args(&parse(&["--mode", "month", "--year", "2023", "--month", "07"])).is_ok());
        assert!(validate_args(&parse(&["--mode", "day", "--start", "20240101", "--end", "20240131"])).is_ok());
        assert!(validate_args(&parse(&["--mode", "year", "--year", ""])).is_ok());
    }

    #[test]
    fn rejects_invalid_combinations() {
        assert!(validate_args(&parse(&["--top", "0"])).is_err());
        assert!(validate_args(&parse(&["--mode", "day", "--start", "20240101"])).is_err());
        assert!(validate_args(&parse(&["--start", "20240101", "--end", "20240102"])).is_err());
        assert!(validate_args(&parse(&["--year", "2024"])).is_err());
        assert!(validate_args(&parse(&["--mode", "year", "--year", "24"])).is_err());
        assert!(validate_args(&parse(&["--mode", "month", "--month", "13"])).is_err());
        assert!(validate_args(&parse(&["--mode", "year", "--month", "01"])).is_err());
    }

    #[test]
    fn listing_flags_follow_the_listing() {
        assert!(validate_args(&parse(&["--list", "occurrences", "--farm", "Green Hill", "--page", "2"])).is_ok());
        assert!(validate_args(&parse(&["--list", "predictions", "--start", "20240101", "--end", "20240131", "--upcoming"])).is_ok());
        assert!(validate_args(&parse(&["--list", "predictions-by-date", "--date", "20240315"])).is_ok());

        assert!(validate_args(&parse(&["--farm", "Green Hill"])).is_err());
        assert!(validate_args(&parse(&["--list", "occurrences", "--risk", "high"])).is_err());
        assert!(validate_args(&parse(&["--list", "predictions", "--species", "pig"])).is_err());
        assert!(validate_args(&parse(&["--list", "occurrences", "--page", "0"])).is_err());
        assert!(validate_args(&parse(&["--list", "predictions", "--min-confidence", "150"])).is_err());
        assert!(validate_args(&parse(&["--list", "predictions-by-date", "--date", "20240230"])).is_err());
    }
}
