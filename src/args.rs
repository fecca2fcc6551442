use clap::Parser;
use std::path::PathBuf;

use crate::codec::DEFAULT_PATTERN;
use crate::filter::FilterMode;
use crate::listing::{Listing, DEFAULT_LIMIT, DEFAULT_PAGE};

#[derive(Parser, Debug)]
#[command(
    name = "epistat",
    about = "Aggregate disease occurrence statistics by overall, year, month or day",
    version,
    long_about = None
)]
pub struct Args {
    /// Statistics granularity to query
    #[arg(short, long, value_enum, default_value_t = FilterMode::All)]
    pub mode: FilterMode,

    /// Year to filter on (year and month modes; empty means all years)
    #[arg(short, long)]
    pub year: Option<String>,

    /// Two-digit month to filter on (month mode)
    #[arg(long)]
    pub month: Option<String>,

    /// Range start as YYYYMMDD (day mode or prediction list)
    #[arg(long)]
    pub start: Option<String>,

    /// Range end as YYYYMMDD (day mode or prediction list)
    #[arg(long)]
    pub end: Option<String>,

    /// List occurrence or prediction records instead of statistics
    #[arg(short, long, value_enum)]
    pub list: Option<Listing>,

    /// Page of a paginated listing
    #[arg(long, default_value_t = DEFAULT_PAGE)]
    pub page: u32,

    /// Rows per page of a paginated listing
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: u32,

    /// Disease name to filter a listing on
    #[arg(long)]
    pub disease: Option<String>,

    /// Farm name to filter the occurrence list on
    #[arg(long)]
    pub farm: Option<String>,

    /// Livestock species to filter the occurrence list on
    #[arg(long)]
    pub species: Option<String>,

    /// Single date as YYYYMMDD (occurrence date or prediction date)
    #[arg(long)]
    pub date: Option<String>,

    /// Region to filter the prediction list on
    #[arg(long)]
    pub region: Option<String>,

    /// Risk level to filter the prediction list on (e.g. high, medium, low)
    #[arg(long)]
    pub risk: Option<String>,

    /// Minimum prediction confidence
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Only predictions for upcoming dates
    #[arg(long)]
    pub upcoming: bool,

    /// Directory holding captured by-disease/by-year/by-month/by-day responses
    #[arg(short, long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Number of top diseases to display
    #[arg(short, long)]
    pub top: Option<usize>,

    /// Number of bottom diseases to display
    #[arg(long)]
    pub bottom: Option<usize>,

    /// Also print the rows as delivered, per period
    #[arg(long)]
    pub detail: bool,

    /// Pattern used to display dates, e.g. yyyy-MM-dd or yyyy/MM/dd
    #[arg(long, default_value = DEFAULT_PATTERN)]
    pub date_format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
