pub mod args;
pub mod codec;
pub mod dashboard;
pub mod filter;
pub mod listing;
pub mod picker;
pub mod record;
pub mod report;
pub mod source;
pub mod stats;
pub mod utils;

pub use args::Args;
pub use dashboard::{Dashboard, DashboardEvent, ViewState};
pub use report::analyze_statistics;
pub use stats::{aggregate, AggregatedStat, StatsSummary};
