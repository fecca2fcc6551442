use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tracing::error;

use epistat::{
    report::{print_analysis_results, print_listing},
    source::JsonDirSource,
    utils::{setup_logging, validate_args},
    Args, ViewState,
};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    validate_args(&args)?;

    let today = Local::now().date_naive();
    let source = JsonDirSource::new(args.data_dir.clone());

    if args.list.is_some() {
        if let Err(e) = print_listing(&args, &source) {
            error!(action = "list", component = "main", error = %e, "Error");
            std::process::exit(1);
        }
        return Ok(());
    }

    match epistat::analyze_statistics(&args, today, &source) {
        Ok(ViewState::Ready(view)) => {
            print_analysis_results(&view, &args);
            Ok(())
        }
        Ok(ViewState::Idle) => {
            println!("No statistics request is active for this filter.");
            Ok(())
        }
        Ok(ViewState::Loading) => {
            println!("Statistics are still loading.");
            Ok(())
        }
        Ok(ViewState::Unavailable(message)) => {
            error!(action = "fetch", component = "main", error = %message, "Data unavailable");
            eprintln!("Data unavailable: {}", message);
            std::process::exit(1);
        }
        Err(e) => {
            error!(action = "analyze", component = "main", error = %e, "Error");
            std::process::exit(1);
        }
    }
}
