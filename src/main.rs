use std::process::ExitCode;

use chrono::NaiveDate;
use color_eyre::{Report, Result};
use log::error;

mod config;
mod error;
mod extract;
mod fetch;
mod report;
mod stage;
mod storage;

use config::Config;
use error::Precondition;
use storage::FollowerDb;

fn run_pipeline(config: &Config, date: NaiveDate) -> Result<()> {
    let client = fetch::build_client(config)?;
    fetch::fetch_followers(config, &client, date)?;

    extract::extract_handles(config, date)?;

    let handles = extract::load_handles(config, date)?;
    let mut db = FollowerDb::open(config.db_path())?;
    db.reconcile(date, &handles)?;

    report::produce_report(config, &db, date)?;
    Ok(())
}

fn banner(violation: &Precondition) {
    let rule = "=".repeat(80);
    eprintln!("{rule}");
    eprintln!("WARNING: {violation}");
    eprintln!("{rule}");
}

fn main() -> Result<ExitCode, Report> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    let today = chrono::Local::now().date_naive();

    match run_pipeline(&config, today) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        // detected precondition violations get the banner and exit 1;
        // anything else bubbles out as a full eyre report.
        Err(err) => match err.downcast_ref::<Precondition>() {
            Some(violation) => {
                banner(violation);
                Ok(ExitCode::FAILURE)
            }
            None => {
                error!("run failed");
                Err(err)
            }
        },
    }
}
