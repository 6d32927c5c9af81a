use std::fmt::Write as _;
use std::fs;

use chrono::{Days, NaiveDate};
use color_eyre::Result;
use log::info;

use crate::config::{Config, datestamp};
use crate::error::Precondition;
use crate::stage::StageStatus;
use crate::storage::FollowerDb;

pub fn status(config: &Config, date: NaiveDate) -> StageStatus {
    StageStatus::from_exists(config.report_path(date).exists())
}

/// Writes the daily diff report: follower count on `date`, handles
/// first seen on `date`, and handles last seen on the previous day.
/// Both `date` and the previous day must already be reconciled.
pub fn produce_report(config: &Config, db: &FollowerDb, date: NaiveDate) -> Result<StageStatus> {
    let stamp = datestamp(date);
    info!("Producing a summary report for {stamp}");

    let previous_date = date - Days::new(1);

    if !db.run_exists(date)? {
        return Err(Precondition::MissingRun(stamp).into());
    }
    if !db.run_exists(previous_date)? {
        return Err(Precondition::MissingRun(datestamp(previous_date)).into());
    }

    // deterministic content for unchanged database state, so an
    // existing report is left alone rather than rewritten.
    if status(config, date) == StageStatus::Complete {
        info!("Report already generated for {stamp}");
        return Ok(StageStatus::Complete);
    }

    let num_followers = db.follower_count_on(date)?;
    let new_followers = db.first_seen_on(date)?;
    let ex_followers = db.last_seen_on(previous_date)?;

    let report = render_report(&stamp, num_followers, &new_followers, &ex_followers);

    fs::create_dir_all(&config.reports_dir)?;
    let report_path = config.report_path(date);
    fs::write(&report_path, report)?;

    info!("Produced summary report in {}", report_path.display());
    Ok(StageStatus::Complete)
}

fn render_report(
    stamp: &str,
    num_followers: i64,
    new_followers: &[String],
    ex_followers: &[String],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Twitter follower report for {stamp}\n");
    let _ = writeln!(out, "You have {num_followers} followers\n");

    if new_followers.is_empty() {
        out.push_str("No new follower(s):\n");
    } else {
        let _ = writeln!(out, "{} new follower(s):", new_followers.len());
        for follower in new_followers {
            let _ = writeln!(out, " * {follower}");
        }
    }

    out.push('\n');

    if ex_followers.is_empty() {
        out.push_str("No new ex follower(s):\n");
    } else {
        let _ = writeln!(out, "{} new ex follower(s):", ex_followers.len());
        for follower in ex_followers {
            let _ = writeln!(out, " * {follower}");
        }
    }

    out
}
