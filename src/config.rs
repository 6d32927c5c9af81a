use std::path::PathBuf;

use chrono::NaiveDate;
use color_eyre::{Result, eyre::Context};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub bearer_token: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
}

fn default_api_base_url() -> String {
    "https://api.twitter.com/1.1".into()
}

fn default_user_agent() -> String {
    "follower-tracker/0.1".into()
}

const fn default_page_size() -> u32 {
    200
}

fn default_data_dir() -> PathBuf {
    "data".into()
}

fn default_reports_dir() -> PathBuf {
    "reports".into()
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Self>().wrap_err("failed to load config")
    }

    pub fn raw_dir(&self, date: NaiveDate) -> PathBuf {
        self.data_dir.join("raw").join(datestamp(date))
    }

    pub fn handles_path(&self, date: NaiveDate) -> PathBuf {
        self.data_dir
            .join("followers")
            .join(format!("{}.txt", datestamp(date)))
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("twitter-followers.db")
    }

    pub fn report_path(&self, date: NaiveDate) -> PathBuf {
        self.reports_dir.join(format!("{}.txt", datestamp(date)))
    }
}

/// ISO `YYYY-MM-DD`, so lexical order is date order in the database.
pub fn datestamp(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            bearer_token: "token".into(),
            api_base_url: default_api_base_url(),
            user_agent: default_user_agent(),
            page_size: default_page_size(),
            data_dir: "data".into(),
            reports_dir: "reports".into(),
        }
    }

    #[test]
    fn paths_follow_dated_layout() {
        let config = test_config();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        assert_eq!(config.raw_dir(date), PathBuf::from("data/raw/2024-01-02"));
        assert_eq!(
            config.handles_path(date),
            PathBuf::from("data/followers/2024-01-02.txt")
        );
        assert_eq!(config.db_path(), PathBuf::from("data/twitter-followers.db"));
        assert_eq!(
            config.report_path(date),
            PathBuf::from("reports/2024-01-02.txt")
        );
    }

    #[test]
    fn datestamp_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(datestamp(date), "2024-03-07");
    }
}
