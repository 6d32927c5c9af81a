use std::fs;

use chrono::NaiveDate;
use color_eyre::Result;
use log::info;
use serde::Deserialize;

use crate::config::{Config, datestamp};
use crate::error::Precondition;
use crate::stage::StageStatus;

#[derive(Deserialize)]
struct Page {
    users: Vec<UserRecord>,
}

#[derive(Deserialize)]
struct UserRecord {
    screen_name: String,
}

pub fn status(config: &Config, date: NaiveDate) -> StageStatus {
    StageStatus::from_exists(config.handles_path(date).exists())
}

/// Flattens every raw page of the given date into one sorted handle
/// list, one handle per line. Sorting does not deduplicate: a handle
/// the API returned twice appears twice.
pub fn extract_handles(config: &Config, date: NaiveDate) -> Result<StageStatus> {
    let stamp = datestamp(date);
    info!("Extracting follower data for {stamp}");

    if status(config, date) == StageStatus::Complete {
        info!("Followers already extracted");
        return Ok(StageStatus::Complete);
    }

    let raw_dir = config.raw_dir(date);
    if !raw_dir.exists() {
        return Err(Precondition::MissingRawData(stamp).into());
    }

    let mut handles = Vec::new();
    // directory listing order; irrelevant because the result is sorted.
    for entry in fs::read_dir(&raw_dir)? {
        let path = entry?.path();
        info!("Extracting follower data from {}", path.display());
        let page: Page = serde_json::from_str(&fs::read_to_string(&path)?)?;
        handles.extend(page.users.into_iter().map(|user| user.screen_name));
    }
    handles.sort();

    info!("Extracted {} follower handles", handles.len());

    let out_path = config.handles_path(date);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut body = String::new();
    for handle in &handles {
        body.push_str(handle);
        body.push('\n');
    }
    fs::write(&out_path, body)?;

    info!("Extracted handles to {}", out_path.display());
    Ok(StageStatus::Complete)
}

/// Reads an already-extracted handle list back off disk.
pub fn load_handles(config: &Config, date: NaiveDate) -> Result<Vec<String>> {
    let text = fs::read_to_string(config.handles_path(date))?;
    Ok(text.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn test_config(data_dir: &Path) -> Config {
        Config {
            bearer_token: "token".into(),
            api_base_url: "http://localhost:1".into(),
            user_agent: "test".into(),
            page_size: 200,
            data_dir: data_dir.to_path_buf(),
            reports_dir: data_dir.join("reports"),
        }
    }

    fn write_page(config: &Config, date: NaiveDate, page: u32, handles: &[&str]) {
        let users: Vec<serde_json::Value> = handles
            .iter()
            .map(|h| serde_json::json!({ "screen_name": h, "id": 1 }))
            .collect();
        let body = serde_json::json!({ "users": users, "next_cursor": 0 });
        let dir = config.raw_dir(date);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("rsp-{page}.json")),
            serde_json::to_string_pretty(&body).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn merges_pages_into_sorted_handle_list() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        write_page(&config, date, 0, &["x", "y"]);
        write_page(&config, date, 1, &["z"]);

        extract_handles(&config, date).unwrap();

        let text = fs::read_to_string(config.handles_path(date)).unwrap();
        assert_eq!(text, "x\ny\nz\n");
        assert_eq!(load_handles(&config, date).unwrap(), ["x", "y", "z"]);
    }

    #[test]
    fn duplicates_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        write_page(&config, date, 0, &["b", "a"]);
        write_page(&config, date, 1, &["a"]);

        extract_handles(&config, date).unwrap();

        let text = fs::read_to_string(config.handles_path(date)).unwrap();
        assert_eq!(text, "a\na\nb\n");
    }

    #[test]
    fn missing_raw_dir_is_a_precondition_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let err = extract_handles(&config, date).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Precondition>(),
            Some(Precondition::MissingRawData(stamp)) if stamp == "2024-01-01"
        ));
    }

    #[test]
    fn existing_output_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let out_path = config.handles_path(date);
        fs::create_dir_all(out_path.parent().unwrap()).unwrap();
        fs::write(&out_path, "frozen\n").unwrap();

        // no raw dir at all: the skip check comes first.
        let status = extract_handles(&config, date).unwrap();
        assert_eq!(status, StageStatus::Complete);
        assert_eq!(fs::read_to_string(&out_path).unwrap(), "frozen\n");
    }
}
