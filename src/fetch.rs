use std::fs;

use chrono::NaiveDate;
use color_eyre::{Result, eyre::eyre};
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header;

use crate::config::{Config, datestamp};
use crate::stage::StageStatus;

/// Cursor value that requests the first page of the followers list.
const FIRST_PAGE_CURSOR: i64 = -1;

pub fn build_client(config: &Config) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    let mut auth: header::HeaderValue =
        format!("Bearer {}", config.bearer_token).parse()?;
    auth.set_sensitive(true);
    headers.insert(header::AUTHORIZATION, auth);

    Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .build()
        .map_err(Into::into)
}

pub fn status(config: &Config, date: NaiveDate) -> StageStatus {
    StageStatus::from_exists(config.raw_dir(date).exists())
}

/// Paginates the followers-list endpoint into `rsp-<page>.json` files
/// under the dated raw directory. Each page is persisted before the
/// next request, so a crash leaves the pages fetched so far on disk.
pub fn fetch_followers(config: &Config, client: &Client, date: NaiveDate) -> Result<StageStatus> {
    let stamp = datestamp(date);
    info!("Downloading follower data for {stamp}");

    if status(config, date) == StageStatus::Complete {
        info!("Data already downloaded");
        return Ok(StageStatus::Complete);
    }

    let raw_dir = config.raw_dir(date);
    fs::create_dir_all(&raw_dir)?;

    let url = format!("{}/followers/list.json", config.api_base_url);
    let mut cursor = FIRST_PAGE_CURSOR;
    let mut page = 0u32;

    while cursor != 0 {
        info!("Downloading page {page}");
        let rsp: serde_json::Value = client
            .get(&url)
            .query(&[
                ("count", config.page_size.to_string()),
                ("skip_status", "true".into()),
                ("include_user_entities", "false".into()),
                ("cursor", cursor.to_string()),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        let path = raw_dir.join(format!("rsp-{page}.json"));
        debug!("Saving data to {}", path.display());
        // serde_json's Value map is a BTreeMap, so pretty output has
        // sorted keys and identical responses serialize identically.
        fs::write(&path, serde_json::to_string_pretty(&rsp)?)?;

        cursor = next_cursor(&rsp)?;
        page += 1;
    }

    info!("Downloaded follower data to {}", raw_dir.display());
    Ok(StageStatus::Complete)
}

fn next_cursor(page: &serde_json::Value) -> Result<i64> {
    page.get("next_cursor")
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| eyre!("response page has no next_cursor field"))
}
