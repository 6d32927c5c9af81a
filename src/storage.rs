use std::path::Path;

use chrono::NaiveDate;
use color_eyre::Result;
use log::info;
use rusqlite::{Connection, params};

use crate::config::datestamp;
use crate::error::Precondition;
use crate::stage::StageStatus;

/// Single-writer embedded store tracking when each handle was first
/// and last seen, plus one row per reconciled run.
pub struct FollowerDb {
    conn: Connection,
}

impl FollowerDb {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// In-memory database, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS runs (datestamp TEXT PRIMARY KEY);
             CREATE TABLE IF NOT EXISTS followers (
                 handle TEXT PRIMARY KEY,
                 firstseen TEXT,
                 lastseen TEXT
             );",
        )?;
        Ok(())
    }

    pub fn run_exists(&self, date: NaiveDate) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM runs WHERE datestamp = ?1",
            params![datestamp(date)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Most recent run datestamp strictly after `date`, if any.
    fn run_after(&self, date: NaiveDate) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT MAX(datestamp) FROM runs WHERE datestamp > ?1",
                params![datestamp(date)],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    /// Merges one day's handle list into the follower table and marks
    /// the run, all in one transaction. The run table is forward-only:
    /// a datestamp older than an existing run is rejected before
    /// anything is touched.
    pub fn reconcile(&mut self, date: NaiveDate, handles: &[String]) -> Result<StageStatus> {
        let stamp = datestamp(date);
        info!("Updating follower database for {stamp}");

        if self.run_exists(date)? {
            info!("Follower database already has data from {stamp}");
            return Ok(StageStatus::Complete);
        }

        if let Some(latest) = self.run_after(date)? {
            return Err(Precondition::OutOfOrderRun {
                attempted: stamp,
                latest,
            }
            .into());
        }

        let tx = self.conn.transaction()?;
        for handle in handles {
            // firstseen is set on insert and never updated afterwards.
            tx.execute(
                "INSERT INTO followers (handle, firstseen, lastseen) VALUES (?1, ?2, ?2)
                 ON CONFLICT(handle) DO UPDATE SET lastseen = excluded.lastseen",
                params![handle, stamp],
            )?;
        }
        tx.execute("INSERT INTO runs (datestamp) VALUES (?1)", params![stamp])?;
        tx.commit()?;

        info!("Updated follower database");
        Ok(StageStatus::Complete)
    }

    /// Handles considered followers on `date`:
    /// `firstseen <= date <= lastseen`.
    pub fn follower_count_on(&self, date: NaiveDate) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM followers WHERE firstseen <= ?1 AND lastseen >= ?1",
                params![datestamp(date)],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn first_seen_on(&self, date: NaiveDate) -> Result<Vec<String>> {
        self.handles_where("firstseen = ?1", date)
    }

    pub fn last_seen_on(&self, date: NaiveDate) -> Result<Vec<String>> {
        self.handles_where("lastseen = ?1", date)
    }

    fn handles_where(&self, predicate: &str, date: NaiveDate) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT handle FROM followers WHERE {predicate} ORDER BY handle"
        ))?;
        let rows = stmt.query_map(params![datestamp(date)], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<Vec<String>>>()
            .map_err(Into::into)
    }

    #[cfg(test)]
    fn seen_range(&self, handle: &str) -> Option<(String, String)> {
        use rusqlite::OptionalExtension;

        self.conn
            .query_row(
                "SELECT firstseen, lastseen FROM followers WHERE handle = ?1",
                params![handle],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .unwrap()
    }
}
