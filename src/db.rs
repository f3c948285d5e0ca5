use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::app::watch::{WatchStore, episode_key, parse_watched, watched_value};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS watch_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_watch_state_updated_at ON watch_state(updated_at DESC);
            "#,
        )?;
        Ok(())
    }

    pub fn read_value(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM watch_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn write_value(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO watch_state (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn watched_count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM watch_state WHERE value = 'true'",
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn last_updated(&self) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT updated_at FROM watch_state ORDER BY updated_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn clear_watch_state(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM watch_state", [])?;
        Ok(removed)
    }
}

impl WatchStore for Database {
    fn get(&self, id: u32) -> Result<bool> {
        let key = episode_key(id);
        let raw = self
            .read_value(&key)
            .with_context(|| format!("failed to read watch state for {key}"))?;
        Ok(parse_watched(raw.as_deref()))
    }

    fn set(&self, id: u32, watched: bool) -> Result<()> {
        let key = episode_key(id);
        self.write_value(&key, watched_value(watched))
            .with_context(|| format!("failed to write watch state for {key}"))
    }
}
