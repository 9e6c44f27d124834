// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, params};
use shotdesk_app::{PrefKey, PrefValue, PreferenceStore};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const APP_NAME: &str = "shotdesk";

const PREFERENCE_COLUMNS: [&str; 3] = ["key", "value", "updated_at"];

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS preferences (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL,
  updated_at TEXT NOT NULL
);
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPreference {
    pub key: String,
    pub value: String,
    pub updated_at: OffsetDateTime,
}

/// SQLite-backed preference store. Writes go straight to disk.
pub struct PreferenceDb {
    conn: Connection,
}

impl PreferenceDb {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create preference directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open preferences at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory preferences")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA)
            .context("create preferences table")?;
        validate_schema(&self.conn)
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("read preference {key}"))
    }

    pub fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO preferences (key, value, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                  value = excluded.value,
                  updated_at = excluded.updated_at
                ",
                params![key, value, now],
            )
            .with_context(|| format!("upsert preference {key}"))?;
        Ok(())
    }

    pub fn get_pref(&self, key: PrefKey) -> Result<Option<PrefValue>> {
        let name = key.as_str();
        let raw = self.get_raw(&name)?;
        raw.map(|value| {
            PrefValue::parse_for_key(key, &value).ok_or_else(|| {
                anyhow!("preference `{name}` has invalid value `{value}`; toggle it again in the roster view")
            })
        })
        .transpose()
    }

    pub fn put_pref(&self, key: PrefKey, value: PrefValue) -> Result<()> {
        let name = key.as_str();
        let raw = value.to_storage(key).ok_or_else(|| {
            anyhow!(
                "preference `{name}` expected a {:?} value",
                key.expected_value_kind()
            )
        })?;
        self.put_raw(&name, &raw)
    }

    pub fn list_preferences(&self) -> Result<Vec<StoredPreference>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value, updated_at FROM preferences ORDER BY key")
            .context("prepare preference listing")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .context("list preferences")?;

        let mut preferences = Vec::new();
        for row in rows {
            let (key, value, updated_at) = row.context("decode preference row")?;
            let updated_at = OffsetDateTime::parse(&updated_at, &Rfc3339)
                .with_context(|| format!("parse updated_at for preference {key}"))?;
            preferences.push(StoredPreference {
                key,
                value,
                updated_at,
            });
        }
        Ok(preferences)
    }

    /// Fails on the first stored key or value the roster view would not
    /// understand. Returns the number of stored preferences.
    pub fn validate(&self) -> Result<usize> {
        let preferences = self.list_preferences()?;
        for preference in &preferences {
            let key = PrefKey::parse(&preference.key).ok_or_else(|| {
                anyhow!(
                    "unknown preference key `{}`; remove it from the preference database",
                    preference.key
                )
            })?;
            if PrefValue::parse_for_key(key, &preference.value).is_none() {
                bail!(
                    "preference `{}` has invalid value `{}`",
                    preference.key,
                    preference.value
                );
            }
        }
        Ok(preferences.len())
    }
}

impl PreferenceStore for PreferenceDb {
    fn get(&self, key: PrefKey) -> Result<Option<String>> {
        self.get_raw(&key.as_str())
    }

    fn set(&mut self, key: PrefKey, value: &str) -> Result<()> {
        self.put_raw(&key.as_str(), value)
    }
}

pub fn default_prefs_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("SHOTDESK_PREFS_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set SHOTDESK_PREFS_PATH to a writable path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("prefs.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("preference path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "preference path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("preference path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!("preference path {path:?} contains '?'; use a plain file path");
    }

    Ok(())
}

fn validate_schema(conn: &Connection) -> Result<()> {
    let mut stmt = conn
        .prepare("PRAGMA table_info(preferences)")
        .context("inspect preference columns")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .context("query preference columns")?
        .collect::<rusqlite::Result<BTreeSet<String>>>()
        .context("decode preference columns")?;

    let missing: Vec<&str> = PREFERENCE_COLUMNS
        .iter()
        .copied()
        .filter(|column| !columns.contains(*column))
        .collect();
    if !missing.is_empty() {
        bail!(
            "table `preferences` is missing required columns: {}; delete the preference file to recreate it",
            missing.join(", ")
        );
    }
    Ok(())
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}
