//! SQLite-backed search history.
//!
//! Two tables: `search_histories` (saved lookups, the cache source) and the
//! simpler `weather_records` log. Both are append-only from the application's
//! point of view.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, params, types::Type};
use serde_json::Value;
use std::path::Path;

use crate::error::WeatherError;
use crate::model::{HistoryEntry, NewHistoryEntry, NewWeatherRecord, WeatherRecord};

pub type StoreResult<T> = Result<T, WeatherError>;

/// Persistence boundary for saved lookups.
pub trait HistoryStore: Send + Sync {
    /// Append a validated entry and return it with its assigned id.
    fn append(&self, entry: NewHistoryEntry) -> StoreResult<HistoryEntry>;

    /// All entries, most recent first.
    fn list_all(&self) -> StoreResult<Vec<HistoryEntry>>;

    fn append_record(&self, record: NewWeatherRecord) -> StoreResult<WeatherRecord>;

    /// All weather records, newest id first.
    fn list_records(&self) -> StoreResult<Vec<WeatherRecord>>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at `path`, creating parent directories as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS search_histories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city TEXT NOT NULL,
                country TEXT,
                postal_code TEXT,
                temperature REAL,
                humidity INTEGER,
                wind_speed REAL,
                feelslike REAL,
                description TEXT,
                icon TEXT,
                raw_data TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_search_histories_created ON search_histories(created_at DESC);

            CREATE TABLE IF NOT EXISTS weather_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city TEXT,
                postal_code TEXT,
                country TEXT,
                temperature REAL,
                humidity INTEGER,
                wind_speed REAL,
                description TEXT,
                icon TEXT,
                raw_data TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Append with an explicit creation time.
    pub fn insert_at(&self, entry: NewHistoryEntry, created_at: DateTime<Utc>) -> StoreResult<HistoryEntry> {
        entry.validate()?;

        let raw_text = entry.raw.as_ref().map(Value::to_string);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO search_histories
                (city, country, postal_code, temperature, humidity, wind_speed, feelslike, description, icon, raw_data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                entry.city,
                entry.country,
                entry.postal_code,
                entry.temperature_c,
                entry.humidity_pct,
                entry.wind_speed_kmh,
                entry.feels_like_c,
                entry.description,
                entry.icon,
                raw_text,
                timestamp(created_at),
            ],
        )?;
        let id = conn.last_insert_rowid();

        Ok(HistoryEntry {
            id,
            city: entry.city,
            country: entry.country,
            postal_code: entry.postal_code,
            temperature_c: entry.temperature_c,
            humidity_pct: entry.humidity_pct,
            wind_speed_kmh: entry.wind_speed_kmh,
            feels_like_c: entry.feels_like_c,
            description: entry.description,
            icon: entry.icon,
            raw: entry.raw,
            created_at,
        })
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
        let id = row.get(0)?;
        let raw_text: Option<String> = row.get(10)?;
        Ok(HistoryEntry {
            id,
            city: row.get(1)?,
            country: row.get(2)?,
            postal_code: row.get(3)?,
            temperature_c: row.get(4)?,
            humidity_pct: row.get(5)?,
            wind_speed_kmh: row.get(6)?,
            feels_like_c: row.get(7)?,
            description: row.get(8)?,
            icon: row.get(9)?,
            raw: parse_raw(raw_text, "search_histories", id),
            created_at: parse_timestamp(row, 11)?,
        })
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<WeatherRecord> {
        let id = row.get(0)?;
        let raw_text: Option<String> = row.get(9)?;
        Ok(WeatherRecord {
            id,
            city: row.get(1)?,
            postal_code: row.get(2)?,
            country: row.get(3)?,
            temperature: row.get(4)?,
            humidity: row.get(5)?,
            wind_speed: row.get(6)?,
            description: row.get(7)?,
            icon: row.get(8)?,
            raw_data: parse_raw(raw_text, "weather_records", id),
            created_at: parse_timestamp(row, 10)?,
        })
    }
}

/// A corrupt `raw_data` column reads as absent; the row itself stays usable.
fn parse_raw(text: Option<String>, table: &str, id: i64) -> Option<Value> {
    let text = text?;
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(table, id, error = %err, "ignoring unreadable raw_data");
            None
        }
    }
}

impl HistoryStore for SqliteStore {
    fn append(&self, entry: NewHistoryEntry) -> StoreResult<HistoryEntry> {
        self.insert_at(entry, Utc::now())
    }

    fn list_all(&self) -> StoreResult<Vec<HistoryEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, city, country, postal_code, temperature, humidity, wind_speed, feelslike, description, icon, raw_data, created_at
             FROM search_histories
             ORDER BY created_at DESC, id DESC",
        )?;

        let rows = stmt.query_map([], Self::row_to_entry)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn append_record(&self, record: NewWeatherRecord) -> StoreResult<WeatherRecord> {
        let created_at = Utc::now();
        let raw_text = record.raw_data.as_ref().map(Value::to_string);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO weather_records
                (city, postal_code, country, temperature, humidity, wind_speed, description, icon, raw_data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.city,
                record.postal_code,
                record.country,
                record.temperature,
                record.humidity,
                record.wind_speed,
                record.description,
                record.icon,
                raw_text,
                timestamp(created_at),
            ],
        )?;

        Ok(WeatherRecord {
            id: conn.last_insert_rowid(),
            city: record.city,
            postal_code: record.postal_code,
            country: record.country,
            temperature: record.temperature,
            humidity: record.humidity,
            wind_speed: record.wind_speed,
            description: record.description,
            icon: record.icon,
            raw_data: record.raw_data,
            created_at,
        })
    }

    fn list_records(&self) -> StoreResult<Vec<WeatherRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, city, postal_code, country, temperature, humidity, wind_speed, description, icon, raw_data, created_at
             FROM weather_records
             ORDER BY id DESC",
        )?;

        let rows = stmt.query_map([], Self::row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

// Fixed-width UTC timestamps so lexical order in SQLite matches time order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
