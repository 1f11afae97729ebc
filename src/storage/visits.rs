use chrono::{NaiveDateTime, Utc};
use duckdb::Connection;
use parking_lot::Mutex;
use std::sync::Arc;

/// Timestamp format used when binding and reading TIMESTAMP columns.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A visit ready to be appended to the log. Fields are already sanitized
/// by the ingest layer; the store assigns the id and timestamp.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub page_url: String,
    pub referer_url: String,
    pub user_agent: String,
    pub ip_address: String,
}

/// One recorded page view, as read back from the store.
#[derive(Debug, Clone)]
pub struct VisitRow {
    pub id: i64,
    pub visited_at: NaiveDateTime,
    pub page_url: String,
    pub referer_url: String,
    pub user_agent: String,
    pub ip_address: String,
}

/// Durable visit log backed by DuckDB.
///
/// All access goes through the shared connection mutex; callers on the
/// async side wrap calls in `spawn_blocking`.
pub struct VisitStore {
    conn: Arc<Mutex<Connection>>,
}

impl VisitStore {
    pub const fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Returns a reference to the DuckDB connection for direct query access.
    pub const fn conn(&self) -> &Arc<Mutex<Connection>> {
        &self.conn
    }

    /// Append one visit. The store assigns the id (sequence) and the
    /// current UTC timestamp.
    pub fn insert(&self, visit: &NewVisit) -> Result<(), duckdb::Error> {
        let now = Utc::now().naive_utc();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO visits (visited_at, page_url, referer_url, user_agent, ip_address)
             VALUES (?, ?, ?, ?, ?)",
            duckdb::params![
                now.format(TIMESTAMP_FORMAT).to_string(),
                visit.page_url,
                visit.referer_url,
                visit.user_agent,
                visit.ip_address,
            ],
        )?;
        Ok(())
    }

    /// Load the entire visit log, most recent first.
    pub fn load_all(&self) -> Result<Vec<VisitRow>, duckdb::Error> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, STRFTIME(visited_at, '%Y-%m-%d %H:%M:%S'),
                    page_url, referer_url, user_agent, ip_address
             FROM visits ORDER BY id DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let ts: String = row.get(1)?;
                let visited_at =
                    NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).map_err(|e| {
                        duckdb::Error::FromSqlConversionFailure(
                            1,
                            duckdb::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                Ok(VisitRow {
                    id: row.get(0)?,
                    visited_at,
                    page_url: row.get(2)?,
                    referer_url: row.get(3)?,
                    user_agent: row.get(4)?,
                    ip_address: row.get(5)?,
                })
            })?
            .filter_map(Result::ok)
            .collect();
        Ok(rows)
    }

    /// Delete every stored visit. Returns the number of deleted rows.
    pub fn purge_all(&self) -> Result<usize, duckdb::Error> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM visits", [])
    }

    /// Number of visits currently stored.
    pub fn count(&self) -> Result<u64, duckdb::Error> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT COUNT(*) FROM visits")?;
        stmt.query_row([], |row| row.get(0))
    }
}
