//! SQLite domain list used as an input queue
//!
//! Reads `domains` rows in id order and turns each into a crawl request for
//! a fixed crawling type. A cursor advances past every row handed out, so a
//! continuous run drains the list once. Acknowledgments are no-ops.

use crate::model::CrawlingType;
use crate::queue::traits::{Delivery, InputQueue, QueueResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::path::Path;
use std::sync::Mutex;

/// SQL schema for the domain list
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS domains (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain TEXT NOT NULL UNIQUE,
    url_to_crawl TEXT
);
"#;

/// Domain list backed by SQLite
pub struct DomainListQueue {
    conn: Mutex<Connection>,
    crawling_type: CrawlingType,
    cursor: Mutex<i64>,
}

impl DomainListQueue {
    /// Opens (or creates) the domain list at `path`
    pub fn open(path: &Path, crawling_type: CrawlingType) -> QueueResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::with_connection(conn, crawling_type)
    }

    /// Creates an in-memory domain list
    pub fn in_memory(crawling_type: CrawlingType) -> QueueResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, crawling_type)
    }

    fn with_connection(conn: Connection, crawling_type: CrawlingType) -> QueueResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
            crawling_type,
            cursor: Mutex::new(0),
        })
    }

    /// Adds a domain, returning its row id
    ///
    /// Re-adding a known domain updates its careers URL and keeps the id.
    pub fn add_domain(&self, domain: &str, url_to_crawl: Option<&str>) -> QueueResult<i64> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO domains (domain, url_to_crawl) VALUES (?1, ?2)
             ON CONFLICT(domain) DO UPDATE SET url_to_crawl = excluded.url_to_crawl",
            params![domain, url_to_crawl],
        )?;
        let id = conn.query_row(
            "SELECT id FROM domains WHERE domain = ?1",
            params![domain],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Counts the rows not yet handed out
    pub fn remaining(&self) -> QueueResult<u64> {
        let cursor = *self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let count: Option<i64> = conn
            .query_row(
                "SELECT COUNT(*) FROM domains WHERE id > ?1",
                params![cursor],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.unwrap_or(0) as u64)
    }

    fn message_body(&self, domain: &str, url_to_crawl: Option<String>) -> String {
        let mut message = json!({
            "domain": domain,
            "crawling_type": self.crawling_type.as_str(),
        });
        if let Some(url) = url_to_crawl {
            message["url_to_crawl"] = json!(url);
        }
        message.to_string()
    }
}

#[async_trait]
impl InputQueue for DomainListQueue {
    async fn receive(&self, max_messages: usize) -> QueueResult<Vec<Delivery>> {
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());

        let mut stmt = conn.prepare(
            "SELECT id, domain, url_to_crawl FROM domains WHERE id > ?1 ORDER BY id LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![*cursor, max_messages as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut deliveries = Vec::with_capacity(rows.len());
        for (id, domain, url_to_crawl) in rows {
            *cursor = id;
            deliveries.push(Delivery::new(
                id as u64,
                self.message_body(&domain, url_to_crawl),
            ));
        }
        Ok(deliveries)
    }

    async fn ack(&self, delivery: &Delivery) -> QueueResult<()> {
        tracing::trace!(id = delivery.id, "Domain list delivery acknowledged");
        Ok(())
    }
}
