#![allow(clippy::missing_errors_doc)]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use match_ticketing_core::{
    format_iso_date, format_rfc3339, now_utc, parse_iso_date, today_utc, DailySales, Ticket,
    TicketDraft, TicketingError,
};
use rusqlite::{params, Connection};
use time::Date;
use tracing::debug;

const TICKETS_MIGRATION_VERSION: i64 = 1;

const SCHEMA_TICKETS_V1: &str = r"
CREATE TABLE IF NOT EXISTS tickets (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  event_id INTEGER NOT NULL,
  sale_date TEXT NOT NULL,
  price REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tickets_event_date
  ON tickets(event_id, sale_date);
";

pub struct SqliteTicketStore {
    conn: Connection,
}

impl SqliteTicketStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite database at {}", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to configure sqlite pragmas")?;

        debug!(path = %path.display(), "opened ticket database");
        Ok(Self { conn })
    }

    /// Ensures the tickets schema exists. Safe to call on every run;
    /// an already-migrated database is left untouched.
    pub fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS schema_migrations (
                    version INTEGER PRIMARY KEY,
                    applied_at TEXT NOT NULL
                );",
            )
            .context("failed to ensure schema_migrations exists")?;

        self.conn
            .execute_batch(SCHEMA_TICKETS_V1)
            .context("failed to apply tickets schema")?;

        let now = format_rfc3339(now_utc()).map_err(|err| anyhow!(err.to_string()))?;
        self.conn
            .execute(
                "INSERT OR IGNORE INTO schema_migrations(version, applied_at) VALUES (?1, ?2)",
                params![TICKETS_MIGRATION_VERSION, now],
            )
            .context("failed to register tickets schema migration")?;

        debug!("tickets schema ready");
        Ok(())
    }

    /// Inserts one ticket stamped with today's date and returns the stored
    /// row. Repeated identical calls create distinct rows; there is no
    /// duplicate detection.
    pub fn add_ticket(&mut self, draft: &TicketDraft) -> Result<Ticket> {
        draft
            .validate()
            .map_err(|err| anyhow!("ticket validation failed: {err}"))?;

        let sale_date = today_utc();
        let sale_date_text = format_iso_date(sale_date).map_err(|err| anyhow!(err.to_string()))?;

        let tx = self
            .conn
            .transaction()
            .context("failed to start ticket transaction")?;
        tx.execute(
            "INSERT INTO tickets(event_id, sale_date, price) VALUES (?1, ?2, ?3)",
            params![draft.event_id, sale_date_text, draft.price],
        )
        .context("failed to insert ticket")?;
        let id = tx.last_insert_rowid();
        tx.commit().context("failed to commit ticket transaction")?;

        debug!(id, event_id = draft.event_id, "ticket added");
        Ok(Ticket {
            id,
            event_id: draft.event_id,
            sale_date,
            price: draft.price,
        })
    }

    /// Lists every stored ticket in insertion order.
    pub fn list_tickets(&self) -> Result<Vec<Ticket>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, event_id, sale_date, price FROM tickets ORDER BY id ASC")
            .context("failed to prepare ticket listing")?;
        let rows = stmt
            .query_map([], parse_ticket_row)
            .context("failed to list tickets")?;
        collect_rows(rows)
    }

    /// Deletes the ticket with the given id. Returns `false` when no row had
    /// that id; a missing id is a no-op, not an error.
    pub fn delete_ticket(&mut self, ticket_id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM tickets WHERE id = ?1", params![ticket_id])
            .with_context(|| format!("failed to delete ticket {ticket_id}"))?;

        debug!(ticket_id, deleted, "ticket delete executed");
        Ok(deleted > 0)
    }

    /// Aggregates tickets sold per sale date for one event, oldest date
    /// first. An event with no tickets yields an empty series.
    pub fn daily_sales(&self, event_id: i64) -> Result<Vec<DailySales>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT sale_date, COUNT(*) AS tickets_sold
                 FROM tickets
                 WHERE event_id = ?1
                 GROUP BY sale_date
                 ORDER BY sale_date ASC",
            )
            .context("failed to prepare daily sales aggregation")?;
        let rows = stmt
            .query_map(params![event_id], parse_daily_sales_row)
            .with_context(|| format!("failed to aggregate sales for event {event_id}"))?;
        collect_rows(rows)
    }

    #[cfg(test)]
    fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn parse_ticket_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Ticket> {
    let sale_date_raw: String = row.get(2)?;
    let sale_date = parse_iso_date(&sale_date_raw).map_err(|err| to_sql_error(2, &err))?;

    Ok(Ticket {
        id: row.get(0)?,
        event_id: row.get(1)?,
        sale_date,
        price: row.get(3)?,
    })
}

fn parse_daily_sales_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailySales> {
    let sale_date_raw: String = row.get(0)?;
    let sold_i64: i64 = row.get(1)?;

    let sale_date = parse_iso_date(&sale_date_raw).map_err(|err| to_sql_error(0, &err))?;
    let tickets_sold = u32::try_from(sold_i64).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Integer,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid tickets_sold count: {sold_i64}"),
            )),
        )
    })?;

    Ok(DailySales {
        sale_date,
        tickets_sold,
    })
}

fn to_sql_error(column: usize, err: &TicketingError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            err.to_string(),
        )),
    )
}

fn collect_rows<T>(
    rows: rusqlite::MappedRows<'_, impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>>,
) -> Result<Vec<T>> {
    let mut values = Vec::new();
    for row in rows {
        values.push(row?);
    }
    Ok(values)
}

/// Inserts a ticket row with an explicit sale date, bypassing the
/// today-stamping in [`SqliteTicketStore::add_ticket`]. Test support for
/// building fixed historical series; the application surface itself cannot
/// backdate.
pub fn seed_ticket_row(
    conn: &Connection,
    event_id: i64,
    sale_date: Date,
    price: f64,
) -> Result<i64> {
    conn.execute_batch(SCHEMA_TICKETS_V1)
        .context("failed to ensure tickets table for seeding")?;

    let sale_date_text = format_iso_date(sale_date).map_err(|err| anyhow!(err.to_string()))?;
    conn.execute(
        "INSERT INTO tickets(event_id, sale_date, price) VALUES (?1, ?2, ?3)",
        params![event_id, sale_date_text, price],
    )
    .context("failed to seed ticket row")?;

    Ok(conn.last_insert_rowid())
}
