//! Persistence of generated documents and their metadata
//!
//! # Invariants
//! - `created_at` is stored as epoch milliseconds (UTC).
//! - `list` returns newest first.

use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use template::DocumentKind;
use thiserror::Error;

const MS_PER_DAY: i64 = 86_400_000;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS proposals (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    kind            TEXT    NOT NULL,
    client_name     TEXT    NOT NULL,
    tax_id          TEXT    NOT NULL,
    product_model   TEXT    NOT NULL,
    quota           INTEGER NOT NULL,
    amount_centavos INTEGER NOT NULL,
    filename        TEXT    NOT NULL,
    document        BLOB    NOT NULL,
    created_at      INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_proposals_created_at ON proposals (created_at);
";

/// Store failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A document to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProposal {
    pub kind: DocumentKind,
    pub client_name: String,
    pub tax_id: String,
    pub product_model: String,
    pub quota: u64,
    pub amount_centavos: u64,
    pub filename: String,
    pub document: Vec<u8>,
}

/// Stored document metadata, without the document bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalSummary {
    pub id: i64,
    pub kind: DocumentKind,
    pub client_name: String,
    pub tax_id: String,
    pub product_model: String,
    pub quota: u64,
    pub amount_centavos: u64,
    pub filename: String,
    pub size: u64,
    /// Epoch milliseconds
    pub created_at: i64,
}

/// Persistence boundary for generated documents
pub trait ProposalStore {
    /// Persist a document and return its id
    fn save(&self, proposal: &NewProposal) -> StoreResult<i64>;
    /// Most recent documents first
    fn list(&self, limit: u32) -> StoreResult<Vec<ProposalSummary>>;
    /// Stored PDF bytes
    fn get_document(&self, id: i64) -> StoreResult<Option<Vec<u8>>>;
    /// Remove one document; `false` when it did not exist
    fn delete(&self, id: i64) -> StoreResult<bool>;
    /// Remove documents older than `days`, returning how many were removed
    fn purge_older_than(&self, days: u32) -> StoreResult<usize>;
}

/// SQLite-backed store
pub struct SqliteProposalStore {
    conn: Connection,
}

impl SqliteProposalStore {
    /// Open (creating if needed) a database file
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!("opened proposal store at {}", path.as_ref().display());
        Self::bootstrap(conn)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Persist with an explicit creation time
    pub fn save_at(&self, proposal: &NewProposal, created_at: i64) -> StoreResult<i64> {
        self.conn.execute(
            "INSERT INTO proposals
                (kind, client_name, tax_id, product_model, quota, amount_centavos,
                 filename, document, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                proposal.kind.label(),
                proposal.client_name,
                proposal.tax_id,
                proposal.product_model,
                to_sql_int(proposal.quota)?,
                to_sql_int(proposal.amount_centavos)?,
                proposal.filename,
                proposal.document,
                created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("stored {} #{id} ({} bytes)", proposal.kind, proposal.document.len());
        Ok(id)
    }

    /// Remove documents created before `now - days`
    pub fn purge_older_than_at(&self, days: u32, now: i64) -> StoreResult<usize> {
        let cutoff = now - i64::from(days) * MS_PER_DAY;
        let removed = self
            .conn
            .execute("DELETE FROM proposals WHERE created_at < ?1", [cutoff])?;
        info!("purged {removed} documents older than {days} days");
        Ok(removed)
    }
}

impl ProposalStore for SqliteProposalStore {
    fn save(&self, proposal: &NewProposal) -> StoreResult<i64> {
        self.save_at(proposal, now_millis())
    }

    fn list(&self, limit: u32) -> StoreResult<Vec<ProposalSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, client_name, tax_id, product_model, quota, amount_centavos,
                    filename, length(document) AS size, created_at
             FROM proposals
             ORDER BY created_at DESC, id DESC
             LIMIT ?1",
        )?;
        let mut rows = stmt.query([limit])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(summary_from_row(row)?);
        }
        Ok(out)
    }

    fn get_document(&self, id: i64) -> StoreResult<Option<Vec<u8>>> {
        let document = self
            .conn
            .query_row(
                "SELECT document FROM proposals WHERE id = ?1",
                [id],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(document)
    }

    fn delete(&self, id: i64) -> StoreResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM proposals WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }

    fn purge_older_than(&self, days: u32) -> StoreResult<usize> {
        self.purge_older_than_at(days, now_millis())
    }
}

fn summary_from_row(row: &Row<'_>) -> StoreResult<ProposalSummary> {
    let kind: String = row.get("kind")?;
    let kind = match kind.as_str() {
        "proposta" => DocumentKind::Proposal,
        "contrato" => DocumentKind::Contract,
        other => return Err(StoreError::InvalidData(format!("unknown kind {other:?}"))),
    };
    Ok(ProposalSummary {
        id: row.get("id")?,
        kind,
        client_name: row.get("client_name")?,
        tax_id: row.get("tax_id")?,
        product_model: row.get("product_model")?,
        quota: from_sql_int(row.get("quota")?)?,
        amount_centavos: from_sql_int(row.get("amount_centavos")?)?,
        filename: row.get("filename")?,
        size: from_sql_int(row.get("size")?)?,
        created_at: row.get("created_at")?,
    })
}

fn to_sql_int(value: u64) -> StoreResult<i64> {
    i64::try_from(value).map_err(|_| StoreError::InvalidData(format!("{value} is too large")))
}

fn from_sql_int(value: i64) -> StoreResult<u64> {
    u64::try_from(value).map_err(|_| StoreError::InvalidData(format!("negative value {value}")))
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
