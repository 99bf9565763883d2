//! The index store seam between retrieval logic and the storage engine.
//!
//! Retrieval code in `relir-search` only sees [`IndexStore`]. The SQLite
//! implementation wraps every read in the configured deadline.

use crate::config::StoreConfig;
use crate::db::{self, fts, introspect, load, schema, vector};
use crate::error::Result;
use crate::ident::validate_identifier;
use crate::model::{DocumentRow, IndexKind, RankedHit};
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::time::Duration;

/// Read access to stored sparse and dense tables.
///
/// Hits come back in non-increasing score order, at most `limit` of them.
pub trait IndexStore {
    /// Lower-cased column names of `table`; empty when the table is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unsafe or introspection fails.
    fn columns(&self, table: &str) -> Result<BTreeSet<String>>;

    /// Dimensionality of the table's `embedding` column, if it has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unsafe or introspection fails.
    fn embedding_dimension(&self, table: &str) -> Result<Option<usize>>;

    /// Number of stored rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unsafe or the count fails.
    fn row_count(&self, table: &str) -> Result<u64>;

    /// BM25 search of a sparse table for any of the normalized `terms`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table or its index is missing, `terms` is
    /// empty, or the read fails or times out.
    fn search_sparse(&self, table: &str, terms: &[String], limit: usize)
    -> Result<Vec<RankedHit>>;

    /// Cosine-similarity search of a dense table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is missing or the read fails or times
    /// out.
    fn search_dense(&self, table: &str, query: &[f32], limit: usize) -> Result<Vec<RankedHit>>;
}

/// [`IndexStore`] over a single SQLite connection.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    query_timeout: Option<Duration>,
}

impl SqliteStore {
    /// Wrap an already-open connection.
    #[must_use]
    pub const fn new(conn: Connection, query_timeout: Option<Duration>) -> Self {
        Self {
            conn,
            query_timeout,
        }
    }

    /// Open the store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or configured.
    pub fn open(config: &StoreConfig) -> anyhow::Result<Self> {
        let conn = db::open_store(config)?;
        Ok(Self::new(conn, config.query_timeout()))
    }

    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consume the store and return the underlying connection.
    #[must_use]
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    #[must_use]
    pub const fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout
    }

    /// Drop and recreate `table` as a sparse or dense index table.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unsafe, `dim` is zero for a dense
    /// table, or the DDL fails.
    pub fn create_table(&self, table: &str, kind: IndexKind, dim: usize) -> Result<()> {
        schema::create_table(&self.conn, table, kind, dim)
    }

    /// Insert or update rows in one transaction. Returns the number written.
    ///
    /// # Errors
    ///
    /// See [`load::insert_rows`].
    pub fn insert_rows(&mut self, table: &str, rows: &[DocumentRow]) -> Result<usize> {
        load::insert_rows(&mut self.conn, table, rows)
    }

    /// Rebuild (creating if needed) the full-text index of a sparse table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is missing or the rebuild fails.
    pub fn rebuild_sparse_index(&self, table: &str) -> Result<()> {
        fts::rebuild_sparse_index(&self.conn, table)
    }
}

impl IndexStore for SqliteStore {
    fn columns(&self, table: &str) -> Result<BTreeSet<String>> {
        let name = validate_identifier(table)?;
        db::with_deadline(&self.conn, name, self.query_timeout, |conn| {
            introspect::column_names(conn, name)
        })
    }

    fn embedding_dimension(&self, table: &str) -> Result<Option<usize>> {
        let name = validate_identifier(table)?;
        db::with_deadline(&self.conn, name, self.query_timeout, |conn| {
            introspect::embedding_dimension(conn, name)
        })
    }

    fn row_count(&self, table: &str) -> Result<u64> {
        let name = validate_identifier(table)?;
        db::with_deadline(&self.conn, name, self.query_timeout, |conn| {
            introspect::row_count(conn, name)
        })
    }

    fn search_sparse(
        &self,
        table: &str,
        terms: &[String],
        limit: usize,
    ) -> Result<Vec<RankedHit>> {
        db::with_deadline(&self.conn, table, self.query_timeout, |conn| {
            fts::search_bm25(conn, table, terms, limit)
        })
    }

    fn search_dense(&self, table: &str, query: &[f32], limit: usize) -> Result<Vec<RankedHit>> {
        db::with_deadline(&self.conn, table, self.query_timeout, |conn| {
            vector::search_cosine(conn, table, query, limit)
        })
    }
}
