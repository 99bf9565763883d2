//! FTS5 full-text search with BM25 ranking over sparse tables.
//!
//! A sparse table `<name>` is indexed by the external-content FTS5 table
//! `<name>_fts` (see [`super::schema`]).
//!
//! # Query form
//!
//! Callers hand over already-normalized terms. They are rendered as a
//! disjunction of quoted phrases (`"alpha" OR "beta"`) and bound to `MATCH`
//! as a parameter, so no term can act as an FTS5 operator or reach the SQL
//! text.
//!
//! # Scores
//!
//! FTS5's `bm25()` is lower-is-better. Hits report `-bm25()` so that, like
//! every other source, larger scores mean more relevant.

use super::introspect::table_exists;
use super::schema::{fts_table_name, sparse_index_sql};
use crate::error::{Result, RetrievalError};
use crate::ident::validate_identifier;
use crate::model::RankedHit;
use rusqlite::{Connection, params};
use tracing::{debug, info};

/// Render normalized terms as an FTS5 OR-disjunction of quoted phrases.
#[must_use]
pub fn render_disjunction(terms: &[String]) -> String {
    terms
        .iter()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Search sparse table `table` for any of `terms`, best match first.
///
/// # Errors
///
/// - [`RetrievalError::EmptyQuery`] when `terms` is empty.
/// - [`RetrievalError::TableNotFound`] / [`RetrievalError::SparseIndexMissing`]
///   when the base table or its FTS5 index is absent.
/// - [`RetrievalError::Store`] when SQLite rejects the query.
pub fn search_bm25(
    conn: &Connection,
    table: &str,
    terms: &[String],
    limit: usize,
) -> Result<Vec<RankedHit>> {
    let name = validate_identifier(table)?;
    if terms.is_empty() {
        return Err(RetrievalError::EmptyQuery);
    }
    if limit == 0 {
        return Ok(Vec::new());
    }

    let fts = fts_table_name(name);
    if !table_exists(conn, name)? {
        return Err(RetrievalError::TableNotFound(name.to_string()));
    }
    if !table_exists(conn, &fts)? {
        return Err(RetrievalError::SparseIndexMissing(name.to_string()));
    }

    let sql = format!(
        "SELECT d.id, -bm25(\"{fts}\") AS score \
         FROM \"{fts}\" \
         INNER JOIN \"{name}\" AS d ON d.rowid = \"{fts}\".rowid \
         WHERE \"{fts}\" MATCH ?1 \
         ORDER BY score DESC, d.id \
         LIMIT ?2"
    );
    let expression = render_disjunction(terms);
    debug!(table = name, %expression, limit, "sparse search");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![expression, i64::try_from(limit).unwrap_or(i64::MAX)],
        |row| {
            Ok(RankedHit {
                id: row.get(0)?,
                score: row.get(1)?,
            })
        },
    )?;

    let mut hits = Vec::new();
    for row in rows {
        hits.push(row?);
    }
    Ok(hits)
}

/// Create the FTS5 index for `table` if needed and rebuild it from the base
/// table.
///
/// Works for tables created outside relir as long as they have `id` and
/// `contents` columns.
///
/// # Errors
///
/// Returns an error if the table is missing, unsafe, or the rebuild fails.
pub fn rebuild_sparse_index(conn: &Connection, table: &str) -> Result<()> {
    let name = validate_identifier(table)?;
    if !table_exists(conn, name)? {
        return Err(RetrievalError::TableNotFound(name.to_string()));
    }

    conn.execute_batch(&sparse_index_sql(name)?)?;
    let fts = fts_table_name(name);
    conn.execute_batch(&format!(
        "INSERT INTO \"{fts}\"(\"{fts}\") VALUES ('rebuild');"
    ))?;
    info!(table = name, "sparse index rebuilt");
    Ok(())
}
