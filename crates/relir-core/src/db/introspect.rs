//! Schema introspection: column sets, declared vector dimensions, row counts.
//!
//! Table names are bound as parameters here (`pragma_table_info(?1)`,
//! `sqlite_master`); only [`row_count`] interpolates, after validation.

use crate::error::Result;
use crate::ident::quoted;
use crate::model::DENSE_MARKER_COLUMN;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// One column as reported by `pragma_table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
}

/// Columns of `table` in declaration order. Empty when the table is absent.
///
/// # Errors
///
/// Returns an error if the pragma query fails.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
    let rows = stmt.query_map(params![table], |row| {
        Ok(ColumnInfo {
            name: row.get(0)?,
            declared_type: row.get(1)?,
        })
    })?;

    let mut columns = Vec::new();
    for row in rows {
        columns.push(row?);
    }
    Ok(columns)
}

/// Lower-cased column names of `table`. Empty when the table is absent.
///
/// # Errors
///
/// Returns an error if the pragma query fails.
pub fn column_names(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    Ok(table_columns(conn, table)?
        .into_iter()
        .map(|column| column.name.to_ascii_lowercase())
        .collect())
}

/// Whether a table (or virtual table) named `table` exists.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Parse the dimensionality out of a `VECTOR(<n>)` declared type.
#[must_use]
pub fn parse_vector_dimension(declared_type: &str) -> Option<usize> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"(?i)^\s*vector\s*\(\s*(\d+)\s*\)\s*$").ok())
        .as_ref()?;

    pattern
        .captures(declared_type)
        .and_then(|caps| caps.get(1))
        .and_then(|dim| dim.as_str().parse().ok())
}

/// Dimensionality of the `embedding` column of `table`.
///
/// Uses the declared `VECTOR(<n>)` type when present, otherwise the length
/// of the first stored vector. `None` means the table has no embedding
/// column, or it is untyped and empty.
///
/// # Errors
///
/// Returns an error if introspection fails or `table` is unsafe to
/// interpolate.
pub fn embedding_dimension(conn: &Connection, table: &str) -> Result<Option<usize>> {
    let columns = table_columns(conn, table)?;
    let Some(column) = columns
        .iter()
        .find(|column| column.name.eq_ignore_ascii_case(DENSE_MARKER_COLUMN))
    else {
        return Ok(None);
    };

    if let Some(dim) = parse_vector_dimension(&column.declared_type) {
        return Ok(Some(dim));
    }

    let sql = format!(
        "SELECT json_array_length(embedding) FROM {} LIMIT 1",
        quoted(table)?
    );
    let stored: Option<Option<i64>> = conn.query_row(&sql, [], |row| row.get(0)).optional()?;
    Ok(stored
        .flatten()
        .and_then(|len| usize::try_from(len).ok()))
}

/// Number of rows in `table`.
///
/// # Errors
///
/// Returns an error if `table` is unsafe to interpolate or the count fails.
pub fn row_count(conn: &Connection, table: &str) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quoted(table)?);
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_table;
    use crate::error::RetrievalError;
    use crate::model::IndexKind;

    #[test]
    fn parse_vector_dimension_accepts_declared_types() {
        assert_eq!(parse_vector_dimension("VECTOR(768)"), Some(768));
        assert_eq!(parse_vector_dimension("vector( 3 )"), Some(3));
        assert_eq!(parse_vector_dimension("TEXT"), None);
        assert_eq!(parse_vector_dimension("VECTOR"), None);
        assert_eq!(parse_vector_dimension("VECTOR(abc)"), None);
    }

    #[test]
    fn columns_of_missing_table_are_empty() {
        let conn = Connection::open_in_memory().expect("open");
        assert!(column_names(&conn, "nope").expect("columns").is_empty());
        assert!(!table_exists(&conn, "nope").expect("exists"));
    }

    #[test]
    fn column_names_are_lower_cased() {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch("CREATE TABLE mixed (ID TEXT, Contents TEXT)")
            .expect("create");
        let names = column_names(&conn, "mixed").expect("columns");
        assert!(names.contains("id"));
        assert!(names.contains("contents"));
    }

    #[test]
    fn embedding_dimension_prefers_declared_type() {
        let conn = Connection::open_in_memory().expect("open");
        create_table(&conn, "vectors", IndexKind::Dense, 4).expect("create");
        assert_eq!(embedding_dimension(&conn, "vectors").expect("dim"), Some(4));
    }

    #[test]
    fn embedding_dimension_falls_back_to_stored_rows() {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch(
            "CREATE TABLE loose (id TEXT PRIMARY KEY, embedding TEXT);
             INSERT INTO loose VALUES ('a', '[0.1, 0.2, 0.3]');",
        )
        .expect("seed");
        assert_eq!(embedding_dimension(&conn, "loose").expect("dim"), Some(3));
    }

    #[test]
    fn embedding_dimension_is_none_for_sparse_tables() {
        let conn = Connection::open_in_memory().expect("open");
        create_table(&conn, "corpus", IndexKind::Sparse, 0).expect("create");
        assert_eq!(embedding_dimension(&conn, "corpus").expect("dim"), None);
    }

    #[test]
    fn row_count_counts_and_validates() {
        let conn = Connection::open_in_memory().expect("open");
        create_table(&conn, "corpus", IndexKind::Sparse, 0).expect("create");
        conn.execute_batch(
            "INSERT INTO corpus VALUES ('a', 'x'); INSERT INTO corpus VALUES ('b', 'y');",
        )
        .expect("seed");

        assert_eq!(row_count(&conn, "corpus").expect("count"), 2);
        assert!(matches!(
            row_count(&conn, "corpus--"),
            Err(RetrievalError::InvalidIdentifier(_))
        ));
    }
}
