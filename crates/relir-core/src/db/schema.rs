//! Table layouts for sparse and dense indexes.
//!
//! - Sparse table `<name>(id, contents)` plus an FTS5 external-content index
//!   `<name>_fts` kept in sync by insert/update/delete triggers.
//! - Dense table `<name>(id, embedding VECTOR(<dim>))`. The declared type
//!   records the dimensionality; vectors are stored as JSON float arrays.
//!
//! Names reach this module unvalidated; every builder validates before it
//! interpolates.

use crate::error::{Result, RetrievalError};
use crate::ident::{quoted, validate_identifier};
use crate::model::IndexKind;
use rusqlite::Connection;
use tracing::info;

/// Suffix appended to a sparse table's name to form its FTS5 index name.
pub const FTS_SUFFIX: &str = "_fts";

/// Name of the FTS5 index that backs sparse table `table`.
#[must_use]
pub fn fts_table_name(table: &str) -> String {
    format!("{table}{FTS_SUFFIX}")
}

/// Render the declared type of a dense `embedding` column.
#[must_use]
pub fn vector_type(dim: usize) -> String {
    format!("VECTOR({dim})")
}

/// DDL for the FTS5 index and its sync triggers on an existing sparse table.
///
/// # Errors
///
/// Returns [`RetrievalError::InvalidIdentifier`] for an unsafe table name.
pub fn sparse_index_sql(table: &str) -> Result<String> {
    let name = validate_identifier(table)?;
    let fts = fts_table_name(name);
    Ok(format!(
        r#"
CREATE VIRTUAL TABLE IF NOT EXISTS "{fts}" USING fts5(
    contents,
    content='{name}',
    content_rowid='rowid',
    tokenize='unicode61'
);

CREATE TRIGGER IF NOT EXISTS "{name}_ai"
AFTER INSERT ON "{name}"
BEGIN
    INSERT INTO "{fts}"(rowid, contents) VALUES (new.rowid, new.contents);
END;

CREATE TRIGGER IF NOT EXISTS "{name}_au"
AFTER UPDATE ON "{name}"
BEGIN
    INSERT INTO "{fts}"("{fts}", rowid, contents) VALUES ('delete', old.rowid, old.contents);
    INSERT INTO "{fts}"(rowid, contents) VALUES (new.rowid, new.contents);
END;

CREATE TRIGGER IF NOT EXISTS "{name}_ad"
AFTER DELETE ON "{name}"
BEGIN
    INSERT INTO "{fts}"("{fts}", rowid, contents) VALUES ('delete', old.rowid, old.contents);
END;
"#
    ))
}

/// DDL that (re)creates `table` for the given index kind.
///
/// Any previous table of that name and its FTS5 index are dropped first.
///
/// # Errors
///
/// Returns [`RetrievalError::InvalidIdentifier`] for an unsafe table name,
/// or [`RetrievalError::InvalidParameters`] for a zero dense dimension.
pub fn create_table_sql(table: &str, kind: IndexKind, dim: usize) -> Result<String> {
    let name = quoted(table)?;
    let fts = fts_table_name(table);
    let mut sql = format!("DROP TABLE IF EXISTS \"{fts}\";\nDROP TABLE IF EXISTS {name};\n");

    match kind {
        IndexKind::Sparse => {
            sql.push_str(&format!(
                "CREATE TABLE {name} (id TEXT PRIMARY KEY, contents TEXT NOT NULL);\n"
            ));
            sql.push_str(&sparse_index_sql(table)?);
        }
        IndexKind::Dense => {
            if dim == 0 {
                return Err(RetrievalError::InvalidParameters(
                    "embedding dimension must be greater than zero".to_string(),
                ));
            }
            sql.push_str(&format!(
                "CREATE TABLE {name} (id TEXT PRIMARY KEY, embedding {} NOT NULL);\n",
                vector_type(dim)
            ));
        }
    }

    Ok(sql)
}

/// Drop and recreate `table` as a sparse or dense index table.
///
/// `dim` is ignored for sparse tables.
///
/// # Errors
///
/// Returns an error if the name is unsafe or the DDL fails.
pub fn create_table(conn: &Connection, table: &str, kind: IndexKind, dim: usize) -> Result<()> {
    let sql = create_table_sql(table, kind, dim)?;
    conn.execute_batch(&sql)?;
    info!(table, %kind, dim, "table created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::introspect::{column_names, table_exists};

    #[test]
    fn sparse_table_has_contents_column_and_fts_index() {
        let conn = Connection::open_in_memory().expect("open");
        create_table(&conn, "corpus", IndexKind::Sparse, 0).expect("create");

        let columns = column_names(&conn, "corpus").expect("columns");
        assert!(columns.contains("id"));
        assert!(columns.contains("contents"));
        assert!(table_exists(&conn, "corpus_fts").expect("exists"));
    }

    #[test]
    fn dense_table_declares_dimension() {
        let conn = Connection::open_in_memory().expect("open");
        create_table(&conn, "vectors", IndexKind::Dense, 384).expect("create");

        let decl: String = conn
            .query_row(
                "SELECT type FROM pragma_table_info('vectors') WHERE name = 'embedding'",
                [],
                |row| row.get(0),
            )
            .expect("declared type");
        assert_eq!(decl, "VECTOR(384)");
        assert!(!table_exists(&conn, "vectors_fts").expect("exists"));
    }

    #[test]
    fn recreate_switches_kind_and_drops_fts() {
        let conn = Connection::open_in_memory().expect("open");
        create_table(&conn, "docs", IndexKind::Sparse, 0).expect("sparse");
        create_table(&conn, "docs", IndexKind::Dense, 8).expect("dense");

        let columns = column_names(&conn, "docs").expect("columns");
        assert!(columns.contains("embedding"));
        assert!(!columns.contains("contents"));
        assert!(!table_exists(&conn, "docs_fts").expect("exists"));
    }

    #[test]
    fn triggers_keep_fts_in_sync() {
        let conn = Connection::open_in_memory().expect("open");
        create_table(&conn, "corpus", IndexKind::Sparse, 0).expect("create");
        conn.execute(
            "INSERT INTO corpus (id, contents) VALUES ('d1', 'alpha beta')",
            [],
        )
        .expect("insert");

        let hits: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM corpus_fts WHERE corpus_fts MATCH 'alpha'",
                [],
                |row| row.get(0),
            )
            .expect("match");
        assert_eq!(hits, 1);

        conn.execute("UPDATE corpus SET contents = 'gamma' WHERE id = 'd1'", [])
            .expect("update");
        let stale: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM corpus_fts WHERE corpus_fts MATCH 'alpha'",
                [],
                |row| row.get(0),
            )
            .expect("match");
        assert_eq!(stale, 0);
    }

    #[test]
    fn rejects_unsafe_names_and_zero_dimension() {
        assert!(matches!(
            create_table_sql("x; DROP TABLE y", IndexKind::Sparse, 0),
            Err(RetrievalError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            create_table_sql("vectors", IndexKind::Dense, 0),
            Err(RetrievalError::InvalidParameters(_))
        ));
    }
}
