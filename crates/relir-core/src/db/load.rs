//! Bulk ingestion of document rows into sparse and dense tables.
//!
//! All rows of a batch land in one transaction: either the whole batch is
//! stored or none of it is. Re-inserting an existing `id` updates it in place,
//! so the FTS5 sync triggers see a regular update.

use super::introspect::{column_names, embedding_dimension};
use super::vector::encode_embedding_json;
use crate::error::{Result, RetrievalError};
use crate::ident::quoted;
use crate::model::{DocumentRow, IndexKind, RowContents};
use rusqlite::{Connection, params};
use tracing::{debug, info};

/// Replace NUL characters, which FTS5 tokenization cannot handle, with
/// U+FFFD.
#[must_use]
pub fn sanitize_text(raw: &str) -> String {
    raw.replace('\0', "\u{FFFD}")
}

/// Insert or update `rows` in `table` inside a single transaction.
///
/// Every row must match the kind of the table: text rows for sparse tables,
/// embeddings of the table's dimensionality for dense tables.
///
/// # Errors
///
/// - [`RetrievalError::TableNotFound`] if the table does not exist.
/// - [`RetrievalError::UnknownIndexType`] if it is neither sparse nor dense.
/// - [`RetrievalError::InvalidParameters`] if a row's kind does not match.
/// - [`RetrievalError::DimensionMismatch`] if an embedding has the wrong
///   length.
/// - [`RetrievalError::Store`] if an insert fails. Nothing is committed.
pub fn insert_rows(conn: &mut Connection, table: &str, rows: &[DocumentRow]) -> Result<usize> {
    let name = quoted(table)?;
    let kind = table_kind(conn, table)?;
    let expected_dim = match kind {
        IndexKind::Dense => embedding_dimension(conn, table)?,
        IndexKind::Sparse => None,
    };

    let sql = match kind {
        IndexKind::Sparse => format!(
            "INSERT INTO {name} (id, contents) VALUES (?1, ?2) \
             ON CONFLICT(id) DO UPDATE SET contents = excluded.contents"
        ),
        IndexKind::Dense => format!(
            "INSERT INTO {name} (id, embedding) VALUES (?1, ?2) \
             ON CONFLICT(id) DO UPDATE SET embedding = excluded.embedding"
        ),
    };

    let tx = conn.transaction()?;
    let mut inserted = 0_usize;
    {
        let mut stmt = tx.prepare(&sql)?;
        let mut dim = expected_dim;
        for row in rows {
            let payload = match (&row.contents, kind) {
                (RowContents::Text(text), IndexKind::Sparse) => sanitize_text(text),
                (RowContents::Embedding(vector), IndexKind::Dense) => {
                    let expected = *dim.get_or_insert(vector.len());
                    if vector.len() != expected {
                        return Err(RetrievalError::DimensionMismatch {
                            table: table.to_string(),
                            expected,
                            actual: vector.len(),
                        });
                    }
                    encode_embedding_json(vector)
                }
                (contents, _) => {
                    return Err(RetrievalError::InvalidParameters(format!(
                        "row '{}' is a {} row but table '{table}' is {kind}",
                        row.id,
                        contents.kind()
                    )));
                }
            };
            inserted += stmt.execute(params![row.id, payload])?;
        }
    }
    tx.commit()?;

    info!(table, inserted, "rows loaded");
    Ok(inserted)
}

fn table_kind(conn: &Connection, table: &str) -> Result<IndexKind> {
    let columns = column_names(conn, table)?;
    if columns.is_empty() {
        return Err(RetrievalError::TableNotFound(table.to_string()));
    }
    let kind = IndexKind::from_columns(&columns).ok_or_else(|| RetrievalError::UnknownIndexType {
        table: table.to_string(),
    })?;
    debug!(table, %kind, "load target resolved");
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fts::search_bm25;
    use crate::db::introspect::row_count;
    use crate::db::schema::create_table;

    #[test]
    fn sanitize_replaces_nul() {
        assert_eq!(sanitize_text("a\0b"), "a\u{FFFD}b");
        assert_eq!(sanitize_text("clean"), "clean");
    }

    #[test]
    fn sparse_rows_are_searchable_after_load() {
        let mut conn = Connection::open_in_memory().expect("open");
        create_table(&conn, "corpus", IndexKind::Sparse, 0).expect("create");
        let rows = vec![
            DocumentRow::text("d1", "rank fusion"),
            DocumentRow::text("d2", "null\0byte text"),
        ];
        assert_eq!(insert_rows(&mut conn, "corpus", &rows).expect("load"), 2);
        assert_eq!(row_count(&conn, "corpus").expect("count"), 2);

        let hits = search_bm25(&conn, "corpus", &["fusion".to_string()], 5).expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "d1");
    }

    #[test]
    fn reloading_an_id_updates_the_index() {
        let mut conn = Connection::open_in_memory().expect("open");
        create_table(&conn, "corpus", IndexKind::Sparse, 0).expect("create");
        insert_rows(&mut conn, "corpus", &[DocumentRow::text("d1", "old words")]).expect("load");
        insert_rows(&mut conn, "corpus", &[DocumentRow::text("d1", "new words")]).expect("reload");

        assert_eq!(row_count(&conn, "corpus").expect("count"), 1);
        assert!(
            search_bm25(&conn, "corpus", &["old".to_string()], 5)
                .expect("search")
                .is_empty()
        );
    }

    #[test]
    fn dense_rows_must_match_declared_dimension() {
        let mut conn = Connection::open_in_memory().expect("open");
        create_table(&conn, "vectors", IndexKind::Dense, 2).expect("create");
        let rows = vec![
            DocumentRow::embedding("v1", vec![1.0, 0.0]),
            DocumentRow::embedding("v2", vec![1.0, 0.0, 0.0]),
        ];
        let err = insert_rows(&mut conn, "vectors", &rows).expect_err("mismatch");
        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch {
                expected: 2,
                actual: 3,
                ..
            }
        ));
        assert_eq!(row_count(&conn, "vectors").expect("count"), 0);
    }

    #[test]
    fn untyped_dense_table_takes_dimension_from_first_row() {
        let mut conn = Connection::open_in_memory().expect("open");
        conn.execute_batch("CREATE TABLE loose (id TEXT PRIMARY KEY, embedding TEXT)")
            .expect("create");
        let rows = vec![
            DocumentRow::embedding("a", vec![1.0, 2.0]),
            DocumentRow::embedding("b", vec![1.0]),
        ];
        assert!(matches!(
            insert_rows(&mut conn, "loose", &rows),
            Err(RetrievalError::DimensionMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn row_kind_must_match_table_kind() {
        let mut conn = Connection::open_in_memory().expect("open");
        create_table(&conn, "corpus", IndexKind::Sparse, 0).expect("create");
        assert!(matches!(
            insert_rows(&mut conn, "corpus", &[DocumentRow::embedding("x", vec![1.0])]),
            Err(RetrievalError::InvalidParameters(_))
        ));
    }

    #[test]
    fn missing_and_untyped_tables_are_rejected() {
        let mut conn = Connection::open_in_memory().expect("open");
        assert!(matches!(
            insert_rows(&mut conn, "ghost", &[]),
            Err(RetrievalError::TableNotFound(_))
        ));

        conn.execute_batch("CREATE TABLE other (id TEXT, body TEXT)")
            .expect("create");
        assert!(matches!(
            insert_rows(&mut conn, "other", &[]),
            Err(RetrievalError::UnknownIndexType { .. })
        ));
    }
}
