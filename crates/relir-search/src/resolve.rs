//! Index type resolution from schema introspection.
//!
//! A table with a `contents` column is sparse; otherwise one with an
//! `embedding` column is dense. The check runs on every call so a table
//! recreated with a different layout is picked up immediately.

use relir_core::{IndexDescriptor, IndexKind, IndexStore, Result, RetrievalError};
use tracing::debug;

/// Classify `table` as sparse or dense.
///
/// # Errors
///
/// Returns [`RetrievalError::UnknownIndexType`] when the table has neither
/// marker column (including when it does not exist), or any store error.
pub fn resolve_index_kind<S: IndexStore + ?Sized>(
    store: &S,
    table: &str,
) -> Result<IndexDescriptor> {
    let columns = store.columns(table)?;
    let kind = IndexKind::from_columns(&columns).ok_or_else(|| RetrievalError::UnknownIndexType {
        table: table.to_string(),
    })?;

    debug!(table, %kind, "index kind resolved");
    Ok(IndexDescriptor {
        table_name: table.to_string(),
        kind,
    })
}

/// Resolve both fusion tables and return them as `(sparse, dense)`.
///
/// The tables may be given in either order. Nothing is searched here, so a
/// bad pair fails before any retrieval query runs.
///
/// # Errors
///
/// Returns [`RetrievalError::AmbiguousFusionTables`] when both tables
/// resolve to the same kind, or any resolution error.
pub fn resolve_fusion_tables<S: IndexStore + ?Sized>(
    store: &S,
    first: &str,
    second: &str,
) -> Result<(IndexDescriptor, IndexDescriptor)> {
    let a = resolve_index_kind(store, first)?;
    let b = resolve_index_kind(store, second)?;

    match (a.kind, b.kind) {
        (IndexKind::Sparse, IndexKind::Dense) => Ok((a, b)),
        (IndexKind::Dense, IndexKind::Sparse) => Ok((b, a)),
        (kind, _) => Err(RetrievalError::AmbiguousFusionTables {
            first: a.table_name,
            second: b.table_name,
            kind,
        }),
    }
}
