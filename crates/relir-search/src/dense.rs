//! Dense (embedding) retrieval.
//!
//! Scores are `1 - cosine_distance`, highest first. The query vector must
//! have exactly the dimensionality stored in the table.

use crate::fusion::RankedId;
use relir_core::{IndexStore, RankedHit, Result, RetrievalError};
use tracing::instrument;

fn check_dimension<S: IndexStore + ?Sized>(
    store: &S,
    table: &str,
    query_vector: &[f32],
) -> Result<()> {
    match store.embedding_dimension(table)? {
        Some(expected) if expected != query_vector.len() => {
            Err(RetrievalError::DimensionMismatch {
                table: table.to_string(),
                expected,
                actual: query_vector.len(),
            })
        }
        Some(_) => Ok(()),
        None if store.columns(table)?.is_empty() => {
            Err(RetrievalError::TableNotFound(table.to_string()))
        }
        // Untyped and empty: nothing to compare against or to return.
        None => Ok(()),
    }
}

/// Top `top_n` hits from dense table `table`, most similar first.
///
/// # Errors
///
/// - [`RetrievalError::DimensionMismatch`] if `query_vector` has the wrong
///   length.
/// - [`RetrievalError::InvalidParameters`] if `top_n` is zero.
/// - Any store error, including [`RetrievalError::RetrievalTimeout`].
#[instrument(skip(store, query_vector), fields(dim = query_vector.len()))]
pub fn dense_search<S: IndexStore + ?Sized>(
    store: &S,
    query_vector: &[f32],
    top_n: usize,
    table: &str,
) -> Result<Vec<RankedHit>> {
    if top_n == 0 {
        return Err(RetrievalError::InvalidParameters(
            "top_n must be greater than zero".to_string(),
        ));
    }
    check_dimension(store, table, query_vector)?;
    store.search_dense(table, query_vector, top_n)
}

/// Rank positions (1 = best) of the top `limit` dense hits.
///
/// # Errors
///
/// Same as [`dense_search`], except a zero `limit` yields an empty list.
pub fn dense_rank<S: IndexStore + ?Sized>(
    store: &S,
    query_vector: &[f32],
    table: &str,
    limit: usize,
) -> Result<Vec<RankedId>> {
    check_dimension(store, table, query_vector)?;
    let hits = store.search_dense(table, query_vector, limit)?;
    Ok(RankedId::from_hits(hits))
}
