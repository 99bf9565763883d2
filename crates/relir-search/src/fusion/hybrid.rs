//! Live hybrid retrieval: resolve both tables, rank each, fuse.
//!
//! Both sources are always queried, whatever their weights, so every id
//! either source returns is a fusion candidate. Any failure on either side
//! aborts the call; no single-source result is ever returned in place of a
//! fused one.

use crate::dense::dense_rank;
use crate::embed::EmbeddingProvider;
use crate::fusion::scoring::{FusionParams, FusionResult, fuse_from_ranks};
use crate::resolve::resolve_fusion_tables;
use crate::sparse::sparse_rank;
use relir_core::{IndexDescriptor, IndexStore, Result};
use tracing::{debug, instrument};

/// Fuse sparse results for `query_text` with dense results for
/// `query_vector`.
///
/// `tables` may list the sparse and dense table in either order. Tables are
/// resolved before any search runs.
///
/// # Errors
///
/// - [`relir_core::RetrievalError::InvalidParameters`] for bad `params`.
/// - [`relir_core::RetrievalError::UnknownIndexType`] or
///   [`relir_core::RetrievalError::AmbiguousFusionTables`] from resolution.
/// - [`relir_core::RetrievalError::EmptyQuery`],
///   [`relir_core::RetrievalError::DimensionMismatch`] or
///   [`relir_core::RetrievalError::RetrievalTimeout`] from either search.
#[instrument(skip(store, query_text, query_vector, params), fields(top_n = params.top_n, k = params.k))]
pub fn fuse<S: IndexStore + ?Sized>(
    store: &S,
    query_text: &str,
    query_vector: &[f32],
    tables: (&str, &str),
    params: &FusionParams,
) -> Result<Vec<FusionResult>> {
    params.validate()?;
    let (sparse, dense) = resolve_fusion_tables(store, tables.0, tables.1)?;
    fuse_resolved(store, query_text, query_vector, &sparse, &dense, params)
}

/// Like [`fuse`], but embeds `query_text` with `provider` for the dense side.
///
/// The query is embedded once, after both tables have been resolved.
///
/// # Errors
///
/// Everything [`fuse`] returns, plus
/// [`relir_core::RetrievalError::Embedding`] when the provider fails.
#[instrument(skip(store, provider, query_text, params), fields(top_n = params.top_n, k = params.k))]
pub fn fuse_text<S, P>(
    store: &S,
    provider: &P,
    query_text: &str,
    tables: (&str, &str),
    params: &FusionParams,
) -> Result<Vec<FusionResult>>
where
    S: IndexStore + ?Sized,
    P: EmbeddingProvider + ?Sized,
{
    params.validate()?;
    let (sparse, dense) = resolve_fusion_tables(store, tables.0, tables.1)?;
    let query_vector = provider.embed(query_text)?;
    fuse_resolved(store, query_text, &query_vector, &sparse, &dense, params)
}

fn fuse_resolved<S: IndexStore + ?Sized>(
    store: &S,
    query_text: &str,
    query_vector: &[f32],
    sparse: &IndexDescriptor,
    dense: &IndexDescriptor,
    params: &FusionParams,
) -> Result<Vec<FusionResult>> {
    let sparse_ranks = sparse_rank(store, query_text, &sparse.table_name, params.top_n)?;
    let dense_ranks = dense_rank(store, query_vector, &dense.table_name, params.top_n)?;
    debug!(
        sparse_table = %sparse.table_name,
        dense_table = %dense.table_name,
        sparse_hits = sparse_ranks.len(),
        dense_hits = dense_ranks.len(),
        "fusing rank lists"
    );

    fuse_from_ranks(&sparse_ranks, &dense_ranks, params)
}
