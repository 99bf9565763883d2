//! Sparse (BM25) retrieval.
//!
//! Standalone search and the rank primitive used by fusion share
//! [`normalize_query`], so both paths always send the same terms to the
//! store.

use crate::fusion::RankedId;
use regex::Regex;
use relir_core::{IndexStore, RankedHit, Result, RetrievalError};
use std::sync::OnceLock;
use tracing::instrument;

#[allow(clippy::expect_used)]
fn non_word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\w\s]").expect("non-word pattern compiles"))
}

/// Normalize free text into disjunctive search terms.
///
/// Every character that is neither a word character nor whitespace becomes
/// a space; the result is split on runs of whitespace.
#[must_use]
pub fn normalize_query(query_text: &str) -> Vec<String> {
    non_word_pattern()
        .replace_all(query_text, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn normalized_terms(query_text: &str) -> Result<Vec<String>> {
    let terms = normalize_query(query_text);
    if terms.is_empty() {
        return Err(RetrievalError::EmptyQuery);
    }
    Ok(terms)
}

/// Top `top_n` hits from sparse table `table`, best first.
///
/// # Errors
///
/// - [`RetrievalError::EmptyQuery`] if the query has no word characters.
/// - [`RetrievalError::InvalidParameters`] if `top_n` is zero.
/// - Any store error, including [`RetrievalError::RetrievalTimeout`].
#[instrument(skip(store, query_text))]
pub fn sparse_search<S: IndexStore + ?Sized>(
    store: &S,
    query_text: &str,
    top_n: usize,
    table: &str,
) -> Result<Vec<RankedHit>> {
    if top_n == 0 {
        return Err(RetrievalError::InvalidParameters(
            "top_n must be greater than zero".to_string(),
        ));
    }
    let terms = normalized_terms(query_text)?;
    store.search_sparse(table, &terms, top_n)
}

/// Rank positions (1 = best) of the top `limit` sparse hits.
///
/// # Errors
///
/// Same as [`sparse_search`], except a zero `limit` yields an empty list.
pub fn sparse_rank<S: IndexStore + ?Sized>(
    store: &S,
    query_text: &str,
    table: &str,
    limit: usize,
) -> Result<Vec<RankedId>> {
    let terms = normalized_terms(query_text)?;
    let hits = store.search_sparse(table, &terms, limit)?;
    Ok(RankedId::from_hits(hits))
}
