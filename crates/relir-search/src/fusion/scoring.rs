//! Weighted Reciprocal Rank Fusion (RRF).
//!
//! Only rank positions matter here. BM25 scores and cosine similarities
//! live on different scales, so they are never compared directly:
//!
//! ```text
//! score(d) = weight_sparse / (k + rank_sparse(d))   if d is in the sparse list
//!          + weight_dense  / (k + rank_dense(d))    if d is in the dense list
//! ```
//!
//! An id missing from one list contributes nothing for that list but still
//! competes on the other term. Equal fused scores keep the order in which
//! ids were first seen, scanning the sparse list before the dense list.

use relir_core::config::FusionConfig;
use relir_core::{RankedHit, Result, RetrievalError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Default RRF smoothing constant.
pub const DEFAULT_RRF_K: f64 = 60.0;

/// Default number of fused results returned.
pub const DEFAULT_TOP_N: usize = 5;

/// An id and its 1-based position within one source's ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedId {
    pub id: String,
    pub rank: usize,
}

impl RankedId {
    pub fn new(id: impl Into<String>, rank: usize) -> Self {
        Self {
            id: id.into(),
            rank,
        }
    }

    /// Assign positions 1, 2, 3, ... to hits that are already best-first.
    #[must_use]
    pub fn from_hits(hits: Vec<RankedHit>) -> Vec<Self> {
        hits.into_iter()
            .enumerate()
            .map(|(idx, hit)| Self::new(hit.id, idx + 1))
            .collect()
    }

    /// Assign positions 1, 2, 3, ... to ids in the given order.
    pub fn sequence<I, T>(ids: I) -> Vec<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        ids.into_iter()
            .enumerate()
            .map(|(idx, id)| Self::new(id, idx + 1))
            .collect()
    }
}

/// Parameters of one fusion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionParams {
    /// Results taken from each source and returned after fusion.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Smoothing constant. Smaller values favour top ranks more strongly.
    #[serde(default = "default_k")]
    pub k: f64,
    #[serde(default = "default_weight")]
    pub weight_sparse: f64,
    #[serde(default = "default_weight")]
    pub weight_dense: f64,
}

const fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

const fn default_k() -> f64 {
    DEFAULT_RRF_K
}

const fn default_weight() -> f64 {
    1.0
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            k: default_k(),
            weight_sparse: default_weight(),
            weight_dense: default_weight(),
        }
    }
}

impl From<&FusionConfig> for FusionParams {
    fn from(config: &FusionConfig) -> Self {
        Self {
            top_n: config.top_n,
            k: config.rrf_k,
            weight_sparse: config.weight_sparse,
            weight_dense: config.weight_dense,
        }
    }
}

impl FusionParams {
    /// Check `top_n > 0`, `k > 0` and non-negative finite weights.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::InvalidParameters`] naming the first bad
    /// field.
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(invalid("top_n must be greater than zero"));
        }
        if !(self.k.is_finite() && self.k > 0.0) {
            return Err(invalid(&format!("k must be positive, got {}", self.k)));
        }
        for (name, weight) in [
            ("weight_sparse", self.weight_sparse),
            ("weight_dense", self.weight_dense),
        ] {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(invalid(&format!(
                    "{name} must be a non-negative number, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: &str) -> RetrievalError {
    RetrievalError::InvalidParameters(message.to_string())
}

/// One fused result with the per-source positions that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusionResult {
    pub id: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sparse_rank: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dense_rank: Option<usize>,
}

/// Weighted reciprocal-rank contribution of one list position.
#[must_use]
pub fn rrf_term(weight: f64, k: f64, rank: usize) -> f64 {
    let rank = f64::from(u32::try_from(rank).unwrap_or(u32::MAX));
    weight / (k + rank)
}

/// Fuse two precomputed rank lists.
///
/// Every id from either list enters the candidate pool. When an id occurs
/// more than once in the same list its best position counts. The result is
/// sorted by fused score descending and truncated to `params.top_n`.
///
/// # Errors
///
/// Returns [`RetrievalError::InvalidParameters`] if `params` fail
/// [`FusionParams::validate`] or any entry has rank 0.
pub fn fuse_from_ranks(
    sparse: &[RankedId],
    dense: &[RankedId],
    params: &FusionParams,
) -> Result<Vec<FusionResult>> {
    params.validate()?;
    if let Some(entry) = sparse.iter().chain(dense).find(|entry| entry.rank == 0) {
        return Err(invalid(&format!(
            "rank positions start at 1, got 0 for id '{}'",
            entry.id
        )));
    }

    let mut pool: Vec<FusionResult> = Vec::with_capacity(sparse.len() + dense.len());
    let mut slot: HashMap<&str, usize> = HashMap::with_capacity(sparse.len() + dense.len());

    for (list, is_sparse) in [(sparse, true), (dense, false)] {
        for entry in list {
            let idx = match slot.entry(entry.id.as_str()) {
                Entry::Occupied(found) => *found.get(),
                Entry::Vacant(vacant) => {
                    pool.push(FusionResult {
                        id: entry.id.clone(),
                        score: 0.0,
                        sparse_rank: None,
                        dense_rank: None,
                    });
                    *vacant.insert(pool.len() - 1)
                }
            };

            let rank = if is_sparse {
                &mut pool[idx].sparse_rank
            } else {
                &mut pool[idx].dense_rank
            };
            *rank = Some(rank.map_or(entry.rank, |seen| seen.min(entry.rank)));
        }
    }

    for result in &mut pool {
        result.score = result
            .sparse_rank
            .map_or(0.0, |rank| rrf_term(params.weight_sparse, params.k, rank))
            + result
                .dense_rank
                .map_or(0.0, |rank| rrf_term(params.weight_dense, params.k, rank));
    }

    // Stable: equal scores keep first-appearance order.
    pool.sort_by(|a, b| b.score.total_cmp(&a.score));
    pool.truncate(params.top_n);
    Ok(pool)
}
