//! Rank fusion of sparse and dense retrieval.
//!
//! [`scoring`] holds the pure weighted-RRF math over precomputed rank
//! lists; [`hybrid`] runs both live searches against an index store and
//! feeds their ranks into it.

pub mod hybrid;
pub mod scoring;

pub use hybrid::{fuse, fuse_text};
pub use scoring::{
    DEFAULT_RRF_K, DEFAULT_TOP_N, FusionParams, FusionResult, RankedId, fuse_from_ranks, rrf_term,
};
