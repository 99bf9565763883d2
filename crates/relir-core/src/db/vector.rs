//! Cosine-similarity search over dense tables.
//!
//! Similarity is `1 - cosine_distance`, highest first. When `sqlite-vec` is
//! loaded the distance is computed inside SQLite with
//! `vec_distance_cosine`; otherwise rows are scored in-process with the same
//! definition.

use crate::error::{Result, RetrievalError};
use crate::ident::validate_identifier;
use crate::model::RankedHit;
use rusqlite::{Connection, params};
use std::cmp::Ordering;
use tracing::debug;

/// Encode a vector as the JSON array text stored in `embedding` columns.
#[must_use]
pub fn encode_embedding_json(embedding: &[f32]) -> String {
    let mut encoded = String::from("[");
    for (idx, value) in embedding.iter().enumerate() {
        if idx != 0 {
            encoded.push(',');
        }
        encoded.push_str(&value.to_string());
    }
    encoded.push(']');
    encoded
}

/// Rank rows of dense table `table` by cosine similarity to `query`.
///
/// The caller is responsible for checking that `query` matches the stored
/// dimensionality.
///
/// # Errors
///
/// Returns an error if the table is missing, unsafe, or the query fails.
pub fn search_cosine(
    conn: &Connection,
    table: &str,
    query: &[f32],
    limit: usize,
) -> Result<Vec<RankedHit>> {
    let name = validate_identifier(table)?;
    if limit == 0 || query.is_empty() {
        return Ok(Vec::new());
    }

    if relir_sqlite_vec::vec_version(conn).is_some() {
        return search_with_sqlite_vec(conn, name, query, limit);
    }

    debug!(table = name, "sqlite-vec not loaded, scoring vectors in-process");
    search_in_process(conn, name, query, limit)
}

fn search_with_sqlite_vec(
    conn: &Connection,
    table: &str,
    query: &[f32],
    limit: usize,
) -> Result<Vec<RankedHit>> {
    // Rows the in-process scorer skips are filtered here as well, so both
    // paths rank the same rows.
    let sql = format!(
        "SELECT id, distance FROM ( \
             SELECT id, vec_distance_cosine(vec_f32(embedding), vec_f32(?1)) AS distance \
             FROM \"{table}\" \
             WHERE json_valid(embedding) \
               AND json_type(embedding) = 'array' \
               AND json_array_length(embedding) = ?3 \
               AND NOT EXISTS ( \
                   SELECT 1 FROM json_each(embedding) \
                   WHERE type NOT IN ('integer', 'real') \
               ) \
         ) \
         WHERE distance IS NOT NULL \
         ORDER BY distance ASC, id \
         LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql).map_err(|err| missing_table(table, err))?;
    let rows = stmt.query_map(
        params![
            encode_embedding_json(query),
            i64::try_from(limit).unwrap_or(i64::MAX),
            i64::try_from(query.len()).unwrap_or(i64::MAX)
        ],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
    )?;

    let mut hits = Vec::new();
    for row in rows {
        let (id, distance) = row?;
        hits.push(RankedHit {
            id,
            score: 1.0 - distance,
        });
    }
    Ok(hits)
}

fn search_in_process(
    conn: &Connection,
    table: &str,
    query: &[f32],
    limit: usize,
) -> Result<Vec<RankedHit>> {
    let sql = format!("SELECT id, embedding FROM \"{table}\"");
    let mut stmt = conn.prepare(&sql).map_err(|err| missing_table(table, err))?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
    })?;

    let mut scored = Vec::new();
    for row in rows {
        let (id, embedding_json) = row?;
        let Some(embedding_json) = embedding_json else {
            debug!("skipping embedding row {id} without a vector");
            continue;
        };
        let embedding: Vec<f32> = match serde_json::from_str(&embedding_json) {
            Ok(value) => value,
            Err(err) => {
                debug!("skipping malformed embedding row {id}: {err}");
                continue;
            }
        };

        let Some(cosine) = cosine_similarity(query, &embedding) else {
            debug!("skipping unscorable embedding row {id}");
            continue;
        };
        scored.push(RankedHit { id, score: cosine });
    }

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    scored.truncate(limit);
    Ok(scored)
}

fn missing_table(table: &str, err: rusqlite::Error) -> RetrievalError {
    if err.to_string().contains("no such table") {
        RetrievalError::TableNotFound(table.to_string())
    } else {
        RetrievalError::Store(err)
    }
}

/// Cosine similarity in `[-1, 1]`, or `None` for mismatched or zero vectors.
#[must_use]
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Option<f64> {
    if left.len() != right.len() || left.is_empty() {
        return None;
    }

    let mut dot = 0.0_f64;
    let mut left_norm_sq = 0.0_f64;
    let mut right_norm_sq = 0.0_f64;

    for (a, b) in left.iter().zip(right.iter()) {
        let (a, b) = (f64::from(*a), f64::from(*b));
        dot += a * b;
        left_norm_sq += a * a;
        right_norm_sq += b * b;
    }

    let denom = left_norm_sq.sqrt() * right_norm_sq.sqrt();
    if denom <= f64::EPSILON {
        return None;
    }

    Some((dot / denom).clamp(-1.0, 1.0))
}
