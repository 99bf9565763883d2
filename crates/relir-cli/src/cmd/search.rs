use super::CmdContext;
use crate::output::{pretty_section, render_mode};
use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use relir_core::{IndexKind, RankedHit};
use relir_search::{
    EmbeddingProvider, FusionParams, FusionResult, OllamaEmbedder, dense_search, fuse, fuse_text,
    sparse_search,
};
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[command(subcommand)]
    pub command: SearchCommand,
}

#[derive(Subcommand, Debug)]
pub enum SearchCommand {
    #[command(
        about = "BM25 search over a sparse table",
        after_help = "EXAMPLES:\n    # Top 5 passages for a question\n    rir search sparse passages \"what is rank fusion\"\n\n    # Top 20, as JSON\n    rir search sparse passages \"rank fusion\" -n 20 --format json"
    )]
    Sparse(SparseArgs),

    #[command(
        about = "Cosine-similarity search over a dense table",
        after_help = "EXAMPLES:\n    # With a pre-computed query vector\n    rir search dense passage_vectors --vector '[0.1, 0.7, 0.2]'\n\n    # Embed the query text with the configured model\n    rir search dense passage_vectors --embed \"what is rank fusion\""
    )]
    Dense(DenseArgs),

    #[command(
        about = "Reciprocal rank fusion of one sparse and one dense table",
        long_about = "Run the query against one sparse and one dense table and merge the two \
                      rankings with weighted reciprocal rank fusion. The tables may be given \
                      in either order; their kinds are read from the schema.",
        after_help = "EXAMPLES:\n    # Embed the query with the configured model\n    rir search hybrid passages passage_vectors \"what is rank fusion\"\n\n    # Supply the query vector, favour the sparse ranking\n    rir search hybrid passages passage_vectors \"rank fusion\" \\\n        --vector '[0.1, 0.7, 0.2]' --weight-sparse 2 -k 30"
    )]
    Hybrid(HybridArgs),
}

#[derive(Args, Debug)]
pub struct SparseArgs {
    /// Sparse table to search.
    pub table: String,

    /// Free-text query.
    pub query: String,

    /// Number of hits. Defaults to `fusion.top_n`.
    #[arg(short = 'n', long)]
    pub top_n: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DenseArgs {
    /// Dense table to search.
    pub table: String,

    /// Query vector as a JSON array of numbers.
    #[arg(long, required_unless_present = "embed", conflicts_with = "embed")]
    pub vector: Option<String>,

    /// Text to embed with the configured model and use as the query.
    #[arg(long)]
    pub embed: Option<String>,

    /// Number of hits. Defaults to `fusion.top_n`.
    #[arg(short = 'n', long)]
    pub top_n: Option<usize>,
}

#[derive(Args, Debug)]
pub struct HybridArgs {
    /// First table (sparse or dense).
    pub first_table: String,

    /// Second table, of the other kind.
    pub second_table: String,

    /// Free-text query.
    pub query: String,

    /// Query vector as a JSON array. Without it, the query text is embedded.
    #[arg(long)]
    pub vector: Option<String>,

    /// Results per source and after fusion. Defaults to `fusion.top_n`.
    #[arg(short = 'n', long)]
    pub top_n: Option<usize>,

    /// RRF smoothing constant. Defaults to `fusion.rrf_k`.
    #[arg(short = 'k', long = "rrf-k")]
    pub k: Option<f64>,

    /// Weight of the sparse ranking. Defaults to `fusion.weight_sparse`.
    #[arg(long)]
    pub weight_sparse: Option<f64>,

    /// Weight of the dense ranking. Defaults to `fusion.weight_dense`.
    #[arg(long)]
    pub weight_dense: Option<f64>,
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    table: String,
    kind: IndexKind,
    hits: Vec<RankedHit>,
}

#[derive(Debug, Serialize)]
struct HybridOutput {
    tables: [String; 2],
    params: FusionParams,
    results: Vec<FusionResult>,
}

pub fn run_search(args: &SearchArgs, ctx: &CmdContext) -> Result<()> {
    match &args.command {
        SearchCommand::Sparse(sparse) => run_sparse(sparse, ctx),
        SearchCommand::Dense(dense) => run_dense(dense, ctx),
        SearchCommand::Hybrid(hybrid) => run_hybrid(hybrid, ctx),
    }
}

fn run_sparse(args: &SparseArgs, ctx: &CmdContext) -> Result<()> {
    let store = ctx.open_store()?;
    let top_n = args.top_n.unwrap_or(ctx.config.fusion.top_n);
    let hits = sparse_search(&store, &args.query, top_n, &args.table)?;
    render_hits(
        ctx,
        &SearchOutput {
            table: args.table.clone(),
            kind: IndexKind::Sparse,
            hits,
        },
    )
}

fn run_dense(args: &DenseArgs, ctx: &CmdContext) -> Result<()> {
    let query_vector = match (&args.vector, &args.embed) {
        (Some(raw), _) => parse_vector(raw)?,
        (None, Some(text)) => OllamaEmbedder::new(&ctx.config.embedding).embed(text)?,
        (None, None) => bail!("either --vector or --embed is required"),
    };

    let store = ctx.open_store()?;
    let top_n = args.top_n.unwrap_or(ctx.config.fusion.top_n);
    let hits = dense_search(&store, &query_vector, top_n, &args.table)?;
    render_hits(
        ctx,
        &SearchOutput {
            table: args.table.clone(),
            kind: IndexKind::Dense,
            hits,
        },
    )
}

fn run_hybrid(args: &HybridArgs, ctx: &CmdContext) -> Result<()> {
    let params = hybrid_params(args, ctx);
    let store = ctx.open_store()?;
    let tables = (args.first_table.as_str(), args.second_table.as_str());

    let results = match &args.vector {
        Some(raw) => fuse(&store, &args.query, &parse_vector(raw)?, tables, &params)?,
        None => {
            let provider = OllamaEmbedder::new(&ctx.config.embedding);
            fuse_text(&store, &provider, &args.query, tables, &params)?
        }
    };

    let out = HybridOutput {
        tables: [args.first_table.clone(), args.second_table.clone()],
        params,
        results,
    };
    render_mode(
        ctx.output,
        &out,
        |o, w| {
            for (rank, r) in o.results.iter().enumerate() {
                writeln!(
                    w,
                    "{}\t{}\t{:.6}\t{}\t{}",
                    rank + 1,
                    r.id,
                    r.score,
                    source_rank(r.sparse_rank),
                    source_rank(r.dense_rank)
                )?;
            }
            Ok(())
        },
        |o, w| {
            pretty_section(
                w,
                &format!(
                    "hybrid {} + {} (k={}, w_sparse={}, w_dense={})",
                    o.tables[0],
                    o.tables[1],
                    o.params.k,
                    o.params.weight_sparse,
                    o.params.weight_dense
                ),
            )?;
            if o.results.is_empty() {
                return writeln!(w, "no results");
            }
            writeln!(w, "{:>4}  {:>10}  {:>6}  {:>5}  id", "#", "score", "sparse", "dense")?;
            for (rank, r) in o.results.iter().enumerate() {
                writeln!(
                    w,
                    "{:>4}  {:>10.6}  {:>6}  {:>5}  {}",
                    rank + 1,
                    r.score,
                    source_rank(r.sparse_rank),
                    source_rank(r.dense_rank),
                    r.id
                )?;
            }
            Ok(())
        },
    )
}

fn hybrid_params(args: &HybridArgs, ctx: &CmdContext) -> FusionParams {
    let defaults = FusionParams::from(&ctx.config.fusion);
    FusionParams {
        top_n: args.top_n.unwrap_or(defaults.top_n),
        k: args.k.unwrap_or(defaults.k),
        weight_sparse: args.weight_sparse.unwrap_or(defaults.weight_sparse),
        weight_dense: args.weight_dense.unwrap_or(defaults.weight_dense),
    }
}

fn source_rank(rank: Option<usize>) -> String {
    rank.map_or_else(|| "-".to_string(), |r| r.to_string())
}

fn parse_vector(raw: &str) -> Result<Vec<f32>> {
    serde_json::from_str::<Vec<f32>>(raw)
        .with_context(|| format!("--vector must be a JSON array of numbers, got '{raw}'"))
}

fn render_hits(ctx: &CmdContext, out: &SearchOutput) -> Result<()> {
    render_mode(
        ctx.output,
        out,
        |o, w| {
            for (rank, hit) in o.hits.iter().enumerate() {
                writeln!(w, "{}\t{}\t{:.6}", rank + 1, hit.id, hit.score)?;
            }
            Ok(())
        },
        |o, w| {
            pretty_section(w, &format!("{} search: {}", o.kind, o.table))?;
            if o.hits.is_empty() {
                return writeln!(w, "no results");
            }
            for (rank, hit) in o.hits.iter().enumerate() {
                writeln!(w, "{:>4}  {:>10.6}  {}", rank + 1, hit.score, hit.id)?;
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_vector_accepts_json_arrays() {
        assert_eq!(parse_vector("[1, 0.5, -2]").expect("parse"), vec![1.0, 0.5, -2.0]);
    }

    #[test]
    fn parse_vector_rejects_other_json() {
        let err = parse_vector("{\"x\": 1}").expect_err("object");
        assert!(err.to_string().contains("--vector"));
    }

    #[test]
    fn missing_source_rank_renders_as_dash() {
        assert_eq!(source_rank(None), "-");
        assert_eq!(source_rank(Some(3)), "3");
    }
}
