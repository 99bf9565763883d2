use super::CmdContext;
use crate::output::{pretty_kv, render_mode};
use anyhow::{Result, bail};
use clap::Args;
use relir_core::{IndexKind, IndexStore};
use relir_search::resolve_index_kind;
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Sparse table whose full-text index should be rebuilt.
    pub table: String,
}

#[derive(Debug, Serialize)]
struct IndexOutput {
    table: String,
    rows: u64,
}

/// Rebuild the BM25 index of a sparse table from its stored rows.
pub fn run_index(args: &IndexArgs, ctx: &CmdContext) -> Result<()> {
    let store = ctx.open_store()?;
    let descriptor = resolve_index_kind(&store, &args.table)?;
    if descriptor.kind != IndexKind::Sparse {
        bail!(
            "table '{}' is {}; only sparse tables carry a full-text index",
            args.table,
            descriptor.kind
        );
    }

    store.rebuild_sparse_index(&args.table)?;
    let out = IndexOutput {
        table: args.table.clone(),
        rows: store.row_count(&args.table)?,
    };
    render_mode(
        ctx.output,
        &out,
        |o, w| writeln!(w, "{}\t{}", o.table, o.rows),
        |o, w| {
            pretty_kv(w, "reindexed", &o.table)?;
            pretty_kv(w, "rows", o.rows.to_string())
        },
    )
}
