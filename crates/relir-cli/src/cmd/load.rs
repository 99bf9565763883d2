use super::{CmdContext, read_records};
use crate::output::{pretty_kv, render_mode};
use anyhow::{Context, Result};
use clap::Args;
use relir_core::{DocumentRow, IndexKind};
use relir_search::resolve_index_kind;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Existing sparse or dense table to load into.
    pub table: String,

    /// JSONL file of `{"id", "contents"}` or `{"id", "vector"}` records; `-` for stdin.
    pub input: PathBuf,
}

#[derive(Debug, Serialize)]
struct LoadOutput {
    table: String,
    kind: IndexKind,
    rows: usize,
}

pub fn run_load(args: &LoadArgs, ctx: &CmdContext) -> Result<()> {
    let mut store = ctx.open_store()?;
    let descriptor = resolve_index_kind(&store, &args.table)?;
    let records = read_records(&args.input)?;

    let rows = records
        .into_iter()
        .map(|record| {
            let id = record.id.clone();
            record.into_row(descriptor.kind).with_context(|| {
                let field = match descriptor.kind {
                    IndexKind::Sparse => "contents",
                    IndexKind::Dense => "vector",
                };
                format!(
                    "record '{id}' has no '{field}' field for {} table '{}'",
                    descriptor.kind, args.table
                )
            })
        })
        .collect::<Result<Vec<DocumentRow>>>()?;

    let written = store.insert_rows(&args.table, &rows)?;
    info!(table = %args.table, rows = written, "corpus loaded");

    let out = LoadOutput {
        table: args.table.clone(),
        kind: descriptor.kind,
        rows: written,
    };
    render_mode(
        ctx.output,
        &out,
        |o, w| writeln!(w, "{}\t{}\t{}", o.table, o.kind, o.rows),
        |o, w| {
            pretty_kv(w, "table", &o.table)?;
            pretty_kv(w, "kind", o.kind.as_str())?;
            pretty_kv(w, "loaded", o.rows.to_string())
        },
    )
}
