use super::CmdContext;
use crate::output::render_mode;
use anyhow::Result;
use clap::Args;
use relir_core::IndexStore;
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct CountArgs {
    /// Table to count rows in.
    pub table: String,
}

#[derive(Debug, Serialize)]
struct CountOutput {
    table: String,
    rows: u64,
}

pub fn run_count(args: &CountArgs, ctx: &CmdContext) -> Result<()> {
    let store = ctx.open_store()?;
    let out = CountOutput {
        table: args.table.clone(),
        rows: store.row_count(&args.table)?,
    };
    render_mode(
        ctx.output,
        &out,
        |o, w| writeln!(w, "{}", o.rows),
        |o, w| writeln!(w, "{}: {} rows", o.table, o.rows),
    )
}
