//! SQL command - Quick CREATE TABLE rendering

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use schemaboard_core::generate_legacy_sql;

use super::{print_info, Board};
use crate::GlobalOptions;

#[derive(Args, Debug)]
pub struct SqlArgs {
    /// Write to a file instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

pub async fn execute(args: SqlArgs, global: GlobalOptions) -> Result<()> {
    let board = Board::open(&global)?;
    let sql = generate_legacy_sql(board.graph());

    match args.output {
        Some(path) => {
            std::fs::write(&path, &sql)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_info(&format!("Wrote {}", path.display()), global.quiet);
        }
        None => println!("{}", sql),
    }
    Ok(())
}
