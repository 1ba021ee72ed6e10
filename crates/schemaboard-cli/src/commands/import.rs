//! Import command - Replace the schema with an exported document

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use schemaboard_core::SessionEvent;

use super::Board;
use crate::GlobalOptions;

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Document to import
    input: PathBuf,
}

/// Execute the import command
pub async fn execute(args: ImportArgs, global: GlobalOptions) -> Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    // A failed import returns before the document is written
    let mut board = Board::open_for_replace(&global)?;
    let events = board
        .session
        .import_text(&text)
        .map_err(|e| anyhow::anyhow!("Failed to import schema: {}", e))?;
    board.save()?;

    if let Some(SessionEvent::Imported {
        tables,
        relationships,
    }) = events.first()
    {
        println!(
            "Imported {} table(s) and {} relationship(s) into '{}'",
            tables,
            relationships,
            board.session.project_name()
        );
    }
    Ok(())
}
