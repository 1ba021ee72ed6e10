//! Export command - Write the schema as a downloadable JSON file

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use schemaboard_core::export_file_name;

use super::{write_document, Board};
use crate::GlobalOptions;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file (defaults to `<export dir>/<project>_schema.json`)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Print the document to stdout instead of writing a file
    #[arg(long, conflicts_with = "output")]
    stdout: bool,
}

/// Execute the export command
pub async fn execute(args: ExportArgs, global: GlobalOptions) -> Result<()> {
    let board = Board::open(&global)?;
    let document = board.document();

    if args.stdout {
        println!("{}", document.to_json_pretty()?);
        return Ok(());
    }

    let path = args.output.unwrap_or_else(|| {
        board
            .config
            .export_dir(&board.root)
            .join(export_file_name(board.session.project_name()))
    });
    write_document(&path, &document, board.config.export.pretty)?;

    println!(
        "Exported {} table(s) and {} relationship(s) to {}",
        document.schema.len(),
        document.edges.len(),
        path.display()
    );
    Ok(())
}
