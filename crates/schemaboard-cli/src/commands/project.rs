//! Project commands

use anyhow::Result;
use clap::Subcommand;
use schemaboard_core::Command;

use super::Board;
use crate::GlobalOptions;

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Rename the project (blank resets to "Untitled Project")
    Rename { name: String },

    /// Print the project name
    Show,
}

pub async fn execute(cmd: ProjectCommand, global: GlobalOptions) -> Result<()> {
    let mut board = Board::open(&global)?;

    match cmd {
        ProjectCommand::Rename { name } => {
            board.apply(Command::RenameProject { name }, "Renaming the project")?;
            board.save()?;
            println!("Project renamed to '{}'", board.session.project_name());
        }
        ProjectCommand::Show => println!("{}", board.session.project_name()),
    }

    Ok(())
}
