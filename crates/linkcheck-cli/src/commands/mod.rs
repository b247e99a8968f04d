//! Command dispatch and handler modules.

mod check;
mod tree;

use miette::Result;

use crate::cli::{Cli, Command};

/// The result of a dispatched command, mapped to an exit code by `main`
/// (`0` clean, `1` problems found; a `miette::Report` surfaced by `?`
/// before reaching here maps to `2`).
pub enum ExitOutcome {
    Clean,
    ProblemsFound,
}

impl ExitOutcome {
    pub fn code(&self) -> i32 {
        match self {
            ExitOutcome::Clean => 0,
            ExitOutcome::ProblemsFound => 1,
        }
    }
}

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<ExitOutcome> {
    match cli.command {
        Command::Check { project, max_parsers, dot, report } => {
            check::exec(project, max_parsers, dot, report).await
        }
        Command::Tree { project, depth, duplicates, inverted, why, conflicts, licenses } => {
            tree::exec(project, depth, duplicates, inverted, why, conflicts, licenses).await
        }
    }
}
