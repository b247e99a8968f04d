//! Handler for `linkcheck tree`.

use std::path::PathBuf;

use linkcheck_ops::ops_tree::{self, TreeOptions};
use linkcheck_util::errors::LinkcheckError;

use crate::commands::ExitOutcome;

pub async fn exec(
    project: Option<String>,
    depth: Option<usize>,
    duplicates: bool,
    inverted: bool,
    why: Option<String>,
    conflicts: bool,
    licenses: bool,
) -> miette::Result<ExitOutcome> {
    let project_root = match project {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().map_err(LinkcheckError::Io)?,
    };

    if !project_root.join("Linkcheck.toml").is_file() {
        return Err(LinkcheckError::Manifest {
            message: format!("No Linkcheck.toml found in {}", project_root.display()),
        }
        .into());
    }

    let opts = TreeOptions { depth, why, duplicates, conflicts, licenses, inverted };

    ops_tree::tree(&project_root, &opts).await?;
    Ok(ExitOutcome::Clean)
}
