//! Handler for `linkcheck check`: runs the full pipeline and reports the
//! exit code (0 = clean, 1 = problems found).

use std::path::PathBuf;

use linkcheck_util::errors::LinkcheckError;

use crate::commands::ExitOutcome;

pub async fn exec(
    project: Option<String>,
    max_parsers: Option<usize>,
    dot: Option<String>,
    report: Option<String>,
) -> miette::Result<ExitOutcome> {
    let project_root = match project {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().map_err(LinkcheckError::Io)?,
    };

    let check_report = linkcheck_ops::ops_check::run(&project_root, max_parsers).await?;
    let problems: Vec<&linkcheck_linker::LinkageProblem> = check_report.problems.iter().collect();

    let shadow_candidates: Vec<linkcheck_classpath::ClasspathEntry> = check_report
        .classpath
        .unselected
        .iter()
        .map(|u| linkcheck_classpath::ClasspathEntry {
            artifact: u.candidate.clone(),
            archive_path: u.candidate_archive_path.clone(),
        })
        .collect();
    let repository = linkcheck_classpath::ClassRepository::with_shadow_candidates(
        check_report.classpath.classpath.clone(),
        shadow_candidates,
    );

    if let Some(path) = dot {
        let dot_text = linkcheck_ops::ops_report::render_dot(&problems, &repository);
        std::fs::write(&path, dot_text).map_err(LinkcheckError::Io)?;
    }
    if let Some(path) = report {
        let listing = linkcheck_ops::ops_report::render_grouped_listing(&problems, &check_report.classpath, &repository);
        std::fs::write(&path, listing).map_err(LinkcheckError::Io)?;
    }

    if problems.is_empty() {
        linkcheck_util::progress::status("Finished", "no linkage problems found");
        Ok(ExitOutcome::Clean)
    } else {
        for problem in &problems {
            println!("{}: {}", problem.source_class, problem.message());
        }
        linkcheck_util::progress::status_warn("Finished", &format!("{} linkage problem(s) found", problems.len()));
        Ok(ExitOutcome::ProblemsFound)
    }
}
