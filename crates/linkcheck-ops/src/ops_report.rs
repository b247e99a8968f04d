//! Peripheral report rendering: Graphviz `dot` output and a grouped
//! human-readable listing. Neither format is produced or consumed by the
//! core — both are pure functions of `LinkageProblem`/`ClassPathResult`.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use linkcheck_classfile::Symbol;
use linkcheck_classpath::{ClassLookup, ClassPathResult, ClassRepository};
use linkcheck_linker::{Cause, Kind, LinkageProblem};

fn symbol_label(symbol: &Symbol) -> String {
    match symbol {
        Symbol::Class(c) => c.owner.clone(),
        Symbol::Method(m) => format!("{}#{}{}", m.owner, m.name, m.descriptor),
        Symbol::Field(f) => format!("{}#{}:{}", f.owner, f.name, f.descriptor),
    }
}

fn edge_color(kind: &Kind) -> &'static str {
    match kind {
        Kind::ClassNotFound => "black",
        Kind::SymbolNotFound | Kind::FieldNotFound => "orange",
        _ => "red",
    }
}

fn edge_style(kind: &Kind) -> &'static str {
    match kind {
        Kind::ClassNotFound => "dotted",
        _ => "solid",
    }
}

/// The artifact that owns a class, as a cluster label, falling back to
/// `"(unresolved)"` when the class itself isn't on the classpath.
fn owning_artifact(repository: &ClassRepository, class_name: &str) -> String {
    match repository.find_class(class_name) {
        Ok(ClassLookup::Found(hit)) => repository.entry_artifact(hit.entry_index).to_string(),
        Ok(ClassLookup::System) => "(jdk)".to_string(),
        _ => "(unresolved)".to_string(),
    }
}

/// Renders a Graphviz `dot` graph: one cluster per artifact, class names as
/// plaintext nodes, symbol names as ellipse nodes, edges colored by problem
/// kind.
pub fn render_dot(problems: &[&LinkageProblem], repository: &ClassRepository) -> String {
    let mut clusters: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut edges = String::new();

    for problem in problems {
        let source_artifact = owning_artifact(repository, &problem.source_class);
        clusters.entry(source_artifact).or_default().push(problem.source_class.clone());

        let symbol_node = symbol_label(&problem.symbol);
        let target_artifact = problem
            .target_class
            .as_deref()
            .map(|c| owning_artifact(repository, c))
            .unwrap_or_else(|| "(unresolved)".to_string());
        clusters.entry(target_artifact).or_default().push(symbol_node.clone());

        let _ = writeln!(
            edges,
            "  \"{}\" -> \"{}\" [color={}, style={}];",
            problem.source_class,
            symbol_node,
            edge_color(&problem.kind),
            edge_style(&problem.kind),
        );
    }

    let mut out = String::from("digraph linkcheck {\n");
    for (i, (artifact, nodes)) in clusters.iter().enumerate() {
        let _ = writeln!(out, "  subgraph cluster_{i} {{");
        let _ = writeln!(out, "    label=\"{artifact}\";");
        let mut seen = std::collections::HashSet::new();
        for node in nodes {
            if seen.insert(node.clone()) {
                let shape = if node.contains('#') { "ellipse" } else { "plaintext" };
                let _ = writeln!(out, "    \"{node}\" [shape={shape}];");
            }
        }
        let _ = writeln!(out, "  }}");
    }
    out.push_str(&edges);
    out.push_str("}\n");
    out
}

/// Renders the grouped human-readable listing: one entry per
/// `(target symbol, problem message)`, referring classes indented beneath,
/// followed by a "Problematic artifacts in the dependency tree" section.
pub fn render_grouped_listing(
    problems: &[&LinkageProblem],
    classpath: &ClassPathResult,
    repository: &ClassRepository,
) -> String {
    let mut groups: BTreeMap<(String, String), Vec<&str>> = BTreeMap::new();
    for problem in problems {
        let key = (symbol_label(&problem.symbol), problem.message());
        groups.entry(key).or_default().push(&problem.source_class);
    }

    let mut out = String::new();
    for ((symbol, message), mut referrers) in groups {
        referrers.sort();
        referrers.dedup();
        let _ = writeln!(out, "{symbol}: {message}");
        for referrer in referrers {
            let _ = writeln!(out, "  referenced from {referrer}");
        }
    }

    let mut artifact_paths: BTreeMap<String, String> = BTreeMap::new();
    for problem in problems {
        match &problem.cause {
            Cause::DependencyConflict { selected, selected_path, unselected, unselected_path } => {
                artifact_paths.entry(selected.clone()).or_insert_with(|| selected_path.clone());
                artifact_paths.entry(unselected.clone()).or_insert_with(|| unselected_path.clone());
            }
            _ => {
                if let Ok(ClassLookup::Found(hit)) = repository.find_class(&problem.source_class) {
                    let artifact = repository.entry_artifact(hit.entry_index);
                    if let Some(path) = classpath.selected_path(&artifact.module_key()) {
                        artifact_paths.entry(artifact.to_string()).or_insert_with(|| path.render());
                    }
                }
            }
        }
    }

    if !artifact_paths.is_empty() {
        let _ = writeln!(out, "\nProblematic artifacts in the dependency tree:");
        for (artifact, path) in artifact_paths {
            let _ = writeln!(out, "  {artifact}: {path}");
        }
    }

    out
}
