//! CLI argument definitions for `linkcheck`.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "linkcheck",
    version,
    about = "A static linkage checker for JVM classpaths",
    long_about = "linkcheck resolves a BOM's dependency graph, builds a classpath, \
                  and verifies every symbolic reference emitted by its class files \
                  resolves under the JVM's linkage rules."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the dependency graph, build the classpath, and check linkage
    Check {
        /// Project directory (defaults to the current directory)
        #[arg(long)]
        project: Option<String>,
        /// Bound the class-parsing worker pool (default: CPU count)
        #[arg(long)]
        max_parsers: Option<usize>,
        /// Write a Graphviz `dot` report to this path
        #[arg(long)]
        dot: Option<String>,
        /// Write the grouped human-readable report to this path
        #[arg(long)]
        report: Option<String>,
    },

    /// Print the resolved dependency tree
    Tree {
        /// Project directory (defaults to the current directory)
        #[arg(long)]
        project: Option<String>,
        /// Maximum depth
        #[arg(long)]
        depth: Option<usize>,
        /// Show modules requested at more than one version
        #[arg(long)]
        duplicates: bool,
        /// Show inverted tree (dependents)
        #[arg(long)]
        inverted: bool,
        /// Explain why a module (`group:name`) is included
        #[arg(long)]
        why: Option<String>,
        /// Show version conflicts resolved by nearest-wins
        #[arg(long)]
        conflicts: bool,
        /// Show dependency licenses from POM metadata
        #[arg(long)]
        licenses: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
