//! `simplec` — the command-line front end for the Simple teaching compiler.
//!
//! This binary is a thin wrapper: all of the actual lexing, parsing, scope
//! management and Sea-of-Nodes construction lives in the [`simple_lang`]
//! library crate. `simplec` only reads a source file, drives the single
//! parse entry point, and reports success or the first fatal error.
//!
//! # Exit codes
//!
//! - `0` — parse succeeded
//! - `1` — parse failed (the error is printed to stderr)

use clap::{Parser, Subcommand};
use simple_lang::ty::Ty;
use std::path::PathBuf;

/// Command-line interface for `simplec`.
#[derive(Parser)]
#[command(name = "simplec")]
#[command(about = "Front end for the Simple teaching language", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a source file and report success or the first fatal error.
    ///
    /// This runs the single parse entry point (lexer + recursive-descent
    /// parser + scope/SSA/memory-alias construction) and nothing else —
    /// there is no separate type-checking or code-generation phase.
    Check {
        /// Path to a Simple source file.
        file: PathBuf,
    },
    /// Parse a source file and emit its Sea-of-Nodes graph as GraphViz.
    ///
    /// Equivalent to placing `#showGraph;` inside the source, except the
    /// dump happens unconditionally once the whole program has parsed.
    Graph {
        /// Path to a Simple source file.
        file: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { file } => run_check(&file),
        Commands::Graph { file } => run_graph(&file),
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}

fn run_check(file: &PathBuf) -> Result<(), String> {
    let source = read_source(file)?;
    log::debug!("parsing {} ({} bytes)", file.display(), source.len());
    let output = simple_lang::compile(&source, Ty::int_bot()).map_err(|e| e.to_string())?;
    log::debug!("parse finished: {} graph nodes", output.graph.node_count());
    if output.show_graph {
        print!("{}", output.graph.to_graphviz());
    }
    println!("{}: ok", file.display());
    Ok(())
}

fn run_graph(file: &PathBuf) -> Result<(), String> {
    let source = read_source(file)?;
    log::debug!("parsing {} ({} bytes)", file.display(), source.len());
    let output = simple_lang::compile(&source, Ty::int_bot()).map_err(|e| e.to_string())?;
    print!("{}", output.graph.to_graphviz());
    Ok(())
}

fn read_source(file: &PathBuf) -> Result<String, String> {
    std::fs::read_to_string(file).map_err(|e| format!("reading {}: {e}", file.display()))
}
