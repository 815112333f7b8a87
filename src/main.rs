//! scalar-ir - inspect the scalar operator table and its definition files

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use scalar_ir::definition::{load_definitions, render_definitions, OperatorDecl};
use scalar_ir::expression::{Tag, Taxonomy};
use std::path::PathBuf;

/// Inspect the scalar expression operator table
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List operator kinds, optionally only those carrying a tag
    List {
        #[arg(short, long)]
        tag: Option<Tag>,
    },
    /// Show the fields and tags of one operator
    Describe { name: String },
    /// Print the operator table in definition format
    Definitions {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Verify a definition file against the operator table
    Check { file: PathBuf },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match args.command {
        Command::List { tag } => {
            let kinds: Vec<_> = match tag {
                Some(tag) => Taxonomy::kinds_with_tag(tag).collect(),
                None => Taxonomy::all().to_vec(),
            };
            for kind in &kinds {
                println!("{:<16} {}", kind.name(), kind.tags());
            }
            println!("({} operators)", kinds.len());
        }
        Command::Describe { name } => {
            let kind = Taxonomy::lookup(&name).context("Failed to describe operator")?;
            let def = Taxonomy::operator(kind);
            println!("{}", OperatorDecl::from(def));
            for field in def.fields {
                let role = if field.typ.is_child() { "child" } else { "leaf" };
                println!("   - {}: {} ({})", field.name, field.typ, role);
            }
            if let Some(negated) = kind.negated_comparison() {
                println!("   negated by {}", negated);
            }
            if let Some(commuted) = kind.commuted_comparison() {
                println!("   commutes to {}", commuted);
            }
        }
        Command::Definitions { output } => {
            let text = render_definitions();
            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("📝 Wrote definitions to {}", path.display());
                }
                None => print!("{}", text),
            }
        }
        Command::Check { file } => {
            let decls = load_definitions(&file)?;
            println!(
                "✅ {} declares all {} operators",
                file.display(),
                decls.len()
            );
        }
    }

    Ok(())
}
