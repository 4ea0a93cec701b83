// SPDX-License-Identifier: PMPL-1.0-or-later

//! vapt-report: compile assessment sessions into report document models
//!
//! Resolves captured findings against a knowledge base catalog, merges them
//! across hosts, orders them by severity and binds evidence, then prints a
//! summary and exports the document model as JSON or YAML.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use vapt_report::config::{load_config, CompileConfig};
use vapt_report::evidence::EvidenceLimits;
use vapt_report::knowledge::{load_catalog, KnowledgeBaseIndex};
use vapt_report::merge::StatusPolicy;
use vapt_report::report::{self, ReportOutputFormat};
use vapt_report::resolve::TitleMatching;
use vapt_report::{inventory, session};

#[derive(Parser)]
#[command(name = "vapt-report")]
#[command(version)]
#[command(about = "Compile security assessment findings into a report document model")]
#[command(long_about = None)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a session into a document model
    Compile {
        /// Session file (JSON or YAML)
        #[arg(short, long)]
        session: PathBuf,

        /// Knowledge base catalog (JSON or YAML)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Compilation settings (JSON or YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Evidence images kept per finding
        #[arg(long)]
        max_evidence: Option<usize>,

        /// Largest evidence payload accepted, in bytes
        #[arg(long)]
        max_image_bytes: Option<usize>,

        /// Fail when merged findings disagree on status
        #[arg(long)]
        strict_status: bool,

        /// Title matching strategy for findings without a catalog key
        #[arg(long, value_enum)]
        title_matching: Option<TitleMatching>,

        /// Export format when the output extension does not say
        #[arg(short, long, value_enum, default_value = "json")]
        format: ReportOutputFormat,

        /// Write the compiled document to file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Knowledge base catalog tools
    Kb {
        #[command(subcommand)]
        command: KbCommands,
    },

    /// IP inventory tools
    Inventory {
        #[command(subcommand)]
        command: InventoryCommands,
    },

    /// Compare two compiled reports
    Diff {
        /// Earlier report
        #[arg(value_name = "BASE")]
        base: PathBuf,

        /// Later report
        #[arg(value_name = "COMPARE")]
        compare: PathBuf,
    },
}

#[derive(Subcommand)]
enum KbCommands {
    /// Fuzzy search the catalog
    Search {
        #[arg(short, long)]
        catalog: PathBuf,

        #[arg(value_name = "QUERY")]
        query: String,

        /// Maximum results
        #[arg(short, long, default_value = "5")]
        top: usize,
    },

    /// Export the catalog as JSON
    Export {
        #[arg(short, long)]
        catalog: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum InventoryCommands {
    /// Extract an IP inventory from a CSV or text export
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_index(path: &Path) -> Result<KnowledgeBaseIndex> {
    let catalog = load_catalog(path)?;
    KnowledgeBaseIndex::from_catalog(catalog)
        .with_context(|| format!("indexing catalog {}", path.display()))
}

fn write_or_print(content: &str, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
            println!("Saved to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compile {
            session: session_path,
            catalog,
            config,
            max_evidence,
            max_image_bytes,
            strict_status,
            title_matching,
            format,
            output,
        } => {
            let mut settings = match &config {
                Some(path) => load_config(path)?,
                None => CompileConfig::default(),
            };
            settings = settings.with_evidence_limits(EvidenceLimits {
                max_per_finding: max_evidence.or(settings.evidence.max_per_finding),
                max_image_bytes: max_image_bytes.or(settings.evidence.max_image_bytes),
            });
            if strict_status {
                settings = settings.with_status_policy(StatusPolicy::Strict);
            }
            if let Some(matching) = title_matching {
                settings = settings.with_title_matching(matching);
            }

            let index = load_index(&catalog)?;
            let bundle = session::load_session(&session_path)?;
            let compilation = vapt_report::compile(&bundle, &index, &settings)
                .with_context(|| format!("compiling {}", session_path.display()))?;

            report::print_report(&compilation);

            if let Some(output_path) = output {
                let format = output_path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(ReportOutputFormat::parse)
                    .unwrap_or(format);
                report::save_report(&compilation, format, output_path)?;
            }
        }

        Commands::Kb { command } => match command {
            KbCommands::Search {
                catalog,
                query,
                top,
            } => {
                let index = load_index(&catalog)?;
                let hits = index.search(&query, top);
                if hits.is_empty() {
                    println!("No catalog entries match '{}'", query);
                }
                for hit in hits {
                    println!(
                        "{:.2}  {} {}",
                        hit.score,
                        hit.entry.title.bold(),
                        format!("({})", hit.entry.key).dimmed()
                    );
                }
            }
            KbCommands::Export { catalog, output } => {
                let index = load_index(&catalog)?;
                let json = index.to_catalog().to_json()?;
                write_or_print(&json, output)?;
            }
        },

        Commands::Inventory { command } => match command {
            InventoryCommands::Import { file, output } => {
                let import = inventory::import_file(&file)?;
                tracing::info!(
                    records = import.records.len(),
                    duplicates = import.duplicates,
                    rejected = import.rejected.len(),
                    "inventory imported"
                );
                let json = serde_json::to_string_pretty(&import.records)?;
                write_or_print(&json, output)?;
            }
        },

        Commands::Diff { base, compare } => {
            let base_doc = report::load_report(&base)?;
            let compare_doc = report::load_report(&compare)?;
            let output = report::format_diff(
                &base_doc,
                &compare_doc,
                &base.display().to_string(),
                &compare.display().to_string(),
            );
            println!("{}", output);
        }
    }

    Ok(())
}
