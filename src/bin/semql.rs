//! semql: the SemQL CLI
//!
//! Converts Spider dataset files into SemQL derivations.
//!
//! # Usage
//!
//! ```bash
//! # Convert a dataset
//! semql convert --data-path train.json --table-path tables.json --output train_semql.json
//!
//! # Show the derivation of one record
//! semql explain --data-path dev.json --table-path tables.json --index 12
//!
//! # Show the grammar reference
//! semql grammar
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use semql::dataset::{self, Record};
use semql::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "semql")]
#[command(author = "SemQL Contributors")]
#[command(version)]
#[command(about = "Spider SQL to SemQL derivations", long_about = None)]
#[command(after_help = "EXAMPLES:
    semql convert --data-path train.json --table-path tables.json --output out.json
    semql explain --data-path dev.json --table-path tables.json --index 0
    semql grammar")]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a dataset file and write the augmented records
    Convert {
        /// Dataset file (JSON array of records)
        #[arg(long)]
        data_path: PathBuf,

        /// Schema file (JSON array of database schemas)
        #[arg(long)]
        table_path: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Encoder configuration file
        #[arg(short, long, env = "SEMQL_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Show the derivation of one record
    Explain {
        #[arg(long)]
        data_path: PathBuf,

        #[arg(long)]
        table_path: PathBuf,

        /// Position of the record in the dataset
        #[arg(short, long, default_value_t = 0)]
        index: usize,

        #[arg(short, long, env = "SEMQL_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Show the grammar symbol reference
    Grammar,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Convert {
            data_path,
            table_path,
            output,
            config,
        } => convert(data_path, table_path, output, config.as_deref()),
        Commands::Explain {
            data_path,
            table_path,
            index,
            config,
        } => explain(data_path, table_path, *index, config.as_deref()),
        Commands::Grammar => {
            show_grammar();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "semql=debug" } else { "semql=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn convert(data_path: &Path, table_path: &Path, output: &Path, config: Option<&Path>) -> Result<()> {
    let config = EncoderConfig::discover(config).context("loading encoder configuration")?;
    tracing::debug!(?config, "Encoder configuration");

    let report = dataset::convert_file(data_path, table_path, output, &config)
        .with_context(|| format!("converting {}", data_path.display()))?;

    println!(
        "{} Finished {} records, skipped {}",
        "✓".green(),
        report.converted.to_string().cyan(),
        report.skipped.to_string().yellow()
    );
    println!("{} {}", "Output:".dimmed(), output.display().to_string().white());
    Ok(())
}

fn explain(data_path: &Path, table_path: &Path, index: usize, config: Option<&Path>) -> Result<()> {
    let config = EncoderConfig::discover(config).context("loading encoder configuration")?;
    let catalog = Catalog::load_from_file(table_path)?;
    let records = dataset::load_records(data_path)?;

    let Some(raw) = records.get(index) else {
        bail!("record {} out of range ({} records)", index, records.len());
    };
    let record = Record::from_value(raw)?;

    println!("{}", "SemQL Derivation".cyan().bold());
    println!();
    println!("{} {}", "Database:".dimmed(), record.db_id.white());
    println!("{} {}", "Question:".dimmed(), record.question.yellow());
    if !record.query.is_empty() {
        println!("{} {}", "Query:".dimmed(), record.query.white());
    }
    println!();

    let encoding = record.encode(&catalog, &config)?;

    println!("{}", "Tokens:".green().bold());
    for token in &encoding.tokens {
        let symbol = token.symbol();
        println!(
            "  {:8} {:>4}  {}",
            symbol.label().cyan(),
            token.choice(),
            symbol.description().dimmed()
        );
    }

    println!();
    println!("{}", "Rule label:".green().bold());
    println!("  {}", encoding.rule_label().white());

    if !encoding.values.is_empty() {
        println!();
        println!("{}", "Values:".green().bold());
        for (i, value) in encoding.values.iter().enumerate() {
            let rendered = serde_json::to_string(value)?;
            println!("  V({}) = {}", i, rendered.yellow());
        }
    }

    show_keys(catalog.get(&record.db_id)?, &encoding);
    Ok(())
}

/// Key columns of the tables the derivation touches.
fn show_keys(schema: &Schema, encoding: &Encoding) {
    let tables: BTreeSet<usize> = encoding
        .tokens
        .iter()
        .filter_map(|token| match token {
            Token::T(table) => Some(*table),
            _ => None,
        })
        .collect();
    let columns = schema
        .col_table
        .iter()
        .enumerate()
        .filter(|(_, table)| table.is_some_and(|t| tables.contains(&t)))
        .map(|(column, _)| column);

    let links = schema.key_links(columns);
    if links.is_empty() {
        return;
    }

    println!();
    println!("{}", "Keys:".green().bold());
    for (column, other) in links {
        if column == other {
            println!("  {} {}", schema.qualified_name(column).white(), "(primary)".dimmed());
        } else {
            println!(
                "  {} {} {}",
                schema.qualified_name(column).white(),
                "→".dimmed(),
                schema.qualified_name(other).cyan()
            );
        }
    }
}

fn show_grammar() {
    println!("{}", "SemQL Grammar Reference".cyan().bold());
    println!();

    println!(
        "{:8} {:12} {}",
        "Symbol".white().bold(),
        "Choices".white().bold(),
        "Meaning".white().bold()
    );
    println!("{}", "─".repeat(72).dimmed());

    for symbol in Symbol::ALL {
        let choices = match symbol.productions() {
            Some(n) => format!("0..{}", n),
            None => "index".to_string(),
        };
        println!(
            "{:8} {:12} {}",
            symbol.label().cyan().bold(),
            choices.yellow(),
            symbol.description().white()
        );
    }
}
