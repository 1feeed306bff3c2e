// SPDX-License-Identifier: PMPL-1.0-or-later

//! casefile: serve and query a case-file fact database

use anyhow::{anyhow, Result};
use casefile::prolog::UnknownPolicy;
use casefile::query::{ResultEnvelope, Substitution};
use casefile::{server, Config, Session};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "casefile")]
#[command(version)]
#[command(about = "Case-file fact database served through a Prolog-style inference session")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file (.yaml, .yml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Clause file to consult, overriding the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP query interface
    Serve {
        /// Listen host
        #[arg(long)]
        host: Option<String>,

        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,

        /// Refuse /query/:goal requests
        #[arg(long)]
        no_raw_queries: bool,
    },

    /// Run one goal and print its answers
    Ask {
        /// Goal text, e.g. "clue(ID, SCENE, _, _)."
        #[arg(value_name = "GOAL")]
        goal: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Stop after this many answers
        #[arg(short, long)]
        limit: Option<usize>,

        /// Raise an existence error for undefined predicates
        #[arg(long)]
        strict: bool,
    },

    /// Consult the clause file and list its predicates
    Check,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database = db;
    }
    init_logging(&config, cli.verbose)?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            no_raw_queries,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if no_raw_queries {
                config.query.allow_raw_queries = false;
            }

            let session = Session::open(&config.database, config.engine_options())?;
            println!("{} {}", "casefile".bold().cyan(), env!("CARGO_PKG_VERSION"));
            println!("   Clause file: {}", config.database.display());
            println!("   Listening on http://{}", config.bind_address());
            println!("   Press Ctrl+C to stop\n");
            server::run_server(&config, Arc::new(session))?;
        }

        Commands::Ask {
            goal,
            format,
            limit,
            strict,
        } => {
            if strict {
                config.engine.unknown = UnknownPolicy::Error;
            }
            let session = Session::open(&config.database, config.engine_options())?;
            let envelope = session.execute(&goal, &config.query_limits().capped(limit));

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&envelope)?),
                OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&envelope)?),
                OutputFormat::Table => print_table(&envelope),
            }

            if let Some(err) = envelope.error {
                return Err(anyhow!(err));
            }
        }

        Commands::Check => {
            let session = Session::open(&config.database, config.engine_options())?;
            println!("{}", "CLAUSE BASE".bold().yellow());
            println!("  File: {}", config.database.display());
            println!("  Clauses: {}", session.clause_count());
            for (predicate, clauses) in session.predicates() {
                println!("    {:<24} {}", predicate.to_string(), clauses);
            }
            println!("  {}", "OK".green().bold());
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `--verbose` or the configured level
fn init_logging(config: &Config, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { config.log_level.as_str() };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logger: {}", e))
}

fn print_table(envelope: &ResultEnvelope) {
    let columns: BTreeSet<&str> = envelope
        .results
        .iter()
        .flat_map(|substitution| substitution.keys().map(String::as_str))
        .collect();

    if columns.is_empty() {
        let verdict = if envelope.results.is_empty() { "false" } else { "true" };
        if envelope.is_ok() {
            println!("{}", verdict.bold());
        }
    } else {
        let widths: Vec<usize> = columns
            .iter()
            .map(|column| {
                envelope
                    .results
                    .iter()
                    .map(|row| row.get(*column).map_or(0, |v| v.to_string().chars().count()))
                    .chain(std::iter::once(column.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(column, width)| format!("{:<width$}", column, width = width))
            .collect();
        println!("{}", header.join("  ").bold());
        for row in &envelope.results {
            println!("{}", render_row(row, &columns, &widths));
        }
    }

    if envelope.truncated {
        println!("{}", "(more answers exist; raise --limit)".yellow());
    }
    if let Some(err) = &envelope.error {
        println!("{}", err.to_string().red().bold());
        println!("  {}", err.detail().red());
    }
}

fn render_row(row: &Substitution, columns: &BTreeSet<&str>, widths: &[usize]) -> String {
    columns
        .iter()
        .zip(widths)
        .map(|(column, width)| {
            let cell = row.get(*column).map(|v| v.to_string()).unwrap_or_default();
            format!("{:<width$}", cell, width = width)
        })
        .collect::<Vec<_>>()
        .join("  ")
}
