//! pgplan: compile and run query plans against PostgreSQL.
//!
//! # Usage
//!
//! ```bash
//! # Show the SQL for a plan stored as JSON
//! pgplan compile plan.json
//!
//! # Run a plan with bound parameters
//! pgplan query plan.json --bind id=42
//!
//! # Run raw SQL
//! pgplan exec 'SELECT * FROM "Acme.Hr.Employee" WHERE "Id" = @id' --bind id=42
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use pgplan::config::{Settings, DATABASE_URL_ENV};
use pgplan::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pgplan")]
#[command(version)]
#[command(about = "Compile expression-tree query plans into PostgreSQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    pgplan compile plan.json
    pgplan query plan.json --bind id=42 --format json
    pgplan exec 'DELETE FROM \"Acme.Hr.Employee\" WHERE \"Id\" = @id' --bind id=7 --non-query")]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    /// Database connection URL
    #[arg(long, env = "PGPLAN_DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Settings file (defaults to <config dir>/pgplan/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SQL for a plan without running it
    Compile {
        /// Plan file (JSON)
        plan: PathBuf,

        /// Named parameters (name=value)
        #[arg(short, long)]
        bind: Vec<String>,
    },
    /// Compile a plan, run it and print the records
    Query {
        /// Plan file (JSON)
        plan: PathBuf,

        /// Named parameters (name=value)
        #[arg(short, long)]
        bind: Vec<String>,
    },
    /// Run SQL text with @name placeholders
    Exec {
        /// The SQL text
        sql: String,

        /// Named parameters (name=value)
        #[arg(short, long)]
        bind: Vec<String>,

        /// Print the affected-row count instead of rows
        #[arg(long)]
        non_query: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::from_path(path)?,
        None => Settings::load()?,
    };
    init_logging(&settings, cli.verbose)?;

    match &cli.command {
        Commands::Compile { plan, bind } => {
            let command = compile(&load_plan(plan)?, &parse_bindings(bind)?)?;
            print_command(&command);
        }
        Commands::Query { plan, bind } => {
            let command = compile(&load_plan(plan)?, &parse_bindings(bind)?)?;
            if cli.verbose {
                print_command(&command);
            }
            let mut db = connect(cli, &settings)?;
            let records = db.retrieve_text(&command)?;
            format_output(&records, cli.format);
        }
        Commands::Exec { sql, bind, non_query } => {
            let command = Command::with_parameters(sql.clone(), parse_bindings(bind)?);
            let mut db = connect(cli, &settings)?;
            if *non_query {
                let affected = db.non_query(&command)?;
                println!("{} {} rows affected", "✓".green(), affected);
            } else {
                let records = db.retrieve_text(&command)?;
                format_output(&records, cli.format);
            }
        }
    }

    Ok(())
}

fn init_logging(settings: &Settings, verbose: bool) -> anyhow::Result<()> {
    let directive = if verbose { "pgplan=debug" } else { settings.log_filter.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(directive))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn connect(cli: &Cli, settings: &Settings) -> anyhow::Result<Database<PgExecutor>> {
    let Some(url) = cli.database_url.as_ref().or(settings.database_url.as_ref()) else {
        bail!("No database URL. Use --database-url or set {}", DATABASE_URL_ENV);
    };
    if cli.verbose {
        eprintln!("{} {}", "Connecting to:".dimmed(), url);
    }
    Ok(Database::new(PgExecutor::connect(url)?))
}

fn load_plan(path: &Path) -> anyhow::Result<QueryPlan> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing plan {}", path.display()))
}

/// `name=value` pairs. Values are typed by shape: integer, float, bool,
/// `null`, UUID, otherwise text.
fn parse_bindings(bindings: &[String]) -> anyhow::Result<Vec<NamedParameter>> {
    bindings
        .iter()
        .map(|binding| {
            let Some((name, raw)) = binding.split_once('=') else {
                bail!("binding '{}' is not name=value", binding);
            };
            Ok(NamedParameter::new(name.trim().trim_start_matches('@'), parse_value(raw)))
        })
        .collect()
}

fn parse_value(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i32>() {
        Value::Int(n)
    } else if let Ok(n) = raw.parse::<i64>() {
        Value::BigInt(n)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::Double(f)
    } else if raw == "true" {
        Value::Bool(true)
    } else if raw == "false" {
        Value::Bool(false)
    } else if raw.eq_ignore_ascii_case("null") {
        Value::Null
    } else if let Ok(u) = uuid::Uuid::parse_str(raw) {
        Value::Uuid(u)
    } else {
        Value::Text(raw.to_string())
    }
}

fn print_command(command: &Command) {
    println!("{}", "Generated SQL:".green().bold());
    println!("{}", command.text.white());

    if !command.parameters.is_empty() {
        println!();
        println!("{}", "Bindings:".cyan());
        for p in &command.parameters {
            println!("  @{} = {}", p.name, p.value.to_string().yellow());
        }
    }
}

fn format_output(records: &[GenericRecord], format: OutputFormat) {
    if records.is_empty() {
        println!("{}", "(no results)".dimmed());
        return;
    }

    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = records.iter().map(GenericRecord::to_json).collect();
            println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
        }
        OutputFormat::Table => {
            // Column order from the first record
            let columns: Vec<&str> = records[0].names().collect();

            let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
            for record in records {
                for (i, column) in columns.iter().enumerate() {
                    let len = cell(record, column).chars().count();
                    widths[i] = widths[i].max(len);
                }
            }

            let header: Vec<String> = columns
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:width$}", c, width = w))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            println!("{}", sep.join("─┼─").dimmed());

            for record in records {
                let cells: Vec<String> = columns
                    .iter()
                    .zip(&widths)
                    .map(|(c, w)| format!("{:width$}", cell(record, c), width = w))
                    .collect();
                println!("{}", cells.join(" │ "));
            }

            println!();
            println!("{} row(s) returned", records.len().to_string().cyan());
        }
    }
}

fn cell(record: &GenericRecord, column: &str) -> String {
    record.value(column).map(Value::to_string).unwrap_or_default()
}
