use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sqlsession::{Decoder, Session, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlsession")]
#[command(about = "Run statements through a sqlsession driver")]
struct Cli {
    /// Registered driver name
    #[arg(long, default_value = "sqlite")]
    driver: String,

    /// Data source handed to the driver
    #[arg(long)]
    dsn: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a read statement and print its rows
    Query {
        sql: String,
        #[arg(long = "arg")]
        args: Vec<String>,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Run a mutating statement and print its outcome
    Exec {
        sql: String,
        #[arg(long = "arg")]
        args: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Table,
}

type JsonRow = BTreeMap<String, serde_json::Value>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut session = Session::open(&cli.driver, &cli.dsn)
        .with_context(|| format!("failed to open {:?} with driver {}", cli.dsn, cli.driver))?;

    let outcome = run(&mut session, cli.command);
    session.close().context("failed to close session")?;
    outcome
}

fn run(session: &mut Session, command: Command) -> Result<()> {
    match command {
        Command::Query { sql, args, format } => {
            let args = parse_args(&args);
            let rows = session.query(&sql, &args).context("query failed")?;
            let decoder = Decoder::<JsonRow>::new(rows)?;
            let columns = decoder.columns().to_vec();
            let decoded = decoder
                .collect::<sqlsession::Result<Vec<JsonRow>>>()
                .context("decoding rows failed")?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&decoded)?),
                Format::Table => print_table(&columns, &decoded),
            }
        }
        Command::Exec { sql, args } => {
            let args = parse_args(&args);
            // Reported through the update path so statements other than
            // inserts do not fail on a missing id.
            let affected = session.update(&sql, &args).context("statement failed")?;
            println!("{} row(s) affected", affected);
        }
    }
    Ok(())
}

fn parse_args(raw: &[String]) -> Vec<Value> {
    raw.iter().map(|arg| parse_arg(arg)).collect()
}

/// Integer, float, `true`/`false` and `null` literals; anything else is text.
fn parse_arg(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        // `nan`, `inf` and friends stay text.
        if f.is_finite() {
            return Value::Float(f);
        }
    }
    match raw {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        "null" | "NULL" => Value::Null,
        _ => Value::Text(raw.to_string()),
    }
}

fn display(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => "NULL".to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn print_table(columns: &[String], rows: &[JsonRow]) {
    if columns.is_empty() {
        println!("Empty result set");
        return;
    }

    // Calculate column widths
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in rows {
        for (i, column) in columns.iter().enumerate() {
            widths[i] = widths[i].max(display(row.get(column)).len());
        }
    }

    let header: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{:width$}", col, width = widths[i]))
        .collect();
    println!("{}", header.join(" | "));

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");
    println!("{}", separator);

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{:width$}", display(row.get(column)), width = widths[i]))
            .collect();
        println!("{}", cells.join(" | "));
    }

    println!("\n{} row(s)", rows.len());
}
