//! Gradebook CLI - formula evaluation and dataset recalculation

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gradebook::prelude::*;
use gradebook::{check_formula, evaluate_str, SYSTEM_VARIABLES};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "gradebook")]
#[command(author, version, about = "Gradebook formula evaluation and recalculation tool")]
struct Cli {
    /// Log filter (e.g. "debug", "gradebook=trace"); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula and print its value
    Eval {
        /// Formula text, e.g. "avg(Exam1, Exam2) - abs_td"
        formula: String,

        /// Variable binding (repeatable)
        #[arg(short, long = "var", value_name = "NAME=VALUE", value_parser = parse_binding)]
        vars: Vec<(String, f64)>,
    },

    /// Validate a formula and list the names it references
    Check {
        /// Formula text
        formula: String,

        /// Name the formula may reference, in addition to system variables (repeatable)
        #[arg(short, long = "known", value_name = "NAME")]
        known: Vec<String>,
    },

    /// Recalculate every calculated item of one or more classes in a JSON dataset
    Recalc {
        /// Dataset file (JSON)
        dataset: PathBuf,

        /// Class to recalculate (repeatable)
        #[arg(short, long = "class", value_name = "ID", required = true)]
        classes: Vec<i64>,

        /// Where to write the updated dataset (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Score stored when a formula cannot be evaluated
        #[arg(long, default_value = "0", value_parser = parse_finite)]
        fallback_score: f64,

        /// Rewrite records whose score did not change
        #[arg(long)]
        write_unchanged: bool,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Commands::Eval { formula, vars } => eval(&formula, vars),
        Commands::Check { formula, known } => check(&formula, &known),
        Commands::Recalc {
            dataset,
            classes,
            output,
            fallback_score,
            write_unchanged,
            json,
        } => recalc(
            &dataset,
            &classes,
            output.as_deref(),
            RecalculationOptions {
                fallback_score,
                write_unchanged,
            },
            json,
        ),
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// Parse a `NAME=VALUE` binding
fn parse_binding(text: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", text))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{}'", text));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    Ok((name.to_string(), value))
}

/// Parse a finite number
fn parse_finite(text: &str) -> std::result::Result<f64, String> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", text.trim()))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not a finite number", text.trim()));
    }
    Ok(value)
}

fn eval(formula: &str, vars: Vec<(String, f64)>) -> Result<()> {
    let vars: Variables = vars.into_iter().collect();
    let value = evaluate_str(formula, &vars)
        .with_context(|| format!("Failed to evaluate '{}'", formula))?;
    println!("{}", value);
    Ok(())
}

fn check(formula: &str, known: &[String]) -> Result<()> {
    let names = known
        .iter()
        .map(String::as_str)
        .chain(SYSTEM_VARIABLES.iter().copied());
    let check = check_formula(formula, names)
        .with_context(|| format!("Failed to parse '{}'", formula))?;

    println!("references: {}", check.variables.join(", "));
    if !check.unknown_variables.is_empty() {
        println!("unknown:    {}", check.unknown_variables.join(", "));
    }
    for error in &check.function_errors {
        println!("error:      {}", error);
    }

    if !check.is_valid() {
        bail!("Formula '{}' is not valid", formula);
    }
    Ok(())
}

fn recalc(
    input: &Path,
    classes: &[i64],
    output: Option<&Path>,
    options: RecalculationOptions,
    json: bool,
) -> Result<()> {
    let dataset = load_dataset(input)?;
    let store = Arc::new(InMemoryStore::new(dataset));
    let recalculator = Recalculator::new(Arc::clone(&store), RecalculationEngine::new(options));

    let classes: Vec<ClassId> = classes.iter().copied().map(ClassId).collect();
    let mut failed = 0;
    for (class_id, result) in recalculator.recalculate_all(&classes) {
        match result {
            Ok(stats) if json => {
                let line = serde_json::json!({ "class": class_id, "stats": stats });
                println!("{}", line);
            }
            Ok(stats) => print_stats(class_id, &stats),
            Err(e) => {
                eprintln!("Class {}: recalculation failed: {}", class_id, e);
                failed += 1;
            }
        }
    }

    let dataset = store.dataset().context("Failed to read back the dataset")?;
    save_dataset(output.unwrap_or(input), &dataset)?;

    if failed > 0 {
        bail!("{} of {} classes failed", failed, classes.len());
    }
    Ok(())
}

fn print_stats(class_id: ClassId, stats: &RecalculationStats) {
    println!(
        "Class {}: {} calculated items ({} skipped in cycles), {} students",
        class_id, stats.calculated_items, stats.cyclic_items, stats.students
    );
    println!(
        "  {} evaluations, {} fallbacks: {} inserted, {} updated, {} unchanged",
        stats.evaluations, stats.fallbacks, stats.inserted, stats.updated, stats.unchanged
    );
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse '{}'", path.display()))
}

fn save_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    let text = serde_json::to_string_pretty(dataset).context("Failed to serialize dataset")?;
    fs::write(path, text).with_context(|| format!("Failed to write '{}'", path.display()))
}
