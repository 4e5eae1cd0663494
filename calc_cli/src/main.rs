//! # Calcboard CLI
//!
//! Terminal front end for the calculator engine: list calculators, show a
//! localized description, evaluate with presets and overrides, and run the
//! configuration consistency check.
//!
//! ```text
//! calc_cli list --locale de
//! calc_cli show raid --json
//! calc_cli compute loan --preset mortgage --set extraPayment=200 --unit loanAmount=EUR
//! calc_cli check
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::Level;

use calc_engine::{Engine, EngineSettings, EvaluationRequest};

#[derive(Parser)]
#[command(name = "calc_cli", version, about = "Evaluate Calcboard calculators from the terminal")]
struct Cli {
    /// Engine settings file (TOML)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered calculators
    List(ListArgs),
    /// Describe one calculator
    Show(ShowArgs),
    /// Evaluate a calculator
    Compute(ComputeArgs),
    /// Check every configuration; exits non-zero on issues
    Check,
}

#[derive(Args)]
struct ListArgs {
    #[arg(long)]
    locale: Option<String>,
}

#[derive(Args)]
struct ShowArgs {
    id: String,

    #[arg(long)]
    locale: Option<String>,

    /// Output JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ComputeArgs {
    id: String,

    /// Start from a named preset
    #[arg(long)]
    preset: Option<String>,

    /// Input value (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    values: Vec<(String, String)>,

    /// Unit override (repeatable)
    #[arg(long = "unit", value_name = "FIELD=UNIT", value_parser = parse_assignment)]
    units: Vec<(String, String)>,

    #[arg(long)]
    locale: Option<String>,

    /// Print the full results as JSON
    #[arg(long)]
    json: bool,
}

fn parse_assignment(text: &str) -> Result<(String, String), String> {
    match text.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected FIELD=VALUE, got '{}'", text)),
    }
}

/// `--set` values: JSON scalars (numbers, booleans) where they parse, text otherwise
fn raw_value(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ (Value::Number(_) | Value::Bool(_) | Value::String(_))) => value,
        _ => Value::String(text.to_string()),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_settings(path: Option<&PathBuf>) -> Result<EngineSettings> {
    match path {
        Some(path) => EngineSettings::load(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(EngineSettings::default()),
    }
}

fn run_list(engine: &Engine, args: ListArgs) -> Result<ExitCode> {
    for config in engine.calculators() {
        let view = engine.describe(&config.id, args.locale.as_deref())?;
        println!("{:<12} {:<12} {}", view.id, config.category.display_name(), view.name);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_show(engine: &Engine, args: ShowArgs) -> Result<ExitCode> {
    let view = engine.describe(&args.id, args.locale.as_deref())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} ({} v{})", view.name, view.id, view.version);
    println!("{}", view.description);
    println!();
    println!("Inputs:");
    for input in &view.inputs {
        let unit = input.default_unit.as_deref().map(|u| format!(" [{}]", u)).unwrap_or_default();
        println!("  {:<22} {}{} = {}", input.id, input.label, unit, input.default_value);
        for option in &input.options {
            println!("  {:<22}   {} - {}", "", option.id, option.label);
        }
    }
    if !view.presets.is_empty() {
        println!();
        println!("Presets:");
        for preset in &view.presets {
            println!("  {:<22} {}", preset.id, preset.name);
        }
    }
    println!();
    println!("Results:");
    for result in &view.results {
        println!("  {:<22} {}", result.id, result.label);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_compute(engine: &Engine, args: ComputeArgs) -> Result<ExitCode> {
    let mut request = EvaluationRequest::new(&args.id);
    request.preset = args.preset;
    request.locale = args.locale;
    for (field, value) in &args.values {
        request = request.with_value(field, raw_value(value));
    }
    for (field, unit) in &args.units {
        request = request.with_unit(field, unit);
    }

    let results = engine.evaluate(&request)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_valid {
        let view = engine.describe(&args.id, request.locale.as_deref())?;
        for result in &view.results {
            if let Some(text) = results.formatted.get(&result.id) {
                println!("{:<36} {}", result.label, text);
            }
        }
        println!();
        println!("{}", results.summary);
    } else {
        eprintln!("{}", results.summary);
    }

    if results.is_valid {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}

fn run_check(engine: &Engine) -> Result<ExitCode> {
    let report = engine.check();
    if report.is_empty() {
        println!("{} calculators, no issues", engine.calculators().count());
        return Ok(ExitCode::SUCCESS);
    }
    for (id, issues) in &report {
        for issue in issues {
            println!("{}: {}", id, issue);
        }
    }
    Ok(ExitCode::FAILURE)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = load_settings(cli.config.as_ref())?;
    let engine = Engine::new(settings).context("building calculator engine")?;

    match cli.command {
        Commands::List(args) => run_list(&engine, args),
        Commands::Show(args) => run_show(&engine, args),
        Commands::Compute(args) => run_compute(&engine, args),
        Commands::Check => run_check(&engine),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("rate=5").unwrap(), ("rate".to_string(), "5".to_string()));
        assert_eq!(
            parse_assignment("networkAddress=10.0.0.0/24").unwrap().1,
            "10.0.0.0/24"
        );
        assert!(parse_assignment("rate").is_err());
        assert!(parse_assignment("=5").is_err());
    }

    #[test]
    fn test_raw_value_types() {
        assert_eq!(raw_value("42"), serde_json::json!(42));
        assert_eq!(raw_value("true"), serde_json::json!(true));
        assert_eq!(raw_value("192.168.1.0"), serde_json::json!("192.168.1.0"));
        assert_eq!(raw_value("monthly"), serde_json::json!("monthly"));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "calc_cli", "-vv", "compute", "loan", "--preset", "mortgage", "--set", "extraPayment=200", "--unit",
            "loanAmount=EUR",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Compute(args) => {
                assert_eq!(args.values.len(), 1);
                assert_eq!(args.units[0].1, "EUR");
            }
            _ => panic!("expected compute"),
        }
    }
}
