use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use datasmith_generate::output::{write_dataset_csv, write_dataset_json};
use datasmith_generate::{
    GenerationEngine, GenerationError, ProviderRegistry, RunReport, RunSummary,
};
use datasmith_plan::{plan_json_schema, validate_plan_document, PlanError, ValidationReport};

#[derive(Debug, Error)]
enum CliError {
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("plan error: {0}")]
    Plan(#[from] PlanError),
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "datasmith", version, about = "Correlated synthetic dataset generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a dataset from a plan.
    Generate(GenerateArgs),
    /// Validate a plan without generating anything.
    Validate(ValidateArgs),
    /// Print the plan JSON Schema.
    Schema,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Path to plan.json.
    #[arg(long, value_name = "PLAN")]
    plan: PathBuf,
    /// Override the plan's row count.
    #[arg(long)]
    rows: Option<u64>,
    /// Override the plan's seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    out: PathBuf,
    /// Dataset output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Path to plan.json.
    #[arg(long, value_name = "PLAN")]
    plan: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Validate(args) => run_validate(args),
        Command::Schema => run_schema(),
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let start = Instant::now();
    let mut plan = load_plan(&args.plan)?;
    if let Some(rows) = args.rows {
        plan.rows = rows;
    }
    if let Some(seed) = args.seed {
        plan.seed = Some(seed);
    }

    let registry = ProviderRegistry::new();
    let mut engine = GenerationEngine::from_plan(&plan, &registry)?;

    let run_id = Uuid::new_v4().to_string();
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let run_dir = args.out.join(format!("{timestamp}__run_{run_id}"));
    fs::create_dir_all(&run_dir)?;

    info!(run_id = %run_id, rows = plan.rows, seed = ?plan.seed, "run started");

    let mut summary = RunSummary::default();
    let dataset = engine.generate_with(plan.rows as usize, &mut summary)?;

    let bytes_written = match args.format {
        OutputFormat::Csv => write_dataset_csv(&run_dir.join("dataset.csv"), &dataset)?,
        OutputFormat::Json => write_dataset_json(&run_dir.join("dataset.json"), &dataset)?,
    };

    let report = RunReport {
        run_id: run_id.clone(),
        seed: engine.seed(),
        rows_requested: plan.rows,
        rows_generated: summary.rows_generated,
        values_generated: summary.values_generated,
        duration_ms: start.elapsed().as_millis() as u64,
        bytes_written,
    };
    fs::write(
        run_dir.join("run_report.json"),
        serde_json::to_vec_pretty(&report)?,
    )?;

    info!(
        run_id = %run_id,
        rows = report.rows_generated,
        bytes_written = report.bytes_written,
        duration_ms = report.duration_ms,
        "run completed"
    );
    println!("{}", run_dir.display());
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), CliError> {
    let contents = fs::read_to_string(&args.plan)?;
    let plan_json: serde_json::Value = serde_json::from_str(&contents)?;

    match validate_plan_document(&plan_json) {
        Ok(validated) => {
            println!(
                "plan is valid: {} properties, {} rows",
                validated.plan.properties.len(),
                validated.plan.rows
            );
            for warning in &validated.warnings {
                eprintln!("warning[{}] {}: {}", warning.code, warning.path, warning.message);
            }
            Ok(())
        }
        Err(report) => {
            print_report(&report);
            Err(CliError::InvalidPlan(format!(
                "{} validation error(s)",
                report.errors.len()
            )))
        }
    }
}

fn run_schema() -> Result<(), CliError> {
    let schema = plan_json_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn load_plan(path: &PathBuf) -> Result<datasmith_plan::Plan, CliError> {
    let contents = fs::read_to_string(path)?;
    let plan_json: serde_json::Value = serde_json::from_str(&contents)?;
    match validate_plan_document(&plan_json) {
        Ok(validated) => Ok(validated.plan),
        Err(report) => {
            print_report(&report);
            Err(CliError::InvalidPlan(format!(
                "{} validation error(s)",
                report.errors.len()
            )))
        }
    }
}

fn print_report(report: &ValidationReport) {
    for issue in &report.errors {
        eprintln!("error[{}] {}: {}", issue.code, issue.path, issue.message);
    }
    for issue in &report.warnings {
        eprintln!("warning[{}] {}: {}", issue.code, issue.path, issue.message);
    }
}
