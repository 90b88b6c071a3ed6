use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rubric_core::{JsonlDataSource, Registry, Suite, SuiteConfig};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rubric", about = "Grade text and JSON outputs against named checks")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
	/// List every operation the registry resolves
	Ops,
	/// Run a single operation against one subject
	Check(CheckArgs),
	/// Run a configured suite of checks over a JSONL data file
	Run(RunArgs),
}

#[derive(Debug, Clone, Parser)]
struct CheckArgs {
	/// Operation name, e.g. ContainsAll or JsonEval
	#[arg(long)]
	op: String,

	/// Operation options as a JSON object, e.g. '{"keywords": "a, b"}'
	#[arg(long)]
	options: Option<String>,

	/// Subject text (reads stdin when neither --text nor --file is given)
	#[arg(long)]
	text: Option<String>,

	/// Read the subject from a file
	#[arg(long)]
	file: Option<PathBuf>,

	/// Parse the subject as JSON instead of treating it as plain text
	#[arg(long, default_value_t = false)]
	json: bool,
}

#[derive(Debug, Clone, Parser)]
struct RunArgs {
	/// YAML suite config: { concurrency?, checks: [{ op, options? }] }
	#[arg(long)]
	config: PathBuf,

	/// JSONL file containing lines with fields: { "id"?: string, "output": any }
	#[arg(long)]
	data: PathBuf,

	/// Override the config's concurrency (subjects in-flight)
	#[arg(long)]
	concurrency: Option<usize>,

	/// Output JSON result to a file
	#[arg(long)]
	json_out: Option<PathBuf>,

	/// Output an HTML report to a file
	#[arg(long)]
	html_out: Option<PathBuf>,

	/// Persist the run to a SQLite database
	#[arg(long)]
	db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	let cli = Cli::parse();
	match cli.command {
		Commands::Ops => {
			for op in Registry::new().operations() {
				println!("{op}");
			}
		}
		Commands::Check(args) => check(args).await?,
		Commands::Run(args) => run(args).await?,
	}
	Ok(())
}

async fn check(args: CheckArgs) -> Result<()> {
	let raw = match (&args.text, &args.file) {
		(Some(text), _) => text.clone(),
		(None, Some(path)) => tokio::fs::read_to_string(path)
			.await
			.with_context(|| format!("Failed to read {:?}", path))?,
		(None, None) => {
			let mut buf = String::new();
			std::io::stdin().read_to_string(&mut buf)?;
			buf
		}
	};

	let subject: Value = if args.json {
		serde_json::from_str(&raw).context("Subject is not valid JSON")?
	} else {
		json!(raw)
	};

	let options: Value = match &args.options {
		Some(text) => serde_json::from_str(text).context("Options are not a valid JSON object")?,
		None => json!({}),
	};

	let registry = Registry::new();
	let verdict = registry.invoke(&args.op, &subject, &options).await?;
	println!("{}", serde_json::to_string_pretty(&verdict)?);

	if !verdict.result {
		std::process::exit(1);
	}
	Ok(())
}

async fn run(args: RunArgs) -> Result<()> {
	let config_text = tokio::fs::read_to_string(&args.config)
		.await
		.with_context(|| format!("Failed to read {:?}", args.config))?;
	let config = SuiteConfig::from_yaml(&config_text)?;

	let suite = Suite::builder()
		.registry(Arc::new(Registry::new()))
		.data_source(Arc::new(JsonlDataSource::new(&args.data)))
		.checks(config.checks)
		.concurrency(args.concurrency.unwrap_or(config.concurrency))
		.build()?;

	let result = suite.run().await?;
	println!("{}", result.summary_table());

	if let Some(path) = &args.json_out {
		let json_str = serde_json::to_string_pretty(&result)?;
		tokio::fs::write(path, json_str).await?;
		println!("Wrote JSON results to {:?}", path);
	}

	if let Some(path) = &args.html_out {
		let html = rubric_core::report::generate_html_report(&result);
		tokio::fs::write(path, html).await?;
		println!("Wrote HTML report to {:?}", path);
	}

	if let Some(path) = &args.db {
		let store = rubric_store::Store::open(path)?;
		let run_id = store.create_run(Some(json!({
			"config": args.config.display().to_string(),
			"data": args.data.display().to_string(),
		})))?;
		store.save_suite(run_id, &result)?;
		println!("Saved run {} to {:?}", run_id, path);
	}

	if result.summary.passed != result.summary.total {
		std::process::exit(1);
	}
	Ok(())
}
