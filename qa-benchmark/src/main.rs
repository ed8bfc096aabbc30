//! QA Benchmark CLI

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use qa_benchmark::{
    backends::build_engine,
    config::{Config, ProviderKind},
    providers::create_provider,
    reporting::{new_run_id, print_console_report, write_usage, JsonReport, PacedObserver},
    runner::{collect_responses, ConsoleProgress, Executor, ExecutorConfig, ResponseOracle},
};
use verdict::{read_records, BatchEvaluator, Evidence, EvaluationMode, Response};

#[derive(Parser)]
#[command(name = "qa-benchmark")]
#[command(about = "Grade a chat model's answers against a reference answer key")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask every question and grade the answers
    Run {
        /// Questions, one blank-line separated record each
        #[arg(short, long)]
        questions: PathBuf,

        /// Reference answers, aligned with the questions
        #[arg(short, long)]
        answers: PathBuf,

        /// Pre-recorded responses; skips querying the model
        #[arg(short, long)]
        responses: Option<PathBuf>,

        /// Verdict mode: combined or assertion
        #[arg(short, long)]
        mode: Option<EvaluationMode>,

        /// Chat provider for the model under test
        #[arg(long, value_parser = parse_provider)]
        provider: Option<ProviderKind>,

        /// Model under test
        #[arg(long)]
        model: Option<String>,

        /// Output directory for the JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Milliseconds to pause after each printed item
        #[arg(long)]
        pace_ms: Option<u64>,

        /// Items in flight at once
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Grade a single response against a reference answer
    Score {
        #[arg(long)]
        response: String,

        #[arg(long)]
        reference: String,

        /// Verdict mode: combined or assertion
        #[arg(short, long)]
        mode: Option<EvaluationMode>,
    },

    /// Print the records parsed from a file
    ListRecords {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config/qa-benchmark.toml")]
        output: PathBuf,
    },
}

fn parse_provider(s: &str) -> Result<ProviderKind, String> {
    match s.to_lowercase().as_str() {
        "ollama" => Ok(ProviderKind::Ollama),
        "openai" => Ok(ProviderKind::OpenAI),
        other => Err(format!("unknown provider '{}' (expected ollama or openai)", other)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("qa_benchmark=debug,verdict=debug,info")
    } else {
        EnvFilter::new("qa_benchmark=info,verdict=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            questions,
            answers,
            responses,
            mode,
            provider,
            model,
            output,
            pace_ms,
            concurrency,
        } => {
            let mut config = load_config(cli.config)?;
            if let Some(mode) = mode {
                config.evaluation.mode = mode;
            }
            if let Some(provider) = provider {
                config.oracle.provider = provider;
            }
            if let Some(model) = model {
                config.oracle.model = model;
            }
            if let Some(output) = output {
                config.output.output_dir = output.display().to_string();
            }
            if let Some(pace_ms) = pace_ms {
                config.output.pace_ms = pace_ms;
            }
            if let Some(concurrency) = concurrency {
                config.evaluation.concurrency = concurrency;
            }
            run_benchmark(config, questions, answers, responses).await?;
        }

        Commands::Score {
            response,
            reference,
            mode,
        } => {
            let config = load_config(cli.config)?;
            let mode = mode.unwrap_or(config.evaluation.mode);
            score_pair(&config, &response, &reference, mode).await?;
        }

        Commands::ListRecords { file } => {
            list_records(file)?;
        }

        Commands::InitConfig { output } => {
            init_config(output)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let config = Config::from_file(&path)?;
            tracing::info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(Config::load_or_default()),
    }
}

fn warn_if_no_parser(config: &Config, mode: EvaluationMode) {
    if mode == EvaluationMode::AssertionOnly && !config.syntax.enabled {
        tracing::warn!(
            "Assertion mode without a parse service; comparing full lowercased texts"
        );
    }
}

async fn run_benchmark(
    config: Config,
    questions_path: PathBuf,
    answers_path: PathBuf,
    responses_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let run_id = new_run_id();
    let mode = config.evaluation.mode;

    let questions = read_records(&questions_path)?;
    let answers = read_records(&answers_path)?;

    if questions.is_empty() {
        tracing::warn!("No questions in {}", questions_path.display());
    }

    eprintln!("=== QA Benchmark ===");
    eprintln!("Run ID: {}", run_id);
    eprintln!("Mode:   {}", mode);
    eprintln!("Items:  {} questions, {} answers", questions.len(), answers.len());

    let (responses, oracle_model, oracle_usage) = match responses_path {
        Some(path) => {
            let recorded: Vec<Response> = read_records(&path)?
                .into_iter()
                .map(Response::Obtained)
                .collect();
            eprintln!("Responses: {} recorded in {}", recorded.len(), path.display());
            (recorded, None, None)
        }
        None if questions.is_empty() => (Vec::new(), None, None),
        None => {
            let provider = create_provider(&config.oracle)?;
            if !provider.health_check().await.unwrap_or(false) {
                tracing::warn!("{} did not pass its health check", provider.name());
            }
            let executor = Executor::new(
                provider,
                ExecutorConfig::from(&config.oracle)
                    .with_parallel_requests(config.evaluation.concurrency),
            );
            eprintln!("Model:  {} via {}", executor.model(), config.oracle.provider);
            eprintln!();

            let collected = collect_responses(
                &executor,
                &questions,
                config.evaluation.concurrency,
                &ConsoleProgress,
            )
            .await;
            write_usage(&mut std::io::stderr(), &collected.usage)?;
            (
                collected.responses,
                Some(executor.model().to_string()),
                Some(collected.usage),
            )
        }
    };
    eprintln!();

    warn_if_no_parser(&config, mode);
    let engine = Arc::new(build_engine(&config));
    let evaluator =
        BatchEvaluator::new(engine.clone()).with_concurrency(config.evaluation.concurrency);

    let report = if config.output.pace_ms > 0 {
        let observer = PacedObserver::new(oracle_model.clone())
            .with_pace(Duration::from_millis(config.output.pace_ms));
        evaluator
            .run_all_observed(&questions, &responses, &answers, mode, &observer)
            .await
    } else {
        let report = evaluator.run_all(&questions, &responses, &answers, mode).await;
        print_console_report(oracle_model.as_deref(), &report)?;
        report
    };

    if config.output.write_json {
        let json = JsonReport::new(
            &run_id,
            oracle_model,
            engine.embedding_model(),
            mode,
            *engine.thresholds(),
            report,
        )
        .with_oracle_usage(oracle_usage);
        let path = json.write_to_dir(&config.output.output_dir)?;
        eprintln!("\nResults written to: {}", path.display());
    }

    Ok(())
}

async fn score_pair(
    config: &Config,
    response: &str,
    reference: &str,
    mode: EvaluationMode,
) -> Result<(), Box<dyn std::error::Error>> {
    warn_if_no_parser(config, mode);
    let engine = build_engine(config);
    let judgement = engine.evaluate(response, reference, mode).await?;

    match &judgement.evidence {
        Evidence::Combined(scores) => {
            println!("Overlap:    {:.4}", scores.overlap_ratio);
            println!("Similarity: {:.4}", scores.similarity);
        }
        Evidence::Assertion {
            response,
            reference,
            similarity,
        } => {
            println!("Response assertion:  {}", response.text);
            println!("Reference assertion: {}", reference.text);
            println!("Similarity: {:.4}", similarity);
        }
    }
    println!("Result: {}", judgement.verdict.label());
    Ok(())
}

fn list_records(file: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let records = read_records(&file)?;

    println!("Records ({}):", records.len());
    println!("{:-<60}", "");

    for (idx, record) in records.iter().enumerate() {
        println!("  {:>3} | {}", idx + 1, record);
    }

    Ok(())
}

fn init_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    // Ensure parent directory exists
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    config.save_toml(&output)?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}
