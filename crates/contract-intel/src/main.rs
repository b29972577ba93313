use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};

use contract_intel::{
    init_tracing, load_config, Config, Database, DocumentIntake, FilesystemDocumentStore,
    JobFilter, JobStatus, JobStore, Orchestrator, OrchestratorError, SqliteJobStore,
};

#[derive(Parser)]
#[command(name = "contract-intel")]
#[command(version, about = "Assess contract PDFs for completeness and missing terms")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess PDF files and print one JSON result per file
    Assess {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List stored jobs, newest first
    Jobs {
        #[arg(long)]
        status: Option<JobStatus>,
        #[arg(long)]
        min_score: Option<u8>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> contract_intel::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    init_tracing(&config.logging)?;

    let db = Database::open(&config.storage.database_path())?;
    let store: Arc<dyn JobStore> = Arc::new(SqliteJobStore::new(db));

    match cli.command {
        Commands::Assess { files } => assess(&config, store, &files),
        Commands::Jobs {
            status,
            min_score,
            page,
            limit,
        } => {
            let filter = JobFilter {
                status,
                min_score,
                page,
                limit,
            };
            let listing = store.list(&filter)?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn assess(
    config: &Config,
    store: Arc<dyn JobStore>,
    files: &[PathBuf],
) -> contract_intel::Result<ExitCode> {
    let documents = Arc::new(FilesystemDocumentStore::new(config.storage.documents_dir())?);
    let orchestrator = Orchestrator::from_config(config, documents, store)?;

    let mut all_ok = true;
    let mut submitted = Vec::new();
    for path in files {
        match submit(&orchestrator, path) {
            Ok(job_id) => submitted.push((path, job_id)),
            Err(e) => {
                error!(file = %path.display(), "Rejected: {}", e);
                println!(
                    "{}",
                    json!({ "file": path.display().to_string(), "error": e.to_string() })
                );
                all_ok = false;
            }
        }
    }

    let outcomes = orchestrator.wait_all();
    info!(jobs = outcomes.len(), "All jobs finished");

    for (path, job_id) in submitted {
        let job = orchestrator.status(&job_id)?;
        let record = orchestrator.record(&job_id)?;
        all_ok &= job.status == JobStatus::Completed;
        let output = json!({
            "file": path.display().to_string(),
            "job": job,
            "record": record,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    orchestrator.shutdown();
    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn submit(orchestrator: &Orchestrator, path: &Path) -> Result<String, OrchestratorError> {
    let intake = DocumentIntake::from_path(path)?;
    orchestrator.submit(intake)
}
