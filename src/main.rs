use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};
use uuid::Uuid;

mod analysis;
mod config;
mod curve;
mod db;
mod error;
mod ingest;
mod metrics;
mod models;
mod report;
mod segment;
mod tabulate;

use config::{AnalysisPlan, AnalysisSettings};
use models::{AnalysisResult, AnalysisType};

#[derive(Parser)]
#[command(name = "price-sensitivity")]
#[command(about = "Van Westendorp and Gabor-Granger price sensitivity analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Register a new pricing project
    CreateProject {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_enum)]
        analysis_type: AnalysisType,
    },
    /// List projects, newest first
    ListProjects,
    /// Delete a project with its settings and results
    DeleteProject {
        #[arg(long)]
        project: Uuid,
    },
    /// Run the analysis over a survey data file
    #[command(group(
        ArgGroup::new("kind")
            .args(["analysis_type", "project"])
            .required(true)
            .multiple(false)
    ))]
    Analyze {
        #[arg(long)]
        csv: PathBuf,
        /// JSON file with the column mapping and segment variables
        #[arg(long)]
        settings: PathBuf,
        #[arg(long, value_enum)]
        analysis_type: Option<AnalysisType>,
        /// Store settings and result under this project
        #[arg(long)]
        project: Option<Uuid>,
        #[arg(long, default_value_t = ',')]
        delimiter: char,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the latest stored result of a project as JSON
    Results {
        #[arg(long)]
        project: Uuid,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown report
    #[command(group(
        ArgGroup::new("source")
            .args(["project", "result"])
            .required(true)
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        project: Option<Uuid>,
        /// A result file written by `analyze`
        #[arg(long)]
        result: Option<PathBuf>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set for commands that use the project store")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn write_json<T: serde::Serialize>(value: &T, out: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Result written to {}.", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::CreateProject {
            name,
            description,
            analysis_type,
        } => {
            let pool = connect().await?;
            let id = db::create_project(&pool, &name, &description, analysis_type).await?;
            println!("{id}");
        }
        Commands::ListProjects => {
            let pool = connect().await?;
            let projects = db::list_projects(&pool).await?;
            if projects.is_empty() {
                println!("No projects yet.");
                return Ok(());
            }
            for project in projects {
                println!(
                    "- {} {} ({}, {}) created {}",
                    project.id,
                    project.name,
                    project.analysis_type.label(),
                    project.status,
                    project.created_at.format("%Y-%m-%d")
                );
                if !project.description.is_empty() {
                    println!("  {}", project.description);
                }
            }
        }
        Commands::DeleteProject { project } => {
            let pool = connect().await?;
            if db::delete_project(&pool, project).await? {
                println!("Project {project} deleted.");
            } else {
                println!("Project {project} not found.");
            }
        }
        Commands::Analyze {
            csv,
            settings,
            analysis_type,
            project,
            delimiter,
            out,
        } => {
            let delimiter = u8::try_from(delimiter)
                .ok()
                .filter(u8::is_ascii)
                .context("delimiter must be a single ASCII character")?;
            let settings = AnalysisSettings::load(&settings)?;
            let table = ingest::read_csv(&csv, delimiter)?;

            let target = match project {
                Some(project_id) => {
                    let pool = connect().await?;
                    let project = db::fetch_project(&pool, project_id).await?;
                    Some((pool, project))
                }
                None => None,
            };
            let analysis_type = match (&target, analysis_type) {
                (Some((_, project)), _) => project.analysis_type,
                (None, Some(kind)) => kind,
                (None, None) => anyhow::bail!("either --analysis-type or --project is required"),
            };

            let plan = AnalysisPlan::validate(analysis_type, &settings, &table)
                .context("invalid column mapping")?;
            let result = analysis::analyze(&table, &plan);

            match target {
                Some((pool, project)) => {
                    db::save_settings(&pool, project.id, analysis_type, &settings).await?;
                    let stored = db::save_result(&pool, project.id, result).await?;
                    tracing::info!(project = %project.id, result = %stored.id, "analysis stored");
                    write_json(&stored, out.as_deref())?;
                }
                None => write_json(&result, out.as_deref())?,
            }
        }
        Commands::Results { project, out } => {
            let pool = connect().await?;
            let stored = db::latest_result(&pool, project)
                .await?
                .with_context(|| format!("no results stored for project {project}"))?;
            write_json(&stored, out.as_deref())?;
        }
        Commands::Report {
            project,
            result,
            out,
        } => {
            let report = match (project, result) {
                (Some(project_id), _) => {
                    let pool = connect().await?;
                    let project = db::fetch_project(&pool, project_id).await?;
                    let stored = db::latest_result(&pool, project_id)
                        .await?
                        .with_context(|| format!("no results stored for project {project_id}"))?;
                    report::build_report(
                        Some(project.name.as_str()),
                        Some(stored.created_at),
                        &stored.result,
                    )
                }
                (None, Some(path)) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    let result: AnalysisResult = serde_json::from_str(&raw)
                        .with_context(|| format!("{} is not an analysis result", path.display()))?;
                    report::build_report(None, None, &result)
                }
                (None, None) => anyhow::bail!("either --project or --result is required"),
            };
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
