mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use codepanel_common::config::DEFAULT_PISTON_URL;
use codepanel_common::types::Language;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codepanel-cli")]
#[command(about = "Codepanel CLI - Inspect problems, try solutions, review submissions", long_about = None)]
struct Cli {
    /// Problem catalog JSON (defaults to the built-in catalog)
    #[arg(long, global = true)]
    problems: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every problem in the catalog
    Problems,

    /// Show a problem's statement, examples and starter code
    Show {
        /// Problem id (e.g., two-sum)
        id: String,

        /// Only print starter code for this language
        #[arg(short, long)]
        language: Option<Language>,
    },

    /// Print the exact program sent for one example
    Harness {
        /// Problem id
        #[arg(short, long)]
        problem: String,

        /// Language (javascript, python, java)
        #[arg(short, long)]
        language: Language,

        /// Solution source file
        #[arg(short, long)]
        file: PathBuf,

        /// Example number, 1-based
        #[arg(short, long, default_value = "1")]
        example: usize,
    },

    /// Run a local solution file against every example of a problem
    Run {
        /// Problem id
        #[arg(short, long)]
        problem: String,

        /// Language (javascript, python, java)
        #[arg(short, long)]
        language: Language,

        /// Solution source file
        #[arg(short, long)]
        file: PathBuf,

        /// Execution service endpoint
        #[arg(long, env = "PISTON_URL", default_value = DEFAULT_PISTON_URL)]
        piston_url: String,

        /// Language runtime configuration
        #[arg(long, env = "LANGUAGES_CONFIG", default_value = "config/languages.json")]
        languages_config: PathBuf,

        /// Per-example timeout in milliseconds
        #[arg(long, default_value = "10000")]
        timeout_ms: u64,

        /// Print the full run result as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// List persisted submissions of an interview session
    Submissions {
        /// Session id
        #[arg(short, long)]
        session: String,

        /// Redis holding the submission store
        #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
        redis_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let catalog = commands::load_catalog(cli.problems.as_deref())?;

    match cli.command {
        Commands::Problems => {
            commands::list_problems(&catalog);
        }
        Commands::Show { id, language } => {
            commands::show_problem(&catalog, &id, language)?;
        }
        Commands::Harness {
            problem,
            language,
            file,
            example,
        } => {
            commands::print_harness(&catalog, &problem, language, &file, example)?;
        }
        Commands::Run {
            problem,
            language,
            file,
            piston_url,
            languages_config,
            timeout_ms,
            json,
        } => {
            commands::run_solution(
                &catalog,
                &problem,
                language,
                &file,
                &piston_url,
                &languages_config,
                timeout_ms,
                json,
            )
            .await?;
        }
        Commands::Submissions { session, redis_url } => {
            commands::list_submissions(&redis_url, &session).await?;
        }
    }

    Ok(())
}
