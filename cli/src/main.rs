use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use tally_kernel::append::{AppendCoordinator, AppendError, AppendReceipt};
use tally_kernel::document::Document;
use tally_kernel::question::Question;
use tally_kernel::store::github::{GitHubConfig, GitHubStore};

/// Tally CLI
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Append survey answers to a git-hosted JSON document", long_about = None)]
struct Cli {
    #[command(flatten)]
    target: Target,

    #[command(subcommand)]
    command: Command,
}

/// Which repository the documents live in.
#[derive(Args, Debug)]
struct Target {
    /// Repository owner
    #[arg(long)]
    owner: String,

    /// Repository name
    #[arg(long)]
    repo: String,

    /// Branch holding the data files
    #[arg(long, default_value = "main")]
    branch: String,

    /// Access token; falls back to the GITHUB_TOKEN environment variable
    #[arg(long)]
    token: Option<String>,

    /// Override the API base URL (for testing against a local stub)
    #[arg(long)]
    api_base: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append one record of answers to a survey's document
    Append {
        survey_id: String,

        /// Answer values, in form order
        #[arg(required = true)]
        answers: Vec<String>,
    },

    /// Print a survey's answer document
    Show { survey_id: String },

    /// Print a survey's question metadata
    Question { survey_id: String },

    /// Create a blank question file for a new survey
    CreateQuestion { survey_id: String },
}

/// Wrapper for JSON output
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum CliOutput {
    Receipt {
        status: &'static str,
        record_id: String,
        created: bool,
        version: String,
    },
    Answers {
        status: &'static str,
        answers: Document,
    },
    Question {
        status: &'static str,
        question: Question,
    },
    Failure {
        status: &'static str,
        error: ErrorPayload,
    },
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    kind: &'static str,
    detail: String,
}

impl CliOutput {
    fn receipt(receipt: AppendReceipt) -> Self {
        Self::Receipt {
            status: "success",
            record_id: receipt.record_id.to_string(),
            created: receipt.created,
            version: receipt.version.as_str().to_string(),
        }
    }

    fn failure(err: &AppendError) -> Self {
        Self::Failure {
            status: "failure",
            error: ErrorPayload {
                kind: err.kind(),
                detail: err.to_string(),
            },
        }
    }
}

fn run(cli: Cli) -> Result<Result<CliOutput, CliOutput>> {
    let token = cli
        .target
        .token
        .or_else(|| env::var("GITHUB_TOKEN").ok())
        .context("no token supplied and GITHUB_TOKEN is not set")?;

    let mut config = GitHubConfig::new(
        cli.target.owner,
        cli.target.repo,
        cli.target.branch,
        token,
    );
    if let Some(api_base) = cli.target.api_base {
        config.api_base = api_base;
    }

    let store = GitHubStore::new(config)
        .map_err(AppendError::from)
        .context("failed to construct the store client")?;
    let coordinator = AppendCoordinator::new(store);

    let outcome = match cli.command {
        Command::Append { survey_id, answers } => coordinator
            .append(&survey_id, answers)
            .map(CliOutput::receipt),
        Command::Show { survey_id } => {
            coordinator.fetch_answers(&survey_id).map(|doc| CliOutput::Answers {
                status: "success",
                answers: doc.unwrap_or_default(),
            })
        }
        Command::Question { survey_id } => match coordinator.fetch_question(&survey_id) {
            Ok(Some(question)) => Ok(CliOutput::Question {
                status: "success",
                question,
            }),
            Ok(None) => Err(AppendError::Validation {
                detail: format!("no question file for survey `{survey_id}`"),
            }),
            Err(e) => Err(e),
        },
        Command::CreateQuestion { survey_id } => coordinator
            .create_question(&survey_id)
            .map(|question| CliOutput::Question {
                status: "success",
                question,
            }),
    };

    Ok(outcome.map_err(|e| CliOutput::failure(&e)))
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli)? {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            println!("{}", serde_json::to_string_pretty(&failure)?);
            Ok(ExitCode::FAILURE)
        }
    }
}
