use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use analyzer::client::HttpAnalysisClient;
use analyzer::config::Config;
use analyzer::errors::SubmitError;
use analyzer::form::UploadForm;
use analyzer::models::upload::ResumeFile;
use analyzer::notification::NotificationBanner;
use analyzer::render::{HtmlFragment, ResultsPanel, TerminalView};
use analyzer::validation::{self, FieldErrors, ACCEPTED_EXTENSIONS};

#[derive(Parser)]
#[command(name = "analyzer")]
#[command(about = "Submit a resume and job description for AI analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a resume and show skills, suggestions and match score
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Analysis endpoint (overrides ANALYZER_ENDPOINT)
        #[arg(long)]
        endpoint: Option<String>,

        /// Output format for the results
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Check the inputs without uploading anything
    Validate {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Ping the analysis service
    Health {
        /// Analysis endpoint (overrides ANALYZER_ENDPOINT)
        #[arg(long)]
        endpoint: Option<String>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Resume file (.pdf, .doc or .docx, max 5MB)
    #[arg(short, long)]
    resume: PathBuf,

    /// Job description text
    #[arg(short, long, conflicts_with = "job_file", required_unless_present = "job_file")]
    job: Option<String>,

    /// Read the job description from a file
    #[arg(long)]
    job_file: Option<PathBuf>,
}

impl InputArgs {
    async fn job_description(&self) -> Result<String> {
        match (&self.job, &self.job_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read job description: {}", path.display())),
            (None, None) => Ok(String::new()),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Html,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Logs go to stderr so stdout only carries rendered results.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Analyze {
            input,
            endpoint,
            format,
        } => {
            let config = match endpoint {
                Some(endpoint) => config.with_endpoint(endpoint)?,
                None => config,
            };
            analyze(config, input, format).await
        }
        Commands::Validate { input } => validate(input).await,
        Commands::Health { endpoint } => {
            let config = match endpoint {
                Some(endpoint) => config.with_endpoint(endpoint)?,
                None => config,
            };
            health(config).await
        }
    }
}

async fn analyze(config: Config, input: InputArgs, format: Format) -> Result<()> {
    info!("Starting resume analyzer v{}", env!("CARGO_PKG_VERSION"));
    let client = HttpAnalysisClient::from_config(&config)?;
    info!("Analysis endpoint: {}", client.endpoint());

    let banner = NotificationBanner::new(config.notification_duration);
    let form = UploadForm::new(Arc::new(client), banner.clone())
        .with_progress_tick(config.progress_tick);

    form.select_file(ResumeFile::from_path(&input.resume).await?);
    form.set_job_description(input.job_description().await?);

    let mut updates = form.subscribe();
    let progress = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let (submitting, percent) = {
                let state = updates.borrow_and_update();
                (state.is_submitting, state.progress)
            };
            if submitting {
                eprint!("\rAnalyzing your resume... {percent:>3}%");
                let _ = std::io::stderr().flush();
            }
        }
    });

    let outcome = form.submit_form().await;
    progress.abort();
    let last = form.state();
    if last.submission_id.is_some() {
        eprint!("\rAnalyzing your resume... {:>3}%", last.progress);
    }
    eprintln!();

    let result = match outcome {
        Ok(result) => result,
        Err(SubmitError::Invalid(errors)) => {
            print_field_errors(&errors);
            std::process::exit(SubmitError::Invalid(errors).exit_code());
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(e.exit_code());
        }
    };

    let mut panel = ResultsPanel::new(banner.clone());
    match format {
        Format::Text => {
            let mut view = TerminalView::new(std::io::stdout().lock());
            panel.display(&result, &mut view);
        }
        Format::Html => {
            let mut fragment = HtmlFragment::new();
            if panel.display(&result, &mut fragment) {
                println!("{}", fragment.to_html()?);
            }
        }
    }

    if let Some(preview) = &result.text_preview {
        println!("Extracted text: {preview}");
    }

    let notification = banner.state();
    if notification.visible {
        println!("[{}] {}", notification.category, notification.message);
    }
    Ok(())
}

async fn validate(input: InputArgs) -> Result<()> {
    let file = ResumeFile::from_path(&input.resume).await?;
    let job_description = input.job_description().await?;

    match validation::validate(Some(&file), &job_description) {
        Ok(()) => {
            println!(
                "{} ({} bytes, {}) is ready to submit",
                file.name,
                file.size(),
                file.content_type
            );
            Ok(())
        }
        Err(errors) => {
            print_field_errors(&errors);
            std::process::exit(SubmitError::Invalid(errors).exit_code());
        }
    }
}

async fn health(config: Config) -> Result<()> {
    let client = HttpAnalysisClient::from_config(&config)?;
    let status = client.health().await?;
    match status.timestamp {
        Some(ts) => println!("{} ({ts})", status.status),
        None => println!("{}", status.status),
    }
    Ok(())
}

fn print_field_errors(errors: &FieldErrors) {
    if let Some(message) = errors.resume_message() {
        eprintln!("resume: {message} (accepted: {})", ACCEPTED_EXTENSIONS.join(", "));
    }
    if let Some(message) = errors.job_description_message() {
        eprintln!("job description: {message}");
    }
}
