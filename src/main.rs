mod comment;
mod config;
mod content;
mod event;
mod pr;
mod summary;

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

use crate::pr::PullRequestApi;

/// gemini-pr-summary — summarizes a GitHub Pull Request with Gemini and
/// posts the summary as a single PR comment, updated on every run.
#[derive(Parser, Debug)]
#[command(name = "gemini-pr-summary", version, about)]
struct Cli {
    /// Path to the JSON event payload that triggered the run
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    /// Summarize this PR number instead of reading it from the event payload
    #[arg(long)]
    pr: Option<u64>,

    /// Repository in owner/name form
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repo: String,

    /// Google Cloud project hosting Vertex AI (overrides config and env)
    #[arg(long)]
    project: Option<String>,

    /// Vertex AI region (overrides config and env)
    #[arg(long)]
    location: Option<String>,

    /// Gemini model identifier (overrides config and env)
    #[arg(long)]
    model: Option<String>,

    /// Print the comment instead of posting it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let pr_number = match cli.pr {
        Some(number) => number,
        None => {
            let path = cli.event_path.as_deref().ok_or(
                "No event payload. Set GITHUB_EVENT_PATH, pass --event-path, or pass --pr",
            )?;
            info!(path = %path.display(), "reading event payload");
            let payload = event::load_event(path)?;
            event::resolve_pr_number(&payload)?
        }
    };

    let _main_span = info_span!("pr_summary", repo = %cli.repo, pr = pr_number).entered();

    info!("loading configuration");
    let mut config = config::Config::load()?;
    if let Some(project) = cli.project {
        config.gemini.project_id = Some(project);
    }
    if let Some(location) = cli.location {
        config.gemini.location = Some(location);
    }
    if let Some(model) = cli.model {
        config.gemini.model_id = Some(model);
    }
    let settings = config.settings(&cli.repo)?;
    debug!(model = %settings.model_id, location = %settings.location, api_url = %settings.api_url, "resolved settings");

    info!("fetching pull request from GitHub");
    let github = pr::GitHubClient::new(&settings)?;
    let pull_request = github.fetch_pull_request(pr_number).await?;
    info!(files = pull_request.files.len(), comments = pull_request.comments.len(), "fetched PR");

    info!("assembling prompt content");
    let fetcher = content::HttpFetcher::new()?;
    let prompt_content = content::assemble(&pull_request, &fetcher).await;

    info!("summarizing with Gemini");
    let access_token = summary::vertex::resolve_access_token(&settings).await?;
    let gemini = summary::VertexClient::new(&settings, access_token)?;
    let summary_text = summary::summarize(&prompt_content, &gemini).await?;

    if cli.dry_run {
        comment::print_preview(&pull_request, &summary_text)?;
        info!("dry run, nothing posted");
        return Ok(());
    }

    info!("publishing summary comment");
    let outcome =
        comment::publish(&github, &pull_request, &summary_text, &settings.bot_login).await?;
    info!(?outcome, "done");

    Ok(())
}
