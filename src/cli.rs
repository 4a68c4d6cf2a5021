use std::collections::HashMap;
use std::fmt::Write;

use clap::{Parser, Subcommand};

use crate::config::loader::{get_settings, init_settings};
use crate::config::types::Settings;
use crate::error::PrSuggestError;
use crate::git::github::GithubCompareSource;
use crate::git::types::CompareTarget;
use crate::git::url_parser::parse_compare_url;
use crate::processing::patch::DiffSummary;
use crate::tools::suggest::{SuggestionOutcome, SuggestionPipeline, compare_and_suggest, prepare_request};
use crate::tools::{resolve_ai_handler, resolve_ticket_source};

/// pr-suggest: generate pull-request titles and descriptions from a branch comparison.
#[derive(Parser, Debug)]
#[command(name = "pr-suggest", version, about)]
pub struct Cli {
    /// GitHub compare URL (`https://github.com/{owner}/{repo}/compare/{base}...{head}`).
    #[arg(long, conflicts_with_all = ["owner", "repo", "base", "head"])]
    pub compare_url: Option<String>,

    /// Repository owner.
    #[arg(long)]
    pub owner: Option<String>,

    /// Repository name.
    #[arg(long)]
    pub repo: Option<String>,

    /// Base ref to compare against.
    #[arg(long)]
    pub base: Option<String>,

    /// Head ref carrying the changes.
    #[arg(long)]
    pub head: Option<String>,

    #[command(subcommand)]
    pub command: Command,

    /// Extra arguments passed as config overrides (--section.key=value).
    /// Place after `--` separator: `pr-suggest suggest --compare-url=<url> -- --config.temperature=0.2`
    #[arg(last = true, allow_hyphen_values = true, global = true)]
    pub rest: Vec<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Generate a PR title and description.
    Suggest {
        /// Ticket key to use as context. Repeatable; the first one found wins.
        #[arg(long = "ticket")]
        tickets: Vec<String>,
        /// Print the full outcome as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the extracted diff summary without calling the generation backend.
    #[command(alias = "diff")]
    Compare {
        #[arg(long)]
        json: bool,
    },
    /// Print the rendered prompt without calling the generation backend.
    Prompt {
        #[arg(long = "ticket")]
        tickets: Vec<String>,
    },
    /// Show the effective (non-secret) configuration.
    #[command(alias = "settings")]
    Config,
}

impl Command {
    /// Return the canonical command name used in logs.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Command::Suggest { .. } => "suggest",
            Command::Compare { .. } => "compare",
            Command::Prompt { .. } => "prompt",
            Command::Config => "config",
        }
    }
}

/// Config keys that cannot be overridden from the command line.
///
/// Secrets and endpoints stay in `.secrets.toml` or the environment; prompt
/// templates stay in the settings files.
pub const FORBIDDEN_OVERRIDE_KEYS: &[&str] = &[
    "key",
    "user_token",
    "api_token",
    "oauth_access_token",
    "base_url",
    "api_base",
    "cloud_gateway_url",
    "url",
    "system",
    "user",
];

/// Check if a config key is forbidden for override.
///
/// Returns `Some(matched_forbidden_key)` if the key matches, `None` if allowed.
pub fn check_forbidden_key(key: &str) -> Option<&'static str> {
    let key_lower = key.to_lowercase();
    let segments: Vec<&str> = key_lower.split('.').collect();
    FORBIDDEN_OVERRIDE_KEYS
        .iter()
        .find(|&&forbidden| key_lower == forbidden || segments.contains(&forbidden))
        .copied()
}

/// Parse the `rest` args into a HashMap of config overrides.
/// Format: `--section.key=value` or `--section__key=value` (double underscores → dots).
fn parse_config_overrides(rest: &[String]) -> Result<HashMap<String, String>, PrSuggestError> {
    let mut overrides = HashMap::new();

    for arg in rest {
        let stripped = arg.trim_start_matches('-');
        if stripped.is_empty() {
            continue;
        }

        let stripped = stripped.replace("__", ".");

        if let Some((key, value)) = stripped.split_once('=') {
            if let Some(forbidden) = check_forbidden_key(key) {
                return Err(PrSuggestError::InvalidInput(format!(
                    "forbidden CLI override: '{key}' (matches '{forbidden}')"
                )));
            }
            overrides.insert(key.to_string(), value.to_string());
        }
    }

    Ok(overrides)
}

/// Work out which comparison the user asked for.
fn resolve_target(cli: &Cli) -> Result<CompareTarget, PrSuggestError> {
    if let Some(url) = &cli.compare_url {
        return parse_compare_url(url);
    }

    match (&cli.owner, &cli.repo, &cli.base, &cli.head) {
        (Some(owner), Some(repo), Some(base), Some(head)) => {
            Ok(CompareTarget::new(owner, repo, base, head))
        }
        _ => Err(PrSuggestError::InvalidInput(
            "either --compare-url or all of --owner, --repo, --base and --head are required".into(),
        )),
    }
}

pub async fn run() -> Result<(), PrSuggestError> {
    let cli = Cli::parse();

    let config_overrides = parse_config_overrides(&cli.rest)?;
    let settings = init_settings(&config_overrides)?;

    tracing::info!(
        command = cli.command.canonical_name(),
        overrides = config_overrides.len(),
        model = %settings.config.model,
        "starting pr-suggest"
    );

    if cli.command == Command::Config {
        print!("{}", format_config(&get_settings()));
        return Ok(());
    }

    let target = resolve_target(&cli)?;
    let diff_source = GithubCompareSource::from_settings(&settings)?;

    match &cli.command {
        Command::Suggest { tickets, json } => {
            let ai = resolve_ai_handler(&None, &settings)?;
            let ticket_source = resolve_ticket_source(&settings)?;
            let pipeline = SuggestionPipeline::from_settings(&settings, ai);

            let outcome = compare_and_suggest(
                &pipeline,
                &diff_source,
                ticket_source.as_deref(),
                tickets,
                &target,
            )
            .await?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print!("{}", format_outcome(&outcome));
            }
        }
        Command::Compare { json } => {
            let (request, _) = prepare_request(&diff_source, None, &[], &target).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&request.summary)?);
            } else {
                print!("{}", format_summary(&request.summary));
            }
        }
        Command::Prompt { tickets } => {
            let ai = resolve_ai_handler(&None, &settings)?;
            let ticket_source = resolve_ticket_source(&settings)?;
            let pipeline = SuggestionPipeline::from_settings(&settings, ai);

            let (request, _) =
                prepare_request(&diff_source, ticket_source.as_deref(), tickets, &target).await?;
            let prompt = pipeline.render(&request)?;
            if !prompt.system.is_empty() {
                println!("{}\n", prompt.system);
            }
            println!("{}", prompt.user);
        }
        Command::Config => {}
    }

    Ok(())
}

fn format_outcome(outcome: &SuggestionOutcome) -> String {
    let mut out = String::new();
    if let Some(ticket) = &outcome.ticket {
        let _ = writeln!(out, "Ticket: {}\n", ticket.title);
    }
    let _ = writeln!(out, "Title: {}\n", outcome.suggestion.title);
    let _ = writeln!(out, "{}", outcome.suggestion.description);
    out
}

fn format_summary(summary: &DiffSummary) -> String {
    let mut out = String::new();
    for file in &summary.files {
        let _ = writeln!(
            out,
            "{:<9} +{:<5} -{:<5} {}{}",
            file.status.as_str(),
            file.additions,
            file.deletions,
            file.filename,
            if file.has_patch { "" } else { " (no patch)" }
        );
    }
    let _ = writeln!(
        out,
        "\n{} files changed, +{} additions, -{} deletions",
        summary.files_changed, summary.additions, summary.deletions
    );
    out
}

fn format_config(settings: &Settings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Model: {}", settings.config.model);
    let _ = writeln!(out, "Temperature: {}", settings.config.temperature);
    let _ = writeln!(out, "Max tokens: {}", settings.config.max_tokens);
    let _ = writeln!(out, "Generation endpoint: {}", settings.openai.api_base);
    let _ = writeln!(out, "Generation key set: {}", !settings.openai.key.is_empty());
    let _ = writeln!(out, "GitHub API: {}", settings.github.base_url);
    let _ = writeln!(
        out,
        "Jira: {}",
        if settings.jira.is_configured() {
            format!("{:?}", settings.jira.auth_type).to_lowercase()
        } else {
            "not configured".into()
        }
    );
    let cfg = &settings.pr_suggestion;
    let _ = writeln!(
        out,
        "Caps: added {} / deleted {} / ticket description {}",
        cfg.added_code_cap, cfg.deleted_code_cap, cfg.ticket_description_cap
    );
    out
}
