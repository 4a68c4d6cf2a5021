use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use figment::Figment;
use figment::providers::{Env, Format, Toml};

use crate::config::types::Settings;
use crate::error::PrSuggestError;

// Embedded default TOML files keep the binary self-contained.
static CONFIGURATION_TOML: &str = include_str!("../../settings/configuration.toml");
static PR_SUGGESTION_PROMPTS: &str = include_str!("../../settings/pr_suggestion_prompts.toml");

/// Global settings, re-settable (e.g. after applying CLI overrides).
static GLOBAL_SETTINGS: RwLock<Option<Arc<Settings>>> = RwLock::new(None);

/// Get the current settings.
///
/// Falls back to the embedded defaults if `init_settings()` was never called.
pub fn get_settings() -> Arc<Settings> {
    let guard = GLOBAL_SETTINGS.read().unwrap_or_else(|poisoned| {
        tracing::error!("settings RwLock poisoned, recovering inner value");
        poisoned.into_inner()
    });
    match guard.as_ref() {
        Some(s) => s.clone(),
        None => {
            tracing::error!(
                "get_settings() called before init_settings() — loading defaults as fallback"
            );
            let fallback = Arc::new(load_settings(&HashMap::new()).unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to load fallback settings, using Default");
                Settings::default()
            }));
            drop(guard);
            let mut write_guard = GLOBAL_SETTINGS
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *write_guard = Some(fallback.clone());
            fallback
        }
    }
}

/// Initialize (or re-initialize) global settings.
pub fn init_settings(
    cli_overrides: &HashMap<String, String>,
) -> Result<Arc<Settings>, PrSuggestError> {
    let settings = Arc::new(load_settings(cli_overrides)?);
    *GLOBAL_SETTINGS.write().unwrap_or_else(|poisoned| {
        tracing::error!("settings RwLock poisoned, recovering inner value");
        poisoned.into_inner()
    }) = Some(settings.clone());
    Ok(settings)
}

/// Build the full configuration by merging layers:
///
/// 1. Embedded TOML defaults (`settings/configuration.toml`, prompt template)
/// 2. Secrets file from filesystem (`.secrets.toml`, optional)
/// 3. CLI argument overrides (`--section.key=value`)
/// 4. Environment variables (highest precedence for secrets)
pub fn load_settings(cli_overrides: &HashMap<String, String>) -> Result<Settings, PrSuggestError> {
    // Layer 1: embedded defaults
    let mut figment = Figment::new()
        .merge(Toml::string(CONFIGURATION_TOML))
        .merge(Toml::string(PR_SUGGESTION_PROMPTS));

    // Layer 2: secrets file (optional, from filesystem)
    figment = figment.merge(Toml::file(".secrets.toml"));
    figment = figment.merge(Toml::file("settings/.secrets.toml"));

    // Layer 3: CLI argument overrides (--pr_suggestion.added_code_cap=4000)
    for (key, value) in cli_overrides {
        // Figment can't set an arbitrary dotted key, so build `[section]\nkey = value`
        if let Some(toml_fragment) = cli_override_to_toml(key, value) {
            figment = figment.merge(Toml::string(&toml_fragment));
        }
    }

    // Layer 4a: well-known env var aliases
    figment = figment.merge(
        Env::raw()
            .only(&[
                "OPENAI_API_KEY",
                "OPENAI_KEY",
                "GROQ_API_KEY",
                "GITHUB_TOKEN",
                "GITHUB_USER_TOKEN",
                "JIRA_URL",
                "JIRA_USER",
                "JIRA_API_TOKEN",
                "JIRA_TOKEN",
                "JIRA_AUTH_TYPE",
                "JIRA_OAUTH_TOKEN",
                "JIRA_CLOUD_ID",
            ])
            .map(|key| match key.as_str() {
                "OPENAI_API_KEY" | "OPENAI_KEY" | "GROQ_API_KEY" => "openai.key".into(),
                "GITHUB_TOKEN" | "GITHUB_USER_TOKEN" => "github.user_token".into(),
                "JIRA_URL" => "jira.base_url".into(),
                "JIRA_USER" => "jira.username".into(),
                "JIRA_API_TOKEN" | "JIRA_TOKEN" => "jira.api_token".into(),
                "JIRA_AUTH_TYPE" => "jira.auth_type".into(),
                "JIRA_OAUTH_TOKEN" => "jira.oauth_access_token".into(),
                "JIRA_CLOUD_ID" => "jira.cloud_id".into(),
                _ => key.into(),
            }),
    );

    // Layer 4b: SECTION.KEY env vars (CONFIG.MODEL → config.model).
    //
    // Handled as TOML fragments rather than figment's Env provider so that
    // numbers and booleans keep their types.
    for (key, value) in std::env::vars() {
        if !key.contains('.') {
            continue;
        }
        let lower = key.to_lowercase();
        let Some((section, field)) = lower.split_once('.') else {
            continue;
        };
        let fragment = format!("[{section}]\n{field} = {}", toml_scalar(value.trim()));
        figment = figment.merge(Toml::string(&fragment));
    }

    let settings: Settings = figment.extract()?;
    Ok(settings)
}

/// Encode a raw string as a TOML scalar: bools and numbers stay literal, the rest is quoted.
fn toml_scalar(value: &str) -> String {
    let is_literal = value == "true"
        || value == "false"
        || value.parse::<i64>().is_ok()
        || value.parse::<f64>().is_ok();
    if is_literal {
        value.to_string()
    } else {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t");
        format!("\"{escaped}\"")
    }
}

/// Convert a CLI override like "pr_suggestion.added_code_cap=4000" into a TOML fragment.
fn cli_override_to_toml(key: &str, value: &str) -> Option<String> {
    let (section, field) = match key.split_once('.') {
        Some(pair) => pair,
        None => {
            tracing::warn!("ignoring CLI override with no section: {key}={value}");
            return None;
        }
    };
    Some(format!("[{section}]\n{field} = {}", toml_scalar(value)))
}
