use std::sync::LazyLock;

use minijinja::{Environment, UndefinedBehavior, Value};

use crate::config::types::PromptTemplate;
use crate::error::PrSuggestError;
use crate::processing::fusion::ContextBundle;

/// Shared minijinja environment with strict undefined behavior.
///
/// Block tags own their line (`trim_blocks` + `lstrip_blocks`), so omitted
/// sections leave no blank lines behind.
static JINJA_ENV: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env
});

/// Rendered prompt pair ready for the generation client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// Render the PR suggestion prompt for one context bundle.
///
/// Deterministic: the same bundle and template always yield the same text.
pub fn build_suggestion_prompt(
    template: &PromptTemplate,
    bundle: &ContextBundle,
) -> Result<RenderedPrompt, PrSuggestError> {
    render_prompt(template, Value::from_serialize(bundle))
}

/// Render a prompt template pair against a pre-built context.
pub fn render_prompt(template: &PromptTemplate, ctx: Value) -> Result<RenderedPrompt, PrSuggestError> {
    let env = &*JINJA_ENV;

    let system = render_template(env, "system", &template.system, &ctx)?;
    let user = render_template(env, "user", &template.user, &ctx)?;

    Ok(RenderedPrompt { system, user })
}

/// Render a single template string.
fn render_template(
    env: &Environment,
    name: &str,
    template_str: &str,
    ctx: &Value,
) -> Result<String, PrSuggestError> {
    let rendered = env
        .template_from_str(template_str)
        .and_then(|tmpl| tmpl.render(ctx.clone()))
        .inspect_err(|e| tracing::warn!(template = name, error = %e, "prompt template failed"))?;
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_settings;
    use crate::processing::fusion::TicketBundle;
    use std::collections::HashMap;

    fn bundle() -> ContextBundle {
        ContextBundle {
            owner: "acme".into(),
            repo: "widgets".into(),
            base: "main".into(),
            head: "feature/login".into(),
            files_changed: 3,
            additions: 50,
            deletions: 10,
            added_code: "src/auth.rs: pub fn login() {}".into(),
            deleted_code: "src/auth.rs: // TODO login".into(),
            ticket: None,
        }
    }

    fn ticket() -> TicketBundle {
        TicketBundle {
            title: "Add login".into(),
            description: "Users need to sign in.".into(),
            acceptance_criteria: vec!["User can log in".into(), "Errors are shown".into()],
        }
    }

    fn template() -> PromptTemplate {
        load_settings(&HashMap::new()).unwrap().pr_suggestion_prompt
    }

    fn user_prompt(bundle: &ContextBundle) -> String {
        build_suggestion_prompt(&template(), bundle).unwrap().user
    }

    #[test]
    fn test_render_simple_variables() {
        let template = PromptTemplate {
            system: "Repo {{ owner }}/{{ repo }}".into(),
            user: "{{ base }}..{{ head }}".into(),
        };
        let result = build_suggestion_prompt(&template, &bundle()).unwrap();
        assert_eq!(result.system, "Repo acme/widgets");
        assert_eq!(result.user, "main..feature/login");
    }

    #[test]
    fn test_render_strict_undefined_fails() {
        let template = PromptTemplate {
            system: String::new(),
            user: "{{ undefined_var }}".into(),
        };
        let err = build_suggestion_prompt(&template, &bundle()).unwrap_err();
        assert!(matches!(err, PrSuggestError::Template(_)), "unexpected error: {err:?}");
        assert!(err.to_string().starts_with("Template rendering error:"));
    }

    #[test]
    fn test_repository_section_always_present() {
        let prompt = user_prompt(&bundle());
        assert!(prompt.contains("Repository: acme/widgets"));
        assert!(prompt.contains("Comparing: main -> feature/login"));
        assert!(prompt.contains("Files Changed: 3"));
        assert!(prompt.contains("Stats: +50 -10"));
    }

    #[test]
    fn test_ticket_section_omitted_without_ticket() {
        let prompt = user_prompt(&bundle());
        assert!(!prompt.contains("## Ticket Context"));
        assert!(!prompt.contains("Reference the ticket's goal"));
        assert!(!prompt.contains("Acceptance Criteria"));
    }

    #[test]
    fn test_ticket_section_rendered_with_criteria() {
        let mut b = bundle();
        b.ticket = Some(ticket());
        let prompt = user_prompt(&b);

        assert!(prompt.contains("## Ticket Context\nTitle: Add login\nDescription: Users need to sign in."));
        assert!(prompt.contains("Acceptance Criteria:\n- User can log in\n- Errors are shown\n"));
        assert!(prompt.contains("Reference the ticket's goal"));
        assert!(prompt.contains("Acceptance Criteria Met:"));

        let ticket_pos = prompt.find("## Ticket Context").unwrap();
        let repo_pos = prompt.find("## Repository Context").unwrap();
        assert!(ticket_pos < repo_pos);
    }

    #[test]
    fn test_ticket_without_description_or_criteria() {
        let mut b = bundle();
        b.ticket = Some(TicketBundle {
            title: "Add login".into(),
            description: String::new(),
            acceptance_criteria: Vec::new(),
        });
        let prompt = user_prompt(&b);
        assert!(prompt.contains("Title: Add login"));
        assert!(!prompt.contains("Description: "));
        assert!(!prompt.contains("Acceptance Criteria"));
    }

    #[test]
    fn test_code_sections_omitted_independently() {
        let mut b = bundle();
        b.deleted_code = String::new();
        let prompt = user_prompt(&b);
        assert!(prompt.contains("## Added Code\n```\nsrc/auth.rs: pub fn login() {}\n```"));
        assert!(!prompt.contains("## Deleted Code"));

        b.added_code = String::new();
        b.deleted_code = "src/old.rs: gone".into();
        let prompt = user_prompt(&b);
        assert!(!prompt.contains("## Added Code"));
        assert!(prompt.contains("## Deleted Code\n```\nsrc/old.rs: gone\n```"));
    }

    #[test]
    fn test_sections_in_fixed_order_and_output_directive_last() {
        let mut b = bundle();
        b.ticket = Some(ticket());
        let prompt = user_prompt(&b);

        let order = [
            "You are an expert software engineer",
            "## Ticket Context",
            "## Repository Context",
            "## Added Code",
            "## Deleted Code",
            "## Instructions",
            "Example format:",
            "## Output",
        ];
        let positions: Vec<usize> = order.iter().map(|s| prompt.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
        assert!(prompt.trim_end().ends_with("TITLE: <your title>\nDESCRIPTION:\n<your description>"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let mut b = bundle();
        b.ticket = Some(ticket());
        assert_eq!(user_prompt(&b), user_prompt(&b));
    }

    #[test]
    fn test_default_system_prompt_is_empty() {
        let rendered = build_suggestion_prompt(&template(), &bundle()).unwrap();
        assert!(rendered.system.is_empty());
    }
}
