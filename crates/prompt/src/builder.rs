//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use greenguide_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Both the system and user templates are rendered with the same variables.
/// Rendering is strict: a variable referenced by a template but absent from
/// `variables` is an error rather than an empty string.
///
/// # Example
/// ```no_run
/// use greenguide_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "When do olives ripen?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::trace!(prompt_id = %definition.id, "Building prompt");

    let system = definition
        .system
        .as_deref()
        .map(|template| render_template(&definition.id, template, &variables))
        .transpose()?;
    let user = render_template(&definition.id, &definition.template, &variables)?;

    Ok(BuiltPrompt {
        system,
        user,
        temperature: definition.temperature,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            resolved_variables: variables,
        },
    })
}

/// Render a Handlebars template with variables.
fn render_template(
    prompt_id: &str,
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string(prompt_id, template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template {}: {}", prompt_id, e)))?;

    let rendered = handlebars
        .render(prompt_id, variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template {}: {}", prompt_id, e)))?;

    Ok(rendered.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(system: Option<&str>, template: &str) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            system: system.map(str::to_string),
            template: template.to_string(),
            temperature: Some(0.0),
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_renders_system_and_user() {
        let def = definition(Some("Expert in {{domain}}."), "Question: {{question}}\n");
        let built = build_prompt(
            &def,
            vars(&[("domain", "Food and Nutrition"), ("question", "Is honey healthy?")]),
        )
        .unwrap();

        assert_eq!(built.system.as_deref(), Some("Expert in Food and Nutrition."));
        assert_eq!(built.user, "Question: Is honey healthy?");
        assert_eq!(built.temperature, Some(0.0));
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
    }

    #[test]
    fn test_no_html_escaping() {
        let def = definition(None, "{{context}}");
        let built = build_prompt(&def, vars(&[("context", "pH < 7 & \"acidic\"")])).unwrap();
        assert_eq!(built.user, "pH < 7 & \"acidic\"");
        assert!(built.system.is_none());
    }

    #[test]
    fn test_missing_variable_is_error() {
        let def = definition(None, "Question: {{missing}}");
        let result = build_prompt(&def, HashMap::new());
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_invalid_template_is_error() {
        let def = definition(None, "{{#if}}");
        assert!(build_prompt(&def, HashMap::new()).is_err());
    }
}
