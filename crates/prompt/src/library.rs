//! Built-in prompt library with workspace overrides.

use crate::builder::build_prompt;
use crate::loader::{list_prompts, load_prompt, parse_prompt};
use crate::types::{BuiltPrompt, PromptDefinition};
use greenguide_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;

/// Identifiers of the prompts used by the answering pipeline.
pub mod ids {
    pub const GRADER_TEXT: &str = "grader.text";
    pub const GRADER_IMAGE: &str = "grader.image";
    pub const IMAGE_SUMMARIZE: &str = "image.summarize";
    pub const REWRITE_TEXT: &str = "rewrite.text";
    pub const REWRITE_IMAGE: &str = "rewrite.image";
    pub const SEARCH_ANSWER: &str = "search.answer";
    pub const GENERATE_TEXT: &str = "generate.text";
    pub const GENERATE_IMAGE: &str = "generate.image";
}

const BUILTIN_PROMPTS: [(&str, &str); 8] = [
    (ids::GRADER_TEXT, include_str!("../prompts/grader.text.yml")),
    (ids::GRADER_IMAGE, include_str!("../prompts/grader.image.yml")),
    (ids::IMAGE_SUMMARIZE, include_str!("../prompts/image.summarize.yml")),
    (ids::REWRITE_TEXT, include_str!("../prompts/rewrite.text.yml")),
    (ids::REWRITE_IMAGE, include_str!("../prompts/rewrite.image.yml")),
    (ids::SEARCH_ANSWER, include_str!("../prompts/search.answer.yml")),
    (ids::GENERATE_TEXT, include_str!("../prompts/generate.text.yml")),
    (ids::GENERATE_IMAGE, include_str!("../prompts/generate.image.yml")),
];

/// The set of prompt definitions a process answers with.
///
/// Immutable once built, so it can be shared by every domain.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    prompts: HashMap<String, PromptDefinition>,
}

impl PromptLibrary {
    /// Library with only the compiled-in definitions.
    pub fn builtin() -> AppResult<Self> {
        let mut prompts = HashMap::with_capacity(BUILTIN_PROMPTS.len());
        for (id, yaml) in BUILTIN_PROMPTS {
            let definition = parse_prompt(yaml, id)?;
            prompts.insert(id.to_string(), definition);
        }
        Ok(Self { prompts })
    }

    /// Built-in definitions, replaced by any `<workspace>/.greenguide/prompts/<id>.yml`.
    ///
    /// Override files whose id is not a known prompt are ignored with a warning.
    pub fn load(workspace_path: &Path) -> AppResult<Self> {
        let mut library = Self::builtin()?;

        for id in list_prompts(workspace_path)? {
            if !library.prompts.contains_key(&id) {
                tracing::warn!(prompt_id = %id, "Ignoring override for unknown prompt");
                continue;
            }
            let definition = load_prompt(workspace_path, &id)?;
            library.prompts.insert(id, definition);
        }

        Ok(library)
    }

    pub fn get(&self, id: &str) -> AppResult<&PromptDefinition> {
        self.prompts
            .get(id)
            .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", id)))
    }

    /// Render prompt `id` with `variables`.
    pub fn render(&self, id: &str, variables: HashMap<String, String>) -> AppResult<BuiltPrompt> {
        build_prompt(self.get(id)?, variables)
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.prompts.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
