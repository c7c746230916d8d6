//! Web-search query rewriting.

use crate::completion::{complete, vars};
use crate::domain::DomainContext;
use crate::language::{detect_script, language_instruction, Script};
use crate::state::RequestState;
use greenguide_core::{AppError, AppResult, Stage};
use greenguide_prompt::ids;

/// Rewrite the current question into a web search query.
///
/// The language follows the question as originally asked. When an image
/// summary is present both signals are fused into one query.
pub async fn rewrite_question(ctx: &DomainContext, state: &RequestState) -> AppResult<String> {
    let instruction = language_instruction(&state.original_question, &ctx.settings().default_language);

    let prompts = &ctx.services.prompts;
    let prompt = match state.image_summary() {
        Some(summary) => prompts.render(
            ids::REWRITE_IMAGE,
            vars([
                ("question", state.question.as_str()),
                ("image_summary", summary),
                ("language_instruction", instruction.as_str()),
            ]),
        ),
        None => prompts.render(
            ids::REWRITE_TEXT,
            vars([
                ("question", state.question.as_str()),
                ("language_instruction", instruction.as_str()),
            ]),
        ),
    }
    .map_err(|e| e.in_stage(Stage::Rewrite))?;

    let rewritten = complete(ctx.services.llm.as_ref(), prompt, &ctx.settings().model, None)
        .await
        .map_err(|e| e.in_stage(Stage::Rewrite))?;

    if rewritten.is_empty() {
        return Err(AppError::Rewrite("Rewriter returned an empty query".to_string()));
    }

    if detect_script(&state.original_question) == Script::Arabic
        && detect_script(&rewritten) != Script::Arabic
    {
        tracing::warn!(rewritten = %rewritten, "Rewritten query is no longer in Arabic script");
    }

    tracing::debug!(rewritten = %rewritten, "Rewrote question for web search");
    Ok(rewritten)
}
