//! Grounded answer generation.

use crate::completion::{complete, vars};
use crate::domain::DomainContext;
use crate::state::RequestState;
use greenguide_core::{AppError, AppResult, Stage};
use greenguide_prompt::ids;

/// Answer the question from the retrieved `context` and image summary.
pub async fn generate_answer(
    ctx: &DomainContext,
    state: &RequestState,
    context: &str,
) -> AppResult<String> {
    let prompts = &ctx.services.prompts;
    let region = ctx.settings().region.as_str();

    let prompt = match state.image_summary() {
        Some(summary) => prompts.render(
            ids::GENERATE_IMAGE,
            vars([
                ("domain", ctx.label()),
                ("region", region),
                ("context", context),
                ("image_summary", summary),
                ("question", state.question.as_str()),
            ]),
        ),
        None => prompts.render(
            ids::GENERATE_TEXT,
            vars([
                ("domain", ctx.label()),
                ("region", region),
                ("context", context),
                ("question", state.question.as_str()),
            ]),
        ),
    }
    .map_err(|e| e.in_stage(Stage::Generation))?;

    let answer = complete(ctx.services.llm.as_ref(), prompt, &ctx.settings().model, None)
        .await
        .map_err(|e| e.in_stage(Stage::Generation))?;

    if answer.is_empty() {
        return Err(AppError::Generation("Generator returned an empty answer".to_string()));
    }

    Ok(answer)
}
