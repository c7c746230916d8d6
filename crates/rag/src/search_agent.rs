//! Web search and answer synthesis for on-domain questions the corpus misses.

use crate::completion::{complete, vars};
use crate::domain::DomainContext;
use crate::state::RequestState;
use greenguide_core::{AppError, AppResult, Stage};
use greenguide_prompt::ids;
use greenguide_search::format_hits;

/// Search the web for the (rewritten) question and synthesize an answer.
pub async fn search_and_answer(ctx: &DomainContext, state: &RequestState) -> AppResult<String> {
    let search = ctx.services.search.as_ref().ok_or_else(|| {
        AppError::Search("No web search provider is configured".to_string())
    })?;

    let hits = search
        .search(&state.question, ctx.settings().max_search_results)
        .await
        .map_err(|e| e.in_stage(Stage::Search))?;

    tracing::info!(
        provider = search.provider_name(),
        hits = hits.len(),
        "Web search finished"
    );

    let results = if hits.is_empty() {
        "No results found.".to_string()
    } else {
        format_hits(&hits)
    };

    let prompt = ctx
        .services
        .prompts
        .render(
            ids::SEARCH_ANSWER,
            vars([
                ("domain", ctx.label()),
                ("region", ctx.settings().region.as_str()),
                ("results", results.as_str()),
                ("question", state.question.as_str()),
            ]),
        )
        .map_err(|e| e.in_stage(Stage::Search))?;

    let answer = complete(ctx.services.llm.as_ref(), prompt, &ctx.settings().model, None)
        .await
        .map_err(|e| e.in_stage(Stage::Search))?;

    if answer.is_empty() {
        return Err(AppError::Search("Search synthesis returned an empty answer".to_string()));
    }

    Ok(answer)
}
