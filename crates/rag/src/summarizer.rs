//! Image summaries for retrieval and grading.

use crate::completion::{complete, vars};
use crate::domain::DomainContext;
use greenguide_core::{AppError, AppResult, Stage};
use greenguide_llm::ImageData;
use greenguide_prompt::ids;

/// Describe `image` as a concise, search-friendly caption.
///
/// Runs on the vision model. An empty caption is a failure: later nodes
/// assume the summary is present whenever an image was supplied.
pub async fn summarize_image(ctx: &DomainContext, image: &ImageData) -> AppResult<String> {
    if image.is_empty() {
        return Err(AppError::ImageSummary("Image payload is empty".to_string()));
    }

    let prompt = ctx
        .services
        .prompts
        .render(ids::IMAGE_SUMMARIZE, vars([]))
        .map_err(|e| e.in_stage(Stage::ImageSummary))?;

    let summary = complete(
        ctx.services.llm.as_ref(),
        prompt,
        &ctx.settings().vision_model,
        Some(image),
    )
    .await
    .map_err(|e| e.in_stage(Stage::ImageSummary))?;

    if summary.is_empty() {
        return Err(AppError::ImageSummary(
            "Vision model returned an empty summary".to_string(),
        ));
    }

    tracing::debug!(summary = %summary, mime = image.mime_type(), "Summarized image");
    Ok(summary)
}
