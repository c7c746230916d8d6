//! Turning rendered prompts into chat calls.

use greenguide_core::AppResult;
use greenguide_llm::{ImageData, LlmClient, LlmRequest};
use greenguide_prompt::BuiltPrompt;
use std::collections::HashMap;

/// Build the variable map for a prompt from `(name, value)` pairs.
pub(crate) fn vars<const N: usize>(pairs: [(&str, &str); N]) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Send `prompt` to `llm` and return the trimmed reply.
pub(crate) async fn complete(
    llm: &dyn LlmClient,
    prompt: BuiltPrompt,
    model: &str,
    image: Option<&ImageData>,
) -> AppResult<String> {
    let mut request = LlmRequest::new(prompt.user, model);
    if let Some(system) = prompt.system {
        request = request.with_system(system);
    }
    if let Some(temperature) = prompt.temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(image) = image {
        request = request.with_image(image.clone());
    }

    tracing::trace!(
        prompt_id = %prompt.metadata.source_prompt_id,
        provider = llm.provider_name(),
        model,
        "Sending completion"
    );

    let response = llm.complete(&request).await?;

    tracing::debug!(
        prompt_id = %prompt.metadata.source_prompt_id,
        model = %response.model,
        total_tokens = response.usage.total_tokens,
        "Completion finished"
    );

    Ok(response.content.trim().to_string())
}
