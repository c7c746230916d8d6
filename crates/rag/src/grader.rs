//! Relevance grading.

use crate::completion::{complete, vars};
use crate::domain::DomainContext;
use crate::state::{RelevanceGrade, RequestState};
use greenguide_core::{AppError, AppResult, Stage};
use greenguide_prompt::ids;

/// Grade how well `context` answers the question in `state`.
///
/// Uses the image-aware prompt when an image summary is present. Output
/// that is not exactly one of the three grade digits is a grading error.
pub async fn grade(
    ctx: &DomainContext,
    state: &RequestState,
    context: &str,
) -> AppResult<RelevanceGrade> {
    let prompts = &ctx.services.prompts;
    let prompt = match state.image_summary() {
        Some(summary) => prompts.render(
            ids::GRADER_IMAGE,
            vars([
                ("domain", ctx.label()),
                ("context", context),
                ("question", state.question.as_str()),
                ("image_summary", summary),
            ]),
        ),
        None => prompts.render(
            ids::GRADER_TEXT,
            vars([
                ("domain", ctx.label()),
                ("context", context),
                ("question", state.question.as_str()),
            ]),
        ),
    }
    .map_err(|e| e.in_stage(Stage::Grading))?;

    let raw = complete(ctx.services.llm.as_ref(), prompt, &ctx.settings().model, None)
        .await
        .map_err(|e| e.in_stage(Stage::Grading))?;

    let grade = parse_grade(&raw)?;
    tracing::info!(%grade, "Graded question");
    Ok(grade)
}

/// Parse grader output into a grade.
///
/// Surrounding whitespace, quotes, backticks and a trailing period are
/// tolerated. Anything else is rejected rather than defaulted.
pub fn parse_grade(raw: &str) -> AppResult<RelevanceGrade> {
    let cleaned = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .trim_end_matches('.')
        .trim();

    match cleaned {
        "1" => Ok(RelevanceGrade::Answerable),
        "2" => Ok(RelevanceGrade::RelatedButUnanswered),
        "3" => Ok(RelevanceGrade::Unrelated),
        _ => Err(AppError::Grading(format!(
            "Expected grader output 1, 2 or 3, got {:?}",
            truncate(raw, 80)
        ))),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_digits() {
        assert_eq!(parse_grade("1").unwrap(), RelevanceGrade::Answerable);
        assert_eq!(parse_grade("2").unwrap(), RelevanceGrade::RelatedButUnanswered);
        assert_eq!(parse_grade("3").unwrap(), RelevanceGrade::Unrelated);
    }

    #[test]
    fn test_parse_tolerates_wrapping() {
        assert_eq!(parse_grade(" 2\n").unwrap(), RelevanceGrade::RelatedButUnanswered);
        assert_eq!(parse_grade("\"1\"").unwrap(), RelevanceGrade::Answerable);
        assert_eq!(parse_grade("`3`").unwrap(), RelevanceGrade::Unrelated);
        assert_eq!(parse_grade("3.").unwrap(), RelevanceGrade::Unrelated);
    }

    #[test]
    fn test_parse_rejects_everything_else() {
        for raw in ["", "4", "0", "12", "Score: 2", "maybe 2", "two", "1 or 2"] {
            let err = parse_grade(raw).unwrap_err();
            assert_eq!(err.stage(), Some(Stage::Grading), "input {:?}", raw);
        }
    }
}
