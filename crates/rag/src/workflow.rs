//! The question-answering state machine.
//!
//! A run walks `Start -> [SummarizeImage] -> Agent -> {Generate | Rewrite ->
//! Search | Refuse} -> End`. Each run owns a fresh [`RequestState`]; the
//! [`DomainContext`] is only read.

use crate::domain::DomainContext;
use crate::generator::generate_answer;
use crate::grader::grade;
use crate::refusal::refusal;
use crate::rewriter::rewrite_question;
use crate::search_agent::search_and_answer;
use crate::state::{Node, RelevanceGrade, RequestState};
use crate::summarizer::summarize_image;
use greenguide_core::{AppError, AppResult};
use greenguide_knowledge::format_context;
use greenguide_llm::ImageData;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

/// Result of a run along with how it was produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub response: String,
    pub grade: RelevanceGrade,

    /// Nodes visited, `Start` through `End`
    pub path: Vec<Node>,

    pub image_summary: Option<String>,
}

/// Answer `question` (and optional `image`) within the domain.
pub async fn run(
    ctx: &DomainContext,
    question: &str,
    image: Option<ImageData>,
) -> AppResult<String> {
    run_traced(ctx, question, image)
        .await
        .map(|outcome| outcome.response)
}

/// Like [`run`], but also reports the grade and the nodes visited.
pub async fn run_traced(
    ctx: &DomainContext,
    question: &str,
    image: Option<ImageData>,
) -> AppResult<RunOutcome> {
    let span = tracing::info_span!(
        "run",
        run_id = %Uuid::new_v4(),
        domain = %ctx.label()
    );

    let pipeline = execute(ctx, RequestState::new(question, image));

    let result = match ctx.settings().run_timeout {
        Some(limit) => match tokio::time::timeout(limit, pipeline).instrument(span.clone()).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "Run did not finish within {}s",
                limit.as_secs_f64()
            ))),
        },
        None => pipeline.instrument(span.clone()).await,
    };

    if let Err(e) = &result {
        let _entered = span.enter();
        match e.stage() {
            Some(stage) => tracing::error!(%stage, "Run failed: {}", e),
            None => tracing::error!("Run failed: {}", e),
        }
    }

    result
}

async fn execute(ctx: &DomainContext, mut state: RequestState) -> AppResult<RunOutcome> {
    let mut node = Node::Start;
    let mut path = vec![node];
    let mut grade_result: Option<RelevanceGrade> = None;
    let mut context = String::new();

    loop {
        match node {
            Node::Start | Node::End => {}
            Node::SummarizeImage => {
                let summary = match &state.image {
                    Some(image) => summarize_image(ctx, image).await?,
                    None => {
                        return Err(AppError::ImageSummary(
                            "No image to summarize".to_string(),
                        ))
                    }
                };
                state.set_image_summary(summary)?;
            }
            Node::Agent => {
                let retrieved = ctx.retriever.retrieve(&state.question).await?;
                context = format_context(&retrieved);
                grade_result = Some(grade(ctx, &state, &context).await?);
            }
            Node::Generate => {
                let answer = generate_answer(ctx, &state, &context).await?;
                state.set_response(answer)?;
            }
            Node::Rewrite => {
                state.question = rewrite_question(ctx, &state).await?;
            }
            Node::Search => {
                let answer = search_and_answer(ctx, &state).await?;
                state.set_response(answer)?;
            }
            Node::Refuse => {
                state.set_response(refusal(ctx.label()))?;
            }
        }

        if node == Node::End {
            break;
        }

        let next = node.next(&state, grade_result)?;
        tracing::debug!(from = ?node, to = ?next, "Transition");
        path.push(next);
        node = next;
    }

    let grade = grade_result
        .ok_or_else(|| AppError::Other("Run finished without a relevance grade".to_string()))?;
    let (response, image_summary) = state.into_parts();
    let response =
        response.ok_or_else(|| AppError::Other("Run finished without a response".to_string()))?;

    tracing::info!(%grade, nodes = path.len(), "Run finished");

    Ok(RunOutcome {
        response,
        grade,
        path,
        image_summary,
    })
}
