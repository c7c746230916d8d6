//! Request state, relevance grades and the workflow transition table.

use greenguide_core::{AppError, AppResult};
use greenguide_llm::ImageData;
use serde::Serialize;
use std::fmt;

/// How well the retrieved context answers the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RelevanceGrade {
    /// The context directly answers the question
    Answerable,

    /// On-domain, but the context does not answer it
    RelatedButUnanswered,

    /// Completely unrelated to the domain
    Unrelated,
}

impl RelevanceGrade {
    /// The digit the grader prompts ask the model to emit.
    pub fn digit(&self) -> char {
        match self {
            Self::Answerable => '1',
            Self::RelatedButUnanswered => '2',
            Self::Unrelated => '3',
        }
    }
}

impl fmt::Display for RelevanceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Answerable => "answerable",
            Self::RelatedButUnanswered => "related-but-unanswered",
            Self::Unrelated => "unrelated",
        };
        f.write_str(name)
    }
}

/// Workflow nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Node {
    Start,
    SummarizeImage,
    Agent,
    Generate,
    Rewrite,
    Search,
    Refuse,
    End,
}

impl Node {
    /// The node that follows `self`.
    ///
    /// `grade` is consulted only when leaving `Agent`, where it is required.
    pub fn next(self, state: &RequestState, grade: Option<RelevanceGrade>) -> AppResult<Node> {
        let next = match self {
            Node::Start if state.image.is_some() => Node::SummarizeImage,
            Node::Start => Node::Agent,
            Node::SummarizeImage => Node::Agent,
            Node::Agent => match grade {
                Some(RelevanceGrade::Answerable) => Node::Generate,
                Some(RelevanceGrade::RelatedButUnanswered) => Node::Rewrite,
                Some(RelevanceGrade::Unrelated) => Node::Refuse,
                None => {
                    return Err(AppError::Other(
                        "Cannot leave Agent without a relevance grade".to_string(),
                    ))
                }
            },
            Node::Rewrite => Node::Search,
            Node::Generate | Node::Search | Node::Refuse => Node::End,
            Node::End => {
                return Err(AppError::Other("No transition out of End".to_string()));
            }
        };

        Ok(next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Node::Generate | Node::Search | Node::Refuse)
    }
}

/// The unit of work for one run. Owned by exactly one in-flight run.
#[derive(Debug, Clone)]
pub struct RequestState {
    /// Current question, replaced by the rewriter on the search branch
    pub question: String,

    /// The question as asked, kept for language detection
    pub original_question: String,

    pub image: Option<ImageData>,
    image_summary: Option<String>,
    response: Option<String>,
}

impl RequestState {
    pub fn new(question: impl Into<String>, image: Option<ImageData>) -> Self {
        let question = question.into();
        Self {
            original_question: question.clone(),
            question,
            image,
            image_summary: None,
            response: None,
        }
    }

    pub fn image_summary(&self) -> Option<&str> {
        self.image_summary.as_deref()
    }

    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    /// Record the image summary. Allowed once, and only when an image was supplied.
    pub fn set_image_summary(&mut self, summary: String) -> AppResult<()> {
        if self.image.is_none() {
            return Err(AppError::Other(
                "Image summary set for a request without an image".to_string(),
            ));
        }
        if self.image_summary.is_some() {
            return Err(AppError::Other("Image summary already set".to_string()));
        }
        self.image_summary = Some(summary);
        Ok(())
    }

    /// Record the final response. Allowed once.
    pub fn set_response(&mut self, response: String) -> AppResult<()> {
        if self.response.is_some() {
            return Err(AppError::Other("Response already set".to_string()));
        }
        self.response = Some(response);
        Ok(())
    }

    pub(crate) fn into_parts(self) -> (Option<String>, Option<String>) {
        (self.response, self.image_summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_image() -> RequestState {
        RequestState::new("Is this safe to eat?", Some(ImageData::from_bytes(vec![0xFF, 0xD8, 0xFF])))
    }

    #[test]
    fn test_start_branches_on_image() {
        let text_only = RequestState::new("q", None);
        assert_eq!(Node::Start.next(&text_only, None).unwrap(), Node::Agent);
        assert_eq!(Node::Start.next(&with_image(), None).unwrap(), Node::SummarizeImage);
        assert_eq!(Node::SummarizeImage.next(&with_image(), None).unwrap(), Node::Agent);
    }

    #[test]
    fn test_agent_routes_on_grade() {
        let state = RequestState::new("q", None);
        assert_eq!(
            Node::Agent.next(&state, Some(RelevanceGrade::Answerable)).unwrap(),
            Node::Generate
        );
        assert_eq!(
            Node::Agent.next(&state, Some(RelevanceGrade::RelatedButUnanswered)).unwrap(),
            Node::Rewrite
        );
        assert_eq!(
            Node::Agent.next(&state, Some(RelevanceGrade::Unrelated)).unwrap(),
            Node::Refuse
        );
        assert!(Node::Agent.next(&state, None).is_err());
    }

    #[test]
    fn test_terminal_nodes_end() {
        let state = RequestState::new("q", None);
        assert_eq!(Node::Rewrite.next(&state, None).unwrap(), Node::Search);
        for node in [Node::Generate, Node::Search, Node::Refuse] {
            assert!(node.is_terminal());
            assert_eq!(node.next(&state, None).unwrap(), Node::End);
        }
        assert!(Node::End.next(&state, None).is_err());
        assert!(!Node::Rewrite.is_terminal());
    }

    #[test]
    fn test_response_set_once() {
        let mut state = RequestState::new("q", None);
        state.set_response("first".to_string()).unwrap();
        assert!(state.set_response("second".to_string()).is_err());
        assert_eq!(state.response(), Some("first"));
    }

    #[test]
    fn test_image_summary_requires_image() {
        let mut text_only = RequestState::new("q", None);
        assert!(text_only.set_image_summary("a leaf".to_string()).is_err());

        let mut state = with_image();
        state.set_image_summary("a leaf".to_string()).unwrap();
        assert!(state.set_image_summary("again".to_string()).is_err());
        assert_eq!(state.image_summary(), Some("a leaf"));
    }

    #[test]
    fn test_grade_digits() {
        assert_eq!(RelevanceGrade::Answerable.digit(), '1');
        assert_eq!(RelevanceGrade::Unrelated.to_string(), "unrelated");
    }
}
