//! End-to-end runs through the registry with scripted capabilities.

use super::fakes::{hit, FailingEmbedder, FakeSearch, ScriptedLlm};
use crate::domain::{Domain, DomainContext, DomainId, Services, WorkflowSettings};
use crate::language::{detect_script, Script};
use crate::refusal::refusal;
use crate::registry::DomainRegistry;
use crate::state::{Node, RelevanceGrade};
use crate::workflow;
use greenguide_core::{AppConfig, AppError, Stage};
use greenguide_knowledge::embeddings::providers::trigram::TrigramProvider;
use greenguide_knowledge::{build_index, BuildOptions, Retriever};
use greenguide_llm::ImageData;
use greenguide_prompt::PromptLibrary;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const FARMING: DomainId = DomainId(1);
const FOOD: DomainId = DomainId(2);
const ATHLETES: DomainId = DomainId(3);

const OLIVE_DOC: &str = "Olive trees are affected by several diseases. Olive knot is caused by \
bacteria and forms galls on branches. Verticillium wilt is a soil fungus that makes olive \
branches dry out. Peacock spot causes dark circular lesions on olive leaves.";

const PNG_BYTES: [u8; 12] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

struct Harness {
    registry: DomainRegistry,
    llm: Arc<ScriptedLlm>,
    search: Option<Arc<FakeSearch>>,
    config: AppConfig,
    _temp: TempDir,
}

impl Harness {
    fn queries(&self) -> Vec<String> {
        self.search.as_ref().map(|s| s.queries()).unwrap_or_default()
    }

    fn farming_folder(&self) -> PathBuf {
        self.config.workspace.join("documents/Farming")
    }
}

fn write_documents(workspace: &std::path::Path) {
    let farming = workspace.join("documents/Farming");
    fs::create_dir_all(&farming).unwrap();
    fs::write(farming.join("olives.txt"), OLIVE_DOC).unwrap();

    let athletes = workspace.join("documents/Athletes");
    fs::create_dir_all(&athletes).unwrap();
    fs::write(
        athletes.join("recovery.md"),
        "# Recovery\n\nAthletes should drink water before, during and after training. Sleep supports muscle recovery.",
    )
    .unwrap();
    // Food_and_Nutrition is deliberately absent
}

fn services_for(
    config: &AppConfig,
    llm: Arc<ScriptedLlm>,
    search: Option<Arc<FakeSearch>>,
    run_timeout: Option<Duration>,
) -> Services {
    let mut settings = WorkflowSettings::from_config(config);
    settings.run_timeout = run_timeout;

    Services {
        llm,
        search: search.map(|s| s as Arc<dyn greenguide_search::WebSearch>),
        prompts: Arc::new(PromptLibrary::builtin().unwrap()),
        settings: Arc::new(settings),
    }
}

async fn harness_with(
    llm: ScriptedLlm,
    search: Option<FakeSearch>,
    run_timeout: Option<Duration>,
) -> Harness {
    let temp = TempDir::new().unwrap();
    write_documents(temp.path());

    let mut config = AppConfig::default();
    config.workspace = temp.path().to_path_buf();
    config.llm.vision_model = Some("llava".to_string());

    let llm = Arc::new(llm);
    let search = search.map(Arc::new);
    let services = services_for(&config, llm.clone(), search.clone(), run_timeout);
    let embedder = Arc::new(TrigramProvider::new(config.embedding.dimensions));

    let mut registry = DomainRegistry::with_services(&config, services, embedder);
    registry.open_or_ingest_all().await.unwrap();

    Harness {
        registry,
        llm,
        search,
        config,
        _temp: temp,
    }
}

async fn harness(replies: &[&str]) -> Harness {
    let search = FakeSearch::with_hits(vec![
        hit(
            "Lentil nutrition facts",
            "Cooked lentils contain about 9 grams of protein per 100 grams.",
        ),
        hit("Legumes for athletes", "Legumes are a good plant protein source."),
    ]);
    harness_with(ScriptedLlm::new(replies), Some(search), None).await
}

#[tokio::test]
async fn test_answerable_question_is_generated_from_context() {
    let h = harness(&[
        "1",
        "Olive trees commonly suffer from olive knot, verticillium wilt and peacock spot.",
    ])
    .await;

    let outcome = h
        .registry
        .run_traced(FARMING, "What diseases might affect olive trees?", None)
        .await
        .unwrap();

    assert_eq!(outcome.grade, RelevanceGrade::Answerable);
    assert_eq!(outcome.path, vec![Node::Start, Node::Agent, Node::Generate, Node::End]);
    assert!(outcome.response.contains("verticillium wilt"));
    assert!(outcome.image_summary.is_none());

    let requests = h.llm.requests();
    assert_eq!(requests.len(), 2);

    let grader = &requests[0];
    assert!(grader.prompt.contains("Verticillium wilt"));
    assert!(grader.system.as_deref().unwrap().contains("Agriculture and Farming"));
    assert_eq!(grader.temperature, Some(0.0));

    let generator = &requests[1];
    assert!(generator.prompt.contains("Verticillium wilt"));
    assert!(generator
        .prompt
        .contains("Question: What diseases might affect olive trees?"));
    assert!(generator
        .system
        .as_deref()
        .unwrap()
        .contains("specializing in Agriculture and Farming in Jordan"));

    assert!(h.queries().is_empty());
}

#[tokio::test]
async fn test_unrelated_question_gets_refusal() {
    let h = harness(&["3"]).await;

    let outcome = h
        .registry
        .run_traced(FARMING, "What is the capital of France?", None)
        .await
        .unwrap();

    assert_eq!(outcome.grade, RelevanceGrade::Unrelated);
    assert_eq!(outcome.response, refusal("Agriculture and Farming"));
    assert_eq!(outcome.path, vec![Node::Start, Node::Agent, Node::Refuse, Node::End]);
    assert_eq!(h.llm.requests().len(), 1);
    assert!(h.queries().is_empty());
}

#[tokio::test]
async fn test_related_question_is_rewritten_and_searched() {
    let h = harness(&[
        "2",
        "protein content of lentils per 100 grams",
        "Cooked lentils provide about 9 grams of protein per 100 grams.",
    ])
    .await;

    let outcome = h
        .registry
        .run_traced(ATHLETES, "How much protein is in lentils?", None)
        .await
        .unwrap();

    assert_eq!(outcome.grade, RelevanceGrade::RelatedButUnanswered);
    assert_eq!(
        outcome.path,
        vec![Node::Start, Node::Agent, Node::Rewrite, Node::Search, Node::End]
    );
    assert!(!outcome.response.is_empty());
    assert_eq!(h.queries(), vec!["protein content of lentils per 100 grams".to_string()]);

    let requests = h.llm.requests();
    assert_eq!(requests.len(), 3);

    let rewrite = &requests[1];
    assert!(rewrite.prompt.contains("Question: How much protein is in lentils?"));
    assert!(rewrite.prompt.contains("Write the new question in English."));

    let synthesis = &requests[2];
    assert!(synthesis.prompt.contains("about 9 grams of protein"));
    assert!(synthesis
        .prompt
        .contains("Question: protein content of lentils per 100 grams"));
    assert!(synthesis
        .system
        .as_deref()
        .unwrap()
        .contains("Nutrition for Athletes"));
}

#[tokio::test]
async fn test_unrelated_image_is_summarized_then_refused() {
    let h = harness(&["A red toy car on a wooden table.", "3"]).await;

    let outcome = h
        .registry
        .run_traced(
            FARMING,
            "Is this safe to eat?",
            Some(ImageData::from_bytes(PNG_BYTES.to_vec())),
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.path,
        vec![
            Node::Start,
            Node::SummarizeImage,
            Node::Agent,
            Node::Refuse,
            Node::End
        ]
    );
    assert_eq!(
        outcome.image_summary.as_deref(),
        Some("A red toy car on a wooden table.")
    );
    assert_eq!(outcome.response, refusal("Agriculture and Farming"));

    let requests = h.llm.requests();
    assert_eq!(requests.len(), 2);

    let summary = &requests[0];
    assert_eq!(summary.images.len(), 1);
    assert_eq!(summary.images[0].mime_type(), "image/png");
    assert_eq!(summary.model, "llava");

    let grader = &requests[1];
    assert!(grader.images.is_empty());
    assert!(grader
        .prompt
        .contains("Image Summary: A red toy car on a wooden table."));
    assert!(grader.system.as_deref().unwrap().contains("image summary"));
}

#[tokio::test]
async fn test_answerable_image_question_uses_image_prompts() {
    let h = harness(&[
        "Olive leaves with dark circular spots.",
        "1",
        "These spots look like peacock spot, a fungal disease of olive leaves.",
    ])
    .await;

    let outcome = h
        .registry
        .run_traced(
            FARMING,
            "What is wrong with my tree?",
            Some(ImageData::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])),
        )
        .await
        .unwrap();

    assert_eq!(outcome.grade, RelevanceGrade::Answerable);
    let generator = &h.llm.requests()[2];
    assert!(generator
        .prompt
        .contains("Image Summary: Olive leaves with dark circular spots."));
    assert!(generator.prompt.contains("Question: What is wrong with my tree?"));
}

#[tokio::test]
async fn test_unparseable_grade_fails_without_branching() {
    let h = harness(&["maybe 2"]).await;

    let err = h
        .registry
        .run(FARMING, "When should olives be harvested?", None)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Grading));
    assert_eq!(h.llm.requests().len(), 1);
    assert!(h.queries().is_empty());
}

#[tokio::test]
async fn test_image_summary_failure_aborts_before_grading() {
    let llm = ScriptedLlm::from_results(vec![Err(AppError::Llm(
        "vision model not loaded".to_string(),
    ))]);
    let h = harness_with(llm, None, None).await;

    let err = h
        .registry
        .run(
            FARMING,
            "Is this leaf healthy?",
            Some(ImageData::from_bytes(PNG_BYTES.to_vec())),
        )
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::ImageSummary));
    assert!(err.to_string().contains("vision model not loaded"));
    assert_eq!(h.llm.requests().len(), 1);
}

#[tokio::test]
async fn test_empty_image_summary_is_a_failure() {
    let h = harness(&["   "]).await;

    let err = h
        .registry
        .run(
            FARMING,
            "Is this leaf healthy?",
            Some(ImageData::from_bytes(PNG_BYTES.to_vec())),
        )
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::ImageSummary));
}

#[tokio::test]
async fn test_embedding_failure_is_a_retrieval_error() {
    let temp = TempDir::new().unwrap();
    write_documents(temp.path());
    let mut config = AppConfig::default();
    config.workspace = temp.path().to_path_buf();

    let (index, _) = build_index(
        temp.path(),
        1,
        &temp.path().join("documents/Farming"),
        &TrigramProvider::new(64),
        BuildOptions::default(),
    )
    .await
    .unwrap();

    let llm = Arc::new(ScriptedLlm::new(&["1", "answer"]));
    let ctx = DomainContext::new(
        Domain {
            id: FARMING,
            label: "Agriculture and Farming".to_string(),
            documents: temp.path().join("documents/Farming"),
        },
        Retriever::new(
            Arc::new(index),
            Arc::new(FailingEmbedder { dimensions: 64 }),
            1,
        ),
        services_for(&config, llm.clone(), None, None),
    );

    let err = workflow::run(&ctx, "What diseases affect olives?", None)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Retrieval));
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn test_missing_search_provider_fails_search_stage() {
    let h = harness_with(
        ScriptedLlm::new(&["2", "best olive varieties for dry climates"]),
        None,
        None,
    )
    .await;

    let err = h
        .registry
        .run(FARMING, "Which olive varieties suit dry climates?", None)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Search));
    assert!(err.to_string().contains("No web search provider"));
}

#[tokio::test]
async fn test_search_failure_fails_search_stage() {
    let h = harness_with(
        ScriptedLlm::new(&["2", "olive irrigation schedule"]),
        Some(FakeSearch::failing()),
        None,
    )
    .await;

    let err = h
        .registry
        .run(FARMING, "How often should I water olive trees?", None)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Search));
    assert_eq!(h.queries(), vec!["olive irrigation schedule".to_string()]);
    assert_eq!(h.llm.requests().len(), 2);
}

#[tokio::test]
async fn test_empty_generation_is_a_failure() {
    let h = harness(&["1", ""]).await;

    let err = h
        .registry
        .run(FARMING, "What diseases might affect olive trees?", None)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Generation));
}

#[tokio::test]
async fn test_arabic_question_is_rewritten_in_arabic() {
    let h = harness(&[
        "2",
        "كمية البروتين في العدس لكل 100 غرام",
        "يحتوي العدس المطبوخ على حوالي 9 غرامات من البروتين لكل 100 غرام.",
    ])
    .await;

    let outcome = h
        .registry
        .run_traced(ATHLETES, "كم غرام من البروتين في العدس؟", None)
        .await
        .unwrap();

    let rewrite = &h.llm.requests()[1];
    assert!(rewrite.prompt.contains("write the new question in Arabic"));

    let queries = h.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(detect_script(&queries[0]), Script::Arabic);
    assert!(!outcome.response.is_empty());
}

#[tokio::test]
async fn test_french_question_is_rewritten_in_french() {
    let h = harness(&[
        "2",
        "teneur en protéines des lentilles pour 100 grammes",
        "Les lentilles cuites contiennent environ 9 grammes de protéines pour 100 grammes.",
    ])
    .await;

    let outcome = h
        .registry
        .run_traced(ATHLETES, "Combien de protéines dans les lentilles ?", None)
        .await
        .unwrap();

    assert_eq!(
        outcome.path,
        vec![Node::Start, Node::Agent, Node::Rewrite, Node::Search, Node::End]
    );

    let rewrite = &h.llm.requests()[1];
    assert!(rewrite
        .prompt
        .contains("Write the new question in the same language as the question."));
    assert!(!rewrite.prompt.contains("Write the new question in English."));

    assert_eq!(
        h.queries(),
        vec!["teneur en protéines des lentilles pour 100 grammes".to_string()]
    );
    let synthesis = &h.llm.requests()[2];
    assert!(synthesis
        .prompt
        .contains("Question: teneur en protéines des lentilles pour 100 grammes"));
    assert!(outcome.response.starts_with("Les lentilles"));
}

#[tokio::test]
async fn test_related_image_question_fuses_summary_into_rewrite() {
    let h = harness(&[
        "A bowl of cooked red lentils.",
        "2",
        "protein in cooked red lentils per serving",
        "A serving of cooked red lentils has about 9 grams of protein per 100 grams.",
    ])
    .await;

    let outcome = h
        .registry
        .run_traced(
            ATHLETES,
            "How much protein does this have?",
            Some(ImageData::from_bytes(PNG_BYTES.to_vec())),
        )
        .await
        .unwrap();

    assert_eq!(outcome.grade, RelevanceGrade::RelatedButUnanswered);
    assert_eq!(
        outcome.path,
        vec![
            Node::Start,
            Node::SummarizeImage,
            Node::Agent,
            Node::Rewrite,
            Node::Search,
            Node::End
        ]
    );

    let requests = h.llm.requests();
    assert_eq!(requests.len(), 4);

    let rewrite = &requests[2];
    assert!(rewrite.images.is_empty());
    assert!(rewrite.prompt.contains("Question: How much protein does this have?"));
    assert!(rewrite
        .prompt
        .contains("Image Summary: A bowl of cooked red lentils."));

    assert_eq!(
        h.queries(),
        vec!["protein in cooked red lentils per serving".to_string()]
    );
    assert!(requests[3]
        .prompt
        .contains("Question: protein in cooked red lentils per serving"));
}

#[tokio::test]
async fn test_empty_domain_still_grades() {
    let h = harness(&["3"]).await;

    let outcome = h
        .registry
        .run_traced(FOOD, "Which football team won the cup?", None)
        .await
        .unwrap();

    assert_eq!(outcome.response, refusal("Food and Nutrition"));
    assert!(h.llm.requests()[0].prompt.starts_with("Document:"));
}

#[tokio::test]
async fn test_empty_question_is_rejected() {
    let h = harness(&["1"]).await;

    let err = h.registry.run(FARMING, "   ", None).await.unwrap_err();
    assert!(matches!(err, AppError::Other(_)));
    assert!(h.llm.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_domain_is_rejected() {
    let h = harness(&["1"]).await;

    let err = h
        .registry
        .run(DomainId(42), "Any question?", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UnknownDomain(_)));
}

#[tokio::test]
async fn test_slow_run_times_out() {
    let llm = ScriptedLlm::new(&["1", "late answer"]).with_delay(Duration::from_secs(5));
    let h = harness_with(llm, None, Some(Duration::from_millis(50))).await;

    let err = h
        .registry
        .run(FARMING, "What diseases might affect olive trees?", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Timeout(_)));
}

#[tokio::test]
async fn test_suggest_asks_for_suggestions_about_topic() {
    let h = harness(&["2", "olive pruning tips", "Prune olive trees after harvest."]).await;

    let outcome = h.registry.suggest(FARMING, "olive pruning").await.unwrap();

    assert_eq!(outcome.response, "Prune olive trees after harvest.");
    assert!(h.llm.requests()[0]
        .prompt
        .contains("Question: give suggestions about 'olive pruning'"));
    assert!(h.registry.suggest(FARMING, " ").await.is_err());
}

#[tokio::test]
async fn test_reingest_keeps_retrieval_stable() {
    let mut h = harness(&[]).await;
    let query = "dark spots on olive leaves";

    let before = h
        .registry
        .context(FARMING)
        .unwrap()
        .retriever
        .retrieve(query)
        .await
        .unwrap();
    let chunks_before = h.registry.stats(FARMING).unwrap().chunks_count;

    let folder = h.farming_folder();
    h.registry.ingest(FARMING, &folder).await.unwrap();

    let after = h
        .registry
        .context(FARMING)
        .unwrap()
        .retriever
        .retrieve(query)
        .await
        .unwrap();

    assert_eq!(before, after);
    assert_eq!(h.registry.stats(FARMING).unwrap().chunks_count, chunks_before);
}

#[tokio::test]
async fn test_concurrent_runs_share_the_domain() {
    let h = harness(&["3", "3"]).await;

    let results = futures::future::join_all(vec![
        h.registry.run(FARMING, "Who painted the Mona Lisa?", None),
        h.registry.run(FARMING, "What is the capital of France?", None),
    ])
    .await;

    for result in results {
        assert_eq!(result.unwrap(), refusal("Agriculture and Farming"));
    }
    assert_eq!(h.llm.requests().len(), 2);
}

#[tokio::test]
async fn test_registry_lists_and_reports_domains() {
    let h = harness(&[]).await;

    let labels: Vec<&str> = h
        .registry
        .domains()
        .into_iter()
        .map(|d| d.label.as_str())
        .collect();
    assert_eq!(
        labels,
        vec![
            "Agriculture and Farming",
            "Food and Nutrition",
            "Nutrition for Athletes"
        ]
    );

    assert!(h.registry.is_ready(FARMING));
    assert_eq!(h.registry.stats(FARMING).unwrap().sources_count, 1);
    assert_eq!(h.registry.stats(FOOD).unwrap().chunks_count, 0);
    assert!(matches!(
        h.registry.stats(DomainId(9)),
        Err(AppError::UnknownDomain(_))
    ));
}
