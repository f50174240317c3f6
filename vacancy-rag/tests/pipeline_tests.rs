//! Context building and answer generation.

mod common;

use std::sync::Arc;

use common::{FailingGenerator, HashEmbedder, RecordingGenerator, result, sample_vacancies};
use vacancy_rag::pipeline::{NO_GENERATOR_NOTICE, SYSTEM_PROMPT};
use vacancy_rag::{
    Embedder, RagConfig, RagError, RetrievalPipeline, SearchEngine, SearchFilters, build_context,
    build_index, format_prompt,
};

#[test]
fn context_dedups_before_truncating() {
    let results = vec![
        result("a", 0, 0.9),
        result("a", 1, 0.8),
        result("b", 0, 0.7),
        result("c", 0, 0.6),
        result("b", 1, 0.5),
    ];

    let ctx = build_context(&results, 2);
    let names: Vec<&str> = ctx.sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Vacancy a", "Vacancy b"]);
    assert_eq!(ctx.sources[0].score, 0.9);
    assert_eq!(ctx.sources[1].score, 0.7);
    assert_eq!(ctx.context.matches("[Вакансия:").count(), 2);
}

#[test]
fn context_block_format() {
    let ctx = build_context(&[result("a", 0, 0.9), result("b", 0, 0.8)], 5);
    assert_eq!(
        ctx.context,
        "[Вакансия: Vacancy a | Co | Алматы]\nВакансия: a\n\
         \n---\n\
         [Вакансия: Vacancy b | Co | Алматы]\nВакансия: b\n"
    );
    assert_eq!(ctx.sources[1].url, "https://hh.kz/vacancy/b");
    assert_eq!(ctx.sources[1].employer, "Co");
    assert_eq!(ctx.sources[1].area, "Алматы");
}

#[test]
fn empty_results_give_empty_context() {
    let ctx = build_context(&[], 5);
    assert!(ctx.context.is_empty());
    assert!(ctx.sources.is_empty());
    assert!(build_context(&[result("a", 0, 0.9)], 0).sources.is_empty());
}

#[test]
fn prompt_template_is_filled() {
    let prompt = format_prompt("КОНТЕКСТ", "ВОПРОС");
    assert!(prompt.starts_with("Вот релевантные вакансии из базы hh.kz:\n\nКОНТЕКСТ\n\n---\n"));
    assert!(prompt.contains("Вопрос пользователя: ВОПРОС"));
    assert!(!prompt.contains("{context}") && !prompt.contains("{question}"));
}

#[test]
fn placeholders_inside_values_are_not_expanded() {
    let prompt = format_prompt("text with {question}", "what about {context}?");
    assert!(prompt.contains("text with {question}"));
    assert!(prompt.contains("Вопрос пользователя: what about {context}?"));
}

async fn sample_engine() -> Arc<SearchEngine> {
    let provider = Arc::new(HashEmbedder::new());
    let embedder = Embedder::new(provider.clone());
    let index = build_index(&sample_vacancies(), &embedder, &RagConfig::default()).await.unwrap();
    Arc::new(SearchEngine::from_index(Arc::new(index), provider))
}

#[tokio::test]
async fn generator_receives_system_and_filled_prompt() {
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = RetrievalPipeline::builder()
        .engine(sample_engine().await)
        .generator(generator.clone())
        .build()
        .unwrap();

    let answer = pipeline.answer("Python Django", None, None).await.unwrap();
    assert_eq!(answer.answer, "generated answer");
    assert_eq!(answer.n_results, 3);
    assert_eq!(answer.sources.len(), 3);
    assert_eq!(answer.sources[0].name, "Python Developer");

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].0, SYSTEM_PROMPT);
    assert_eq!(prompts[0].1, format_prompt(&answer.context, "Python Django"));
}

#[tokio::test]
async fn answer_respects_filters_and_context_limit() {
    let config = RagConfig::builder().max_context_chunks(1).build().unwrap();
    let pipeline = RetrievalPipeline::builder()
        .config(config)
        .engine(sample_engine().await)
        .generator(Arc::new(RecordingGenerator::default()))
        .build()
        .unwrap();

    let filters = SearchFilters::new().city("Алматы");
    let answer = pipeline.answer("разработчик", Some(&filters), Some(5)).await.unwrap();
    assert_eq!(answer.n_results, 2);
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(answer.sources[0].area, "Алматы");
}

#[tokio::test]
async fn generator_errors_pass_through_unchanged() {
    let pipeline = RetrievalPipeline::builder()
        .engine(sample_engine().await)
        .generator(Arc::new(FailingGenerator))
        .build()
        .unwrap();

    match pipeline.answer("Python", None, None).await {
        Err(RagError::Generation { provider, message }) => {
            assert_eq!(provider, "mock");
            assert_eq!(message, "model overloaded");
        }
        other => panic!("expected generation error, got {other:?}"),
    }
}

#[tokio::test]
async fn without_generator_the_context_is_returned() {
    let pipeline = RetrievalPipeline::builder().engine(sample_engine().await).build().unwrap();
    assert!(!pipeline.has_generator());

    let answer = pipeline.answer("Data Scientist", None, Some(2)).await.unwrap();
    assert_eq!(answer.answer, format!("{NO_GENERATOR_NOTICE}\n\n{}", answer.context));
    assert_eq!(answer.n_results, 2);
    assert!(!answer.context.is_empty());
}

#[tokio::test]
async fn empty_question_is_rejected() {
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = RetrievalPipeline::builder()
        .engine(sample_engine().await)
        .generator(generator.clone())
        .build()
        .unwrap();

    assert!(matches!(pipeline.answer("  ", None, None).await, Err(RagError::EmptyQuery)));
    assert!(generator.prompts().is_empty());
}

#[test]
fn builder_requires_an_engine() {
    assert!(matches!(RetrievalPipeline::builder().build(), Err(RagError::Config(_))));
}
