use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use laiser::backend::{ModelAnswer, ModelBackend, ModelGateway};
use laiser::pipeline::{Pipeline, PipelineOptions};
use laiser::prompt::PromptTemplate;
use laiser::providers::{
    Encyclopedia, NewsRecord, Providers, SearchProvider, SearchRecord,
};
use laiser::server::{self, AppState, SearchForm, BUSY_MESSAGE};
use laiser::sources::{SourceFormat, SourceLinks};
use laiser::LaiserResult;

use axum::extract::State;
use axum::Form;

struct FixedSearch;

#[async_trait]
impl SearchProvider for FixedSearch {
    async fn search(&self, query: &str, limit: usize) -> LaiserResult<Vec<SearchRecord>> {
        if query.starts_with("site:wikipedia.org") {
            return Ok(vec![SearchRecord {
                title: "Global warming - Wikipedia".into(),
                url: "https://en.wikipedia.org/wiki/Global_warming".into(),
                snippet: "encyclopedia".into(),
            }]);
        }
        let records = vec![
            SearchRecord {
                title: "NASA overview".into(),
                url: "https://science.nasa.gov/climate".into(),
                snippet: "Long-term shifts".into(),
            },
            SearchRecord {
                title: "Encyclopedia hit".into(),
                url: "https://en.wikipedia.org/wiki/Global_warming".into(),
                snippet: "Also on the web".into(),
            },
        ];
        Ok(records.into_iter().take(limit).collect())
    }

    async fn news(&self, _query: &str, _limit: usize) -> LaiserResult<Vec<NewsRecord>> {
        Ok(vec![NewsRecord {
            title: "Record heat".into(),
            url: "https://news.example/heat".into(),
            snippet: "Temperatures rose".into(),
            source: "Example News".into(),
        }])
    }
}

struct FixedEncyclopedia;

#[async_trait]
impl Encyclopedia for FixedEncyclopedia {
    async fn extract(&self, title: &str) -> LaiserResult<Option<String>> {
        assert_eq!(title, "Global_warming");
        Ok(Some("Warming is observed. It is driven by emissions. More text follows.".into()))
    }
}

#[derive(Clone)]
struct RecordingBackend {
    online: bool,
    reply: ModelAnswer,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl RecordingBackend {
    fn new(online: bool, reply: ModelAnswer) -> Self {
        Self {
            online,
            reply,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl ModelBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    async fn probe(&self) -> bool {
        self.online
    }

    async fn generate(&self, prompt: &str) -> ModelAnswer {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}

fn options() -> PipelineOptions {
    PipelineOptions {
        search_result_count: 2,
        news_result_count: 1,
        query_delay: Duration::ZERO,
        silent: true,
        spinner: false,
    }
}

fn pipeline(backend: RecordingBackend) -> Pipeline {
    Pipeline::new(
        Providers::new(Box::new(FixedSearch), Box::new(FixedEncyclopedia), Some(2)),
        ModelGateway::new(Box::new(backend)),
        PromptTemplate::default(),
        options(),
    )
}

#[tokio::test]
async fn climate_change_prompt_contains_all_blocks_in_order() {
    let backend = RecordingBackend::new(
        true,
        ModelAnswer::ok("Climate change is real. Both answers agree. The summary is cut"),
    );
    let prompts = Arc::clone(&backend.prompts);
    let pipeline = pipeline(backend);
    let mut links = SourceLinks::new();

    let answer = pipeline.answer("climate change", &mut links).await;
    assert_eq!(answer, "Climate change is real. Both answers agree.");

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];

    let wiki = prompt.find("Wikipedia:\n```\n").unwrap();
    let web = prompt.find("Web search results:\n```\n").unwrap();
    let news = prompt.find("News search results:\n```\n").unwrap();
    assert!(wiki < web && web < news);

    assert_eq!(prompt.matches("climate change").count(), 2);
    assert!(prompt.contains("Warming is observed. It is driven by emissions.\n```\n"));
    assert_eq!(prompt.matches("Page title:").count(), 3);
    assert_eq!(prompt.matches("News source: Example News").count(), 1);

    assert_eq!(
        links.render_and_clear(SourceFormat::Plain),
        "https://en.wikipedia.org/wiki/Global_warming\n\
         https://science.nasa.gov/climate\n\
         https://news.example/heat\n"
    );
    assert_eq!(links.render_and_clear(SourceFormat::Plain), "");
}

#[tokio::test]
async fn offline_backend_skips_searching() {
    let backend = RecordingBackend::new(false, ModelAnswer::ok("unused."));
    let prompts = Arc::clone(&backend.prompts);
    let pipeline = pipeline(backend);
    let mut links = SourceLinks::new();

    let answer = pipeline.answer("climate change", &mut links).await;
    assert!(answer.starts_with("recording server is offline"));
    assert!(links.is_empty());
    assert!(prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn backend_failure_is_returned_untrimmed() {
    let backend = RecordingBackend::new(true, ModelAnswer::failure("Error: 500\nboom"));
    let pipeline = pipeline(backend);
    let mut links = SourceLinks::new();

    let answer = pipeline.answer("climate change", &mut links).await;
    assert_eq!(answer, "Error: 500\nboom");
}

#[tokio::test]
async fn web_handler_renders_answer_and_sources() {
    let backend = RecordingBackend::new(true, ModelAnswer::ok("It is <warming>. Cut"));
    let state = AppState::new(pipeline(backend));

    let response = server::search(
        State(state),
        Form(SearchForm {
            input_text: "climate change".into(),
        }),
    )
    .await;

    let result = &response.0.result;
    assert!(result.starts_with("<div id='answer-response'>It is &lt;warming&gt;.</div>\n"));
    assert!(result.contains("<ul id='sources' class='sources'>"));
    assert_eq!(result.matches("<li class='source-item'>").count(), 3);
}

#[tokio::test]
async fn web_handler_rejects_concurrent_requests() {
    let backend = RecordingBackend::new(true, ModelAnswer::ok("Unused."));
    let prompts = Arc::clone(&backend.prompts);
    let state = AppState::new(pipeline(backend));

    let token = state.permit();
    let _held = token.try_acquire().unwrap();

    let response = server::search(
        State(state.clone()),
        Form(SearchForm {
            input_text: "climate change".into(),
        }),
    )
    .await;

    assert_eq!(response.0.result, BUSY_MESSAGE);
    assert!(prompts.lock().unwrap().is_empty());
}
