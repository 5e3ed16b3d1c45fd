//! Local web page: one form, one `/search` endpoint, one query at a time.

use axum::extract::State;
use axum::response::{Html, Json};
use axum::routing::{get, post};
use axum::{Form, Router};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::pipeline::Pipeline;
use crate::sources::{escape_html, SourceFormat, SourceLinks};

pub const BUSY_MESSAGE: &str =
    "Sorry, I can only handle one request at a time and I'm currently busy.";

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    permit: Arc<Semaphore>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            permit: Arc::new(Semaphore::new(1)),
        }
    }

    /// The single-permit token a request must hold while it runs.
    pub fn permit(&self) -> Arc<Semaphore> {
        Arc::clone(&self.permit)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchForm {
    pub input_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub result: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(index))
        .route("/search", post(search))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub fn render_web_answer(answer: &str, links: &mut SourceLinks) -> String {
    format!(
        "<div id='answer-response'>{}</div>\n{}",
        escape_html(answer),
        links.render_and_clear(SourceFormat::Html)
    )
}

pub async fn search(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Json<SearchResponse> {
    let request_id = Uuid::new_v4();
    let query = form.input_text.trim();
    log::info!("[{}] received web request: {}", request_id, query);

    let Ok(_permit) = state.permit.try_acquire() else {
        log::warn!("[{}] rejected, another request is in flight", request_id);
        return Json(SearchResponse {
            result: BUSY_MESSAGE.to_string(),
        });
    };

    let start = Instant::now();
    let mut links = SourceLinks::new();
    let answer = state.pipeline.answer(query, &mut links).await;
    let result = render_web_answer(&answer, &mut links);

    log::info!(
        "[{}] completed in {:.2} seconds",
        request_id,
        start.elapsed().as_secs_f64()
    );

    Json(SearchResponse { result })
}

pub async fn serve(config: &ServerConfig, pipeline: Pipeline) -> anyhow::Result<()> {
    let address = format!("{}:{}", config.binding_address, config.binding_port);
    let listener = TcpListener::bind(&address).await?;

    println!(
        "{} Starting server at: {}",
        "🚀".cyan(),
        format!("http://{}", address).yellow()
    );
    log::info!("using {} backend", pipeline.backend_name());

    axum::serve(listener, router(AppState::new(pipeline))).await?;
    Ok(())
}
