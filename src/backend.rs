//! Local language-model backends.
//!
//! Each supported server shape is a [`ModelBackend`]; [`ModelGateway`] picks
//! one from the settings and turns every failure into a [`ModelAnswer`] with
//! `success == false` and a readable diagnostic.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::Settings;
use crate::error::LaiserError;

pub const INVALID_BACKEND: &str = "invalid backend type";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAnswer {
    pub success: bool,
    pub content: String,
}

impl ModelAnswer {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
        }
    }

    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            success: false,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendProfile {
    /// Single `prompt` in, single `response` out.
    Ollama,
    /// OpenAI-style chat message array.
    LlamaCpp,
}

impl BackendProfile {
    pub fn name(&self) -> &'static str {
        match self {
            BackendProfile::Ollama => "ollama",
            BackendProfile::LlamaCpp => "llama.cpp",
        }
    }
}

impl FromStr for BackendProfile {
    type Err = LaiserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(BackendProfile::Ollama),
            "llama.cpp" | "llamacpp" | "llama_cpp" => Ok(BackendProfile::LlamaCpp),
            other => Err(LaiserError::config(
                "backend.api",
                format!("unsupported backend '{}'", other),
            )),
        }
    }
}

#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap liveness check, no generation.
    async fn probe(&self) -> bool;

    async fn generate(&self, prompt: &str) -> ModelAnswer;
}

#[derive(Serialize, Debug)]
pub struct OllamaRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

#[derive(Deserialize, Debug)]
pub struct OllamaResponse {
    pub response: String,
    #[serde(default)]
    pub total_duration: Option<u64>,
}

pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(client: Client, base_url: &str, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        BackendProfile::Ollama.name()
    }

    async fn probe(&self) -> bool {
        match self.client.get(&self.base_url).send().await {
            Ok(response) if response.status().is_success() => response
                .text()
                .await
                .map(|body| body.trim() == "Ollama is running")
                .unwrap_or(false),
            Ok(response) => {
                log::warn!("ollama probe returned {}", response.status());
                false
            }
            Err(e) => {
                log::warn!("ollama probe failed: {}", e);
                false
            }
        }
    }

    async fn generate(&self, prompt: &str) -> ModelAnswer {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };
        let url = format!("{}/api/generate", self.base_url);

        let result = post_json::<_, OllamaResponse>(&self.client, &url, &request).await;
        match result {
            Ok(Ok(body)) => {
                if let Some(duration_ns) = body.total_duration {
                    log::info!(
                        "ollama generation took {:.2}s",
                        duration_ns as f64 / 1_000_000_000.0
                    );
                }
                ModelAnswer::ok(body.response)
            }
            Ok(Err(answer)) => answer,
            Err(message) => ModelAnswer::failure(message),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Debug)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: i32,
    pub stream: bool,
}

#[derive(Deserialize, Debug)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
pub struct Choice {
    pub message: ChatMessage,
}

pub struct LlamaCppBackend {
    client: Client,
    base_url: String,
    model: String,
    system_prompt: String,
    temperature: f32,
}

impl LlamaCppBackend {
    pub fn new(
        client: Client,
        base_url: &str,
        model: &str,
        system_prompt: &str,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            system_prompt: system_prompt.to_string(),
            temperature,
        }
    }
}

#[async_trait]
impl ModelBackend for LlamaCppBackend {
    fn name(&self) -> &str {
        BackendProfile::LlamaCpp.name()
    }

    async fn probe(&self) -> bool {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                log::warn!("llama.cpp probe failed: {}", e);
                false
            }
        }
    }

    async fn generate(&self, prompt: &str) -> ModelAnswer {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: -1,
            stream: false,
        };
        let url = format!("{}/v1/chat/completions", self.base_url);

        match post_json::<_, ChatCompletionResponse>(&self.client, &url, &request).await {
            Ok(Ok(body)) => match body.choices.into_iter().next() {
                Some(choice) => ModelAnswer::ok(choice.message.content),
                None => ModelAnswer::failure("Request failed: response contained no choices"),
            },
            Ok(Err(answer)) => answer,
            Err(message) => ModelAnswer::failure(message),
        }
    }
}

/// POSTs `body` and decodes a 200 response as `R`.
///
/// Non-200 statuses come back as `Ok(Err(answer))` carrying the status and
/// body text; transport and decoding errors come back as `Err(message)`.
async fn post_json<B, R>(
    client: &Client,
    url: &str,
    body: &B,
) -> Result<Result<R, ModelAnswer>, String>
where
    B: Serialize + ?Sized + Sync,
    R: serde::de::DeserializeOwned,
{
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        let text = response.text().await.unwrap_or_default();
        let message = format!("Error: {}\n{}", status.as_u16(), text);
        log::error!("{}", message);
        return Ok(Err(ModelAnswer::failure(message)));
    }

    response
        .json::<R>()
        .await
        .map(Ok)
        .map_err(|e| format!("Request failed: {}", e))
}

pub fn offline_message(name: &str) -> String {
    format!(
        "{name} server is offline or status is not 'ok'.\nPlease check your {name} settings.\n"
    )
}

pub struct ModelGateway {
    backend: Option<Box<dyn ModelBackend>>,
    requested: String,
}

impl ModelGateway {
    pub fn new(backend: Box<dyn ModelBackend>) -> Self {
        let requested = backend.name().to_string();
        Self {
            backend: Some(backend),
            requested,
        }
    }

    /// A gateway for a profile name nothing implements; it never touches the network.
    pub fn unsupported(requested: impl Into<String>) -> Self {
        Self {
            backend: None,
            requested: requested.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let client = Client::new();

        match settings.backend.api.parse::<BackendProfile>() {
            Ok(BackendProfile::Ollama) => Self::new(Box::new(OllamaBackend::new(
                client,
                &settings.ollama.base_url,
                &settings.ollama.model,
            ))),
            Ok(BackendProfile::LlamaCpp) => Self::new(Box::new(LlamaCppBackend::new(
                client,
                &settings.llama_cpp.base_url(),
                &settings.llama_cpp.model,
                &settings.llama_cpp.system_prompt,
                settings.llama_cpp.temperature,
            ))),
            Err(e) => {
                log::warn!("{}", e);
                Self::unsupported(settings.backend.api.clone())
            }
        }
    }

    pub fn backend_name(&self) -> &str {
        &self.requested
    }

    pub async fn ensure_ready(&self) -> Result<(), ModelAnswer> {
        let Some(backend) = &self.backend else {
            return Err(ModelAnswer::failure(INVALID_BACKEND));
        };

        if backend.probe().await {
            Ok(())
        } else {
            let message = offline_message(backend.name());
            log::error!("{}", message.trim_end());
            Err(ModelAnswer::failure(message))
        }
    }

    /// Sends `prompt` without probing first.
    pub async fn complete(&self, prompt: &str) -> ModelAnswer {
        match &self.backend {
            Some(backend) => {
                log::debug!("sending {} byte prompt to {}", prompt.len(), backend.name());
                backend.generate(prompt).await
            }
            None => ModelAnswer::failure(INVALID_BACKEND),
        }
    }

    pub async fn generate(&self, prompt: &str) -> ModelAnswer {
        if let Err(answer) = self.ensure_ready().await {
            return answer;
        }
        self.complete(prompt).await
    }
}
