use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{LaiserError, LaiserResult};
use crate::prompt::{PromptTemplate, DEFAULT_TEMPLATE};

pub const DEFAULT_CONFIG_FILE: &str = "settings.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub ollama: OllamaConfig,
    pub llama_cpp: LlamaCppConfig,
    pub search: SearchConfig,
    pub duckduckgo: DuckDuckGoConfig,
    pub wikipedia: WikipediaConfig,
    pub prompt: PromptConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub binding_address: String,
    pub binding_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            binding_address: "127.0.0.1".to_string(),
            binding_port: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend profile name, `ollama` or `llama.cpp`.
    pub api: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api: "ollama".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlamaCppConfig {
    pub host: String,
    pub port: u16,
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
}

impl Default for LlamaCppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            model: "default".to_string(),
            system_prompt: "You are a helpful assistant.".to_string(),
            temperature: 0.7,
        }
    }
}

impl LlamaCppConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub search_result_count: usize,
    pub news_result_count: usize,
    pub trim_wikipedia_summary: bool,
    pub trim_wikipedia_lines: usize,
    pub query_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_result_count: 5,
            news_result_count: 5,
            trim_wikipedia_summary: true,
            trim_wikipedia_lines: 5,
            query_delay_ms: 1000,
            request_timeout_secs: 60,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        }
    }
}

impl SearchConfig {
    pub fn query_delay(&self) -> Duration {
        Duration::from_millis(self.query_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuckDuckGoConfig {
    pub html_url: String,
    pub base_url: String,
}

impl Default for DuckDuckGoConfig {
    fn default() -> Self {
        Self {
            html_url: "https://html.duckduckgo.com/html/".to_string(),
            base_url: "https://duckduckgo.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikipediaConfig {
    pub api_url: String,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub template: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub silent: bool,
}

impl Settings {
    pub fn from_toml(text: &str) -> LaiserResult<Self> {
        let settings: Settings =
            toml::from_str(text).map_err(|e| LaiserError::parse("settings", e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> LaiserResult<Self> {
        if !path.exists() {
            log::warn!(
                "config file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let text =
            fs::read_to_string(path).map_err(|e| LaiserError::io(e, Some(path.to_path_buf())))?;
        let settings = Self::from_toml(&text)?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> LaiserResult<()> {
        PromptTemplate::new(&self.prompt.template)?;
        if self.search.trim_wikipedia_summary && self.search.trim_wikipedia_lines == 0 {
            return Err(LaiserError::config(
                "search.trim_wikipedia_lines",
                "must be at least 1 when trimming is enabled",
            ));
        }
        Ok(())
    }

    pub fn display_info(&self) {
        println!("{}", "Settings:".cyan().bold());
        println!("  {} {}", "Backend:".blue(), self.backend.api.white().bold());
        println!(
            "  {} {} web / {} news",
            "Results:".blue(),
            self.search.search_result_count,
            self.search.news_result_count
        );
        println!();
    }
}
