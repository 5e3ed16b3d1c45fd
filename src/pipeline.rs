use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::answer::remove_incomplete_sentence;
use crate::backend::ModelGateway;
use crate::config::Settings;
use crate::error::LaiserResult;
use crate::prompt::{Gathered, PromptTemplate};
use crate::providers::Providers;
use crate::sources::SourceLinks;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub search_result_count: usize,
    pub news_result_count: usize,
    /// Pause after each provider call.
    pub query_delay: Duration,
    pub silent: bool,
    pub spinner: bool,
}

impl From<&Settings> for PipelineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            search_result_count: settings.search.search_result_count,
            news_result_count: settings.search.news_result_count,
            query_delay: settings.search.query_delay(),
            silent: settings.output.silent,
            spinner: false,
        }
    }
}

/// Turns one query into a cleaned answer, collecting sources along the way.
pub struct Pipeline {
    providers: Providers,
    gateway: ModelGateway,
    template: PromptTemplate,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        providers: Providers,
        gateway: ModelGateway,
        template: PromptTemplate,
        options: PipelineOptions,
    ) -> Self {
        Self {
            providers,
            gateway,
            template,
            options,
        }
    }

    pub fn from_settings(settings: &Settings) -> LaiserResult<Self> {
        Ok(Self::new(
            Providers::from_settings(settings)?,
            ModelGateway::from_settings(settings),
            PromptTemplate::new(&settings.prompt.template)?,
            PipelineOptions::from(settings),
        ))
    }

    pub fn with_spinner(mut self, spinner: bool) -> Self {
        self.options.spinner = spinner;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.gateway.backend_name()
    }

    fn status(&self, message: &str) {
        log::debug!("{}", message);
        if !self.options.silent {
            eprintln!("{} {}", "•".blue(), message);
        }
    }

    async fn pause(&self) {
        if !self.options.query_delay.is_zero() {
            tokio::time::sleep(self.options.query_delay).await;
        }
    }

    /// Queries the encyclopedia, web and news providers one after another.
    pub async fn gather(&self, query: &str, links: &mut SourceLinks) -> Gathered {
        self.status("Getting Wikipedia summary...");
        let summary = self.providers.wikipedia(query, links).await;
        self.pause().await;

        self.status("Getting search results...");
        let search = self
            .providers
            .web(query, self.options.search_result_count, links)
            .await;
        self.pause().await;

        self.status("Getting news results...");
        let news = self
            .providers
            .news(query, self.options.news_result_count, links)
            .await;
        self.pause().await;

        Gathered {
            summary,
            search,
            news,
        }
    }

    pub async fn answer(&self, query: &str, links: &mut SourceLinks) -> String {
        if let Err(answer) = self.gateway.ensure_ready().await {
            return answer.content;
        }

        let gathered = self.gather(query, links).await;
        let prompt = self.template.assemble(query, &gathered);
        log::debug!(
            "assembled prompt: {} bytes, {} web / {} news results",
            prompt.len(),
            gathered.search.len(),
            gathered.news.len()
        );

        self.status("Feeding the llama... ^°π°^");
        let spinner = self.options.spinner && !self.options.silent;
        let progress = spinner.then(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
            bar.set_message(format!("Waiting for {}...", self.gateway.backend_name()));
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });

        let answer = self.gateway.complete(&prompt).await;

        if let Some(bar) = progress {
            bar.finish_and_clear();
        }

        if answer.success {
            remove_incomplete_sentence(&answer.content)
        } else {
            answer.content
        }
    }
}
