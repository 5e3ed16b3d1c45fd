use clap::{ArgGroup, Parser};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::{Settings, DEFAULT_CONFIG_FILE};
use crate::pipeline::Pipeline;
use crate::sources::{SourceFormat, SourceLinks};

pub const APP_NAME: &str = "LAISer";

#[derive(Parser, Debug)]
#[command(name = "laiser", version, about = "LAISer - Local AI Search")]
#[command(group(ArgGroup::new("mode").required(true).args(["query", "server"])))]
pub struct Cli {
    /// The query to search for
    #[arg(short, long)]
    pub query: Option<String>,

    /// Serve the local web page instead of answering one query
    #[arg(short, long)]
    pub server: bool,

    /// Settings file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

pub enum Mode {
    Query(String),
    Server,
}

impl Cli {
    pub fn mode(&self) -> anyhow::Result<Mode> {
        match &self.query {
            Some(query) if query.trim().is_empty() => {
                anyhow::bail!("Enter a search query enclosed in quotes.")
            }
            Some(query) => Ok(Mode::Query(query.trim().to_string())),
            None => Ok(Mode::Server),
        }
    }
}

pub fn print_separator() {
    println!("{}", "━".repeat(8).dimmed());
}

/// Answers `query` once and prints the answer followed by its sources.
pub async fn run_query(settings: &Settings, query: &str) -> anyhow::Result<()> {
    let silent = settings.output.silent;
    let start = Instant::now();
    let pipeline = Pipeline::from_settings(settings)?.with_spinner(true);

    if !silent {
        println!("{} Using {}", "🦙".cyan(), pipeline.backend_name().yellow());
    }

    let mut links = SourceLinks::new();
    let answer = pipeline.answer(query, &mut links).await;

    if !silent {
        println!("{}", "━━━━━━━━┫ ANSWER".cyan().bold());
    }
    println!("{}", answer);

    println!("\n{}", "SOURCES:".blue().bold());
    println!("{}", links.render_and_clear(SourceFormat::Plain));

    if !silent {
        print_separator();
        println!(
            "{} Completed in {:.2} seconds.",
            "⏱".dimmed(),
            start.elapsed().as_secs_f64()
        );
    }

    Ok(())
}
