use clap::Parser;
use colored::Colorize;

use laiser::cli::{run_query, Cli, Mode, APP_NAME};
use laiser::config::Settings;
use laiser::pipeline::Pipeline;
use laiser::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mode = cli.mode()?;

    let settings = Settings::load(&cli.config).map_err(|e| {
        eprintln!("{} {}", "❌".red(), e.to_user_message());
        e
    })?;

    match mode {
        Mode::Query(query) => run_query(&settings, &query).await,
        Mode::Server => {
            println!(
                "{}",
                format!("{} v{}", APP_NAME, env!("CARGO_PKG_VERSION")).cyan().bold()
            );
            settings.display_info();
            let pipeline = Pipeline::from_settings(&settings)?;
            server::serve(&settings.server, pipeline).await
        }
    }
}
