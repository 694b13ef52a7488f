use anyhow::Context;
use bq_oauth_agent::{AppConfig, GeminiModel, SessionState, app};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MODEL_NAME: &str = "gemini-2.5-flash";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    if config.running_in_gcp {
        info!("running in a managed Google Cloud environment; OAuth handled by the platform");
    } else {
        info!("running locally; tokens will be minted from application default credentials");
    }

    let api_key =
        std::env::var("GOOGLE_API_KEY").context("GOOGLE_API_KEY environment variable not set")?;
    let model = Arc::new(GeminiModel::new(api_key, MODEL_NAME));

    let agent_app = app::build(&config, model).await?;
    let root_agent = agent_app.root_agent;

    let session = SessionState::new();
    let mut rl = rustyline::DefaultEditor::new()?;

    println!("BigQuery OAuth Agent");
    println!("Agent: {}", root_agent.name());
    println!("Type your message and press Enter. Ctrl+C to exit.\n");

    loop {
        match rl.readline("User -> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                // Turn boundary: transient state does not outlive one chain.
                session.clear_temp();

                match root_agent.run(&session, line).await {
                    Ok(reply) => println!("\nAgent -> {reply}\n"),
                    Err(e) => eprintln!("\nError: {e}\n"),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    Ok(())
}
