//! Tabletale Engine - runs one story with the built-in policy.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tabletale_engine::infrastructure::config::EngineConfig;
use tabletale_engine::runner::StopReason;
use tabletale_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabletale_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env();
    tracing::info!(story = %config.story_dir.display(), "Starting Tabletale Engine");

    let app = App::from_config(&config)?;
    println!("== {} ==", app.title);

    let summary = app.runner.run().await;
    for turn in &summary.turns {
        for result in &turn.results {
            for line in &result.narration {
                println!("[round {}] {}: {}", turn.round, turn.actor, line);
            }
        }
    }

    match &summary.stop {
        StopReason::Ending { .. } => {}
        StopReason::ObjectivesResolved => println!("Every objective is resolved."),
        StopReason::NoHostiles => println!("No hostiles remain."),
        StopReason::MaxRounds => println!("Stopped after {} rounds.", summary.rounds),
        StopReason::NoActors => println!("Nobody is left to act."),
    }
    if let Some(verdict) = &summary.verdict {
        println!("Ending: {}", serde_json::to_string_pretty(verdict)?);
    }
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
