use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use humility_survey::cli::Cli;
use humility_survey::config::{Interface, SurveyConfig};
use humility_survey::conversation::Collaborators;
use humility_survey::llm::create_provider;
use humility_survey::routes::{AppState, survey_routes};
use humility_survey::session::{Session, SessionStore, spawn_prune_task};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config = SurveyConfig::from_env().context("invalid configuration")?;

    // Initialize tracing; keep the appender guard alive until exit
    let (file_layer, _log_guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "humility-survey.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    let collaborators = match &config.llm {
        Some(llm_config) => {
            let llm = create_provider(llm_config)?;
            Some(Collaborators::from_llm(llm, llm_config.temperature))
        }
        None => None,
    };

    eprintln!("🧭 Humility Survey v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Mode: {}", config.mode);
    if let Some(llm) = &config.llm {
        eprintln!("   Model: {} ({})", llm.model, llm.base_url);
    }

    match config.interface {
        Interface::Cli => {
            eprintln!("   Type /help for commands, /quit to exit.");
            let session =
                Session::for_mode(config.mode, &config.conversation, collaborators.as_ref())?;
            Cli::new(session).run().await?;
        }
        Interface::Http => {
            let store = SessionStore::new();
            let _prune_handle = spawn_prune_task(Arc::clone(&store), config.session_idle_timeout);

            let app = survey_routes(AppState {
                store,
                mode: config.mode,
                conversation: config.conversation.clone(),
                collaborators,
            });

            let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
                .await
                .with_context(|| format!("failed to bind port {}", config.port))?;
            eprintln!("   API: http://0.0.0.0:{}/api/sessions", config.port);
            tracing::info!(port = config.port, mode = %config.mode, "Survey server started");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
