use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use bichat_core::config::BichatConfig;
use bichat_coordinator::{ConversationCoordinator, KeywordRuleResponder};
use bichat_knowledge::KnowledgeStore;
use bichat_translate::cascade::timeout_from_secs;
use bichat_translate::{LibreEndpoint, ModelFallbackProvider, TranslationCascade};

mod app;
mod broker;
mod http;
mod sink;
mod ws;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bichat_gateway=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit path > BICHAT_CONFIG env > ~/.bichat/bichat.toml
    let config_path = std::env::var("BICHAT_CONFIG").ok();
    let config = BichatConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("config load failed ({}), using defaults", e);
        BichatConfig::default()
    });

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let knowledge = Arc::new(KnowledgeStore::open(&config.database.path)?);
    let translate = Arc::new(build_cascade(&config));
    let broker = Arc::new(broker::Broker::new());

    let coordinator = ConversationCoordinator::new(
        config.chat.clone(),
        knowledge,
        translate,
        Arc::new(KeywordRuleResponder),
        Arc::new(sink::BrokerSink::new(broker.clone())),
    );

    let state = Arc::new(app::AppState::new(config, broker, coordinator));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("bichat gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn build_cascade(config: &BichatConfig) -> TranslationCascade {
    let timeout = timeout_from_secs(config.translation.timeout_sec);

    let providers: Vec<Box<dyn bichat_translate::TranslationProvider>> = config
        .translation
        .libre_endpoints
        .iter()
        .map(|url| Box::new(LibreEndpoint::new(url.clone(), timeout)) as Box<dyn bichat_translate::TranslationProvider>)
        .collect();

    let detectors: Vec<Box<dyn bichat_translate::LanguageDetector>> = config
        .translation
        .libre_detect_endpoints
        .iter()
        .map(|url| Box::new(LibreEndpoint::new(url.clone(), timeout)) as Box<dyn bichat_translate::LanguageDetector>)
        .collect();

    let model_fallback = config.translation.llm_base_url.as_ref().map(|base_url| {
        Box::new(ModelFallbackProvider::new(
            base_url.clone(),
            config.translation.llm_api_key.clone(),
            config.translation.llm_model.clone(),
            timeout,
        )) as Box<dyn bichat_translate::TranslationProvider>
    });

    TranslationCascade::new(config.translation.enabled, providers, detectors, model_fallback)
}
