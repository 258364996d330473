use anyhow::Context;
use ragbot::{
    AppState, ChatEngine, Config,
    llm::{GenerationOptions, Provider},
    rag::{EmbeddingProvider, OpenAIEmbeddings},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

/// Largest accepted ingestion request body (uploads included).
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Failed to load configuration")?;

    let provider = Provider::from_model_id(&config.llm.default_model, &config.llm)?;
    tracing::info!(model = %config.llm.default_model, provider = provider.name(), "LLM provider selected");

    let options = GenerationOptions {
        model_id: config.llm.default_model.clone(),
        temperature: config.llm.temperature,
        streaming: true,
    };
    let llm: Arc<dyn ragbot::LLMClient> = provider.create_client(options)?.into();

    let embedder = build_embedder(&config)?;
    tracing::info!(model = embedder.model_name(), dims = embedder.dims(), "Embedding provider ready");

    let engine = Arc::new(ChatEngine::new(llm, embedder, &config.rag)?);
    let state = AppState::new(engine, Arc::new(config.clone()));

    let app = axum::Router::new()
        .nest("/api", ragbot::api::create_router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "ragbot server listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn build_embedder(config: &Config) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    #[cfg(feature = "local-embeddings")]
    {
        if std::env::var("LOCAL_EMBEDDINGS").is_ok() {
            let local = ragbot::rag::embeddings::LocalEmbeddings::new()?;
            return Ok(Arc::new(local));
        }
    }

    let api_key = config
        .llm
        .openai_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY required for remote embeddings"))?;

    let embedder = OpenAIEmbeddings::new(
        api_key,
        config.llm.openai_api_base.clone(),
        config.rag.embedding_model.clone(),
        config.rag.embedding_dims,
    )?;

    Ok(Arc::new(embedder))
}
