mod core;
mod features;
mod shared;

use crate::core::config::Config;
use crate::core::middleware;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::features::chat::clients::{CompletionParams, OpenAiClient};
use crate::features::chat::routes as chat_routes;
use crate::features::chat::services::StreamRelay;
use crate::features::chat::{ChatService, ChatState};
use crate::features::contact::handlers::ContactState;
use crate::features::contact::routes as contact_routes;
use crate::features::contact::{ContactService, LogContactNotifier};
use crate::features::rate_limits::routes as rate_limits_routes;
use crate::features::rate_limits::{AdmissionController, RateLimitStore};
use crate::shared::clock::SystemClock;
use crate::shared::prompts::render_chat_system_prompt;
use axum::{middleware::from_fn_with_state, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    // Admission control
    let rate_limit_store = Arc::new(RateLimitStore::new(Arc::new(SystemClock)));
    rate_limit_store.start(config.rate_limit.sweep_interval);
    let admission = Arc::new(AdmissionController::new(
        Arc::clone(&rate_limit_store),
        config.rate_limit.chat_policy(),
        config.rate_limit.contact_policy(),
    ));
    tracing::info!(
        "Rate limits: chat={}/{}s, contact={}/{}s, sweep every {:?}",
        config.rate_limit.chat_max_requests,
        config.rate_limit.chat_window_secs,
        config.rate_limit.contact_max_requests,
        config.rate_limit.contact_window_secs,
        config.rate_limit.sweep_interval
    );

    // Chat
    let provider = Arc::new(
        OpenAiClient::new(&config.llm)
            .map_err(|e| anyhow::anyhow!("Failed to build LLM client: {}", e))?,
    );
    let system_prompt = render_chat_system_prompt(&config.llm.company_name)
        .map_err(|e| anyhow::anyhow!("Failed to render system prompt: {}", e))?;
    let chat_service = Arc::new(ChatService::new(
        provider,
        Arc::clone(&admission),
        StreamRelay::new(config.llm.pacing_delay),
        CompletionParams {
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
        },
        system_prompt,
    ));
    tracing::info!("Chat service initialized with model {}", config.llm.model);

    // Contact
    let contact_service = Arc::new(ContactService::new(
        Arc::clone(&admission),
        Arc::new(LogContactNotifier),
    ));

    // Build OpenAPI document with config-driven info
    let mut openapi = ApiDoc::openapi();
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI protected with basic auth");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn_with_state(
                middleware::BasicAuthCredentials(Arc::new(credentials)),
                middleware::basic_auth_middleware,
            ))
    } else {
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Simple health check endpoint
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let api_routes = Router::new()
        .merge(chat_routes::routes(ChatState { chat_service }))
        .merge(contact_routes::routes(ContactState { contact_service }))
        .merge(rate_limits_routes::routes(Arc::clone(&admission)));

    let app = Router::new()
        .merge(swagger)
        .merge(api_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    // Long-lived event streams: detect dead peers
    let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
    socket.set_tcp_keepalive(&keepalive)?;

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    // Peer address feeds the client identifier when no forwarding headers are present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    rate_limit_store.stop();
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
