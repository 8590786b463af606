use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Query, State, rejection::JsonRejection},
    http::HeaderValue,
    response::Json,
    routing::{get, post},
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{
    config::{Config, SecurityConfig},
    errors::{AppError, AppResult},
    feeds::{MarketFeed, NewsFeed, NewsTicker},
    gateway::{AIGateway, Reply},
    middleware::request_context_middleware,
    normalize::{NEWS_PLACEHOLDER, WeatherSummary},
    providers::build_provider,
    validate::{ChatBody, PromptRequest},
};

/// Dashboard city used when the query does not name one.
const DEFAULT_CITY: &str = "Kashmir";

/// 应用程序状态 - 在所有请求处理器之间共享
///
/// 包含请求处理器所需的所有共享资源，
/// 包括配置、AI网关和两个数据源
#[derive(Clone)]
pub struct AppState {
    /// 应用程序配置（只读共享）
    pub config: Arc<Config>,
    /// AI网关，封装提供商调用和降级逻辑
    pub gateway: Arc<AIGateway>,
    /// 新闻数据源
    pub news: Arc<NewsFeed>,
    /// 市场行情数据源
    pub market: Arc<MarketFeed>,
}

impl AppState {
    /// Create new application state from configuration
    pub fn new(config: Config) -> AppResult<Self> {
        // Create HTTP client with connection pooling
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.server.request_timeout_seconds))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        // Build the configured provider and wrap it in the gateway
        let provider = build_provider(&config, http_client.clone())?;
        let gateway = Arc::new(AIGateway::new(provider));

        let news = Arc::new(NewsFeed::new(config.news.clone(), http_client.clone()));
        let market = Arc::new(MarketFeed::new(config.market.clone(), http_client));

        Ok(Self {
            config: Arc::new(config),
            gateway,
            news,
            market,
        })
    }
}

/// Create the main application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);
    let body_limit = DefaultBodyLimit::max(state.config.server.max_request_size_bytes);

    let router = Router::new()
        // Farmer-facing endpoints
        .route("/api/chat", post(chat_handler))
        .route("/api/weather", get(weather_handler))
        .route("/api/news", get(news_handler))
        .route("/api/market", get(market_handler))
        // Health check endpoint
        .route("/health", get(health_handler))
        // A wrong method on a known route still answers JSON
        .method_not_allowed_fallback(method_not_allowed_handler)
        // Add shared state
        .with_state(state)
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_context_middleware)),
        )
        .layer(body_limit);

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.cors_enabled {
        return None;
    }

    let layer = if security.allowed_origins.is_empty()
        || security.allowed_origins.iter().any(|origin| origin == "*")
    {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = security
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Some(layer)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> AppResult<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let app_state = AppState::new(config)?;
    let provider_name = app_state.gateway.provider_name();

    // Create router
    let app = create_app(app_state);

    // Create listener
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::ConfigError(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Kisan gateway starting on {} (provider: {})", addr, provider_name);
    tracing::info!("Available endpoints:");
    tracing::info!("  POST /api/chat - Chat, expert advice and crop diagnosis");
    tracing::info!("  GET  /api/weather - District weather summary");
    tracing::info!("  GET  /api/news - Agricultural news ticker");
    tracing::info!("  GET  /api/market - Mandi price records");
    tracing::info!("  GET  /health - System health check");

    // Start server
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Server error: {}", e)))?;

    Ok(())
}

// Request Handlers

/// Handle chat, expert advice and crop diagnosis requests
async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> AppResult<Json<Reply>> {
    // A body that is not valid JSON still gets a JSON error reply
    let Json(body) = payload.map_err(|rejection| {
        AppError::invalid_input(format!("Malformed request body: {}", rejection.body_text()))
    })?;

    // Configuration gate runs before field validation and before any dispatch
    state.gateway.ensure_configured()?;

    let request = PromptRequest::from_body(body)?;
    tracing::info!(kind = %request.kind, language = %request.language, "Processing chat request");

    let dispatch = state.gateway.dispatch(&request).await;

    Ok(Json(dispatch.reply))
}

#[derive(Deserialize, Debug)]
struct WeatherParams {
    city: Option<String>,
}

/// Handle district weather requests; always answers 200
async fn weather_handler(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Json<WeatherSummary> {
    let city = params
        .city
        .as_deref()
        .map(str::trim)
        .filter(|city| !city.is_empty())
        .unwrap_or(DEFAULT_CITY)
        .to_string();

    let (summary, _) = state.gateway.district_weather(&city).await;
    Json(summary)
}

#[derive(Deserialize, Debug)]
struct NewsParams {
    category: Option<String>,
}

/// Handle news ticker requests; degrades to a placeholder line
async fn news_handler(
    State(state): State<AppState>,
    Query(params): Query<NewsParams>,
) -> AppResult<Json<NewsTicker>> {
    let category = normalize_category(params.category.as_deref());

    // A missing key is a configuration error; everything past it degrades
    state.news.ensure_configured()?;

    let text = match state.news.ticker(&category).await {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => NEWS_PLACEHOLDER.to_string(),
        Err(err) => {
            tracing::warn!(category = %category, error = %err, "News feed failed, serving placeholder");
            NEWS_PLACEHOLDER.to_string()
        }
    };

    Ok(Json(NewsTicker { category, text }))
}

/// Known ticker categories; anything else reads as the default feed.
fn normalize_category(raw: Option<&str>) -> String {
    match raw.map(str::trim).map(str::to_lowercase).as_deref() {
        Some("kashmir") => "kashmir".to_string(),
        Some("sports") => "sports".to_string(),
        _ => "latest".to_string(),
    }
}

/// Handle mandi price requests; fails closed on upstream errors
async fn market_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.market.ensure_configured()?;

    let records = state.market.latest_prices().await?;
    Ok(Json(records))
}

/// Handle system health check
async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "kisan-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.gateway.provider_name(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// JSON 405 for known routes called with the wrong method
async fn method_not_allowed_handler() -> AppError {
    AppError::MethodNotAllowed
}
