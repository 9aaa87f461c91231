use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{
        header::{CONTENT_TYPE, LAST_MODIFIED},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::core::cache::{CacheInvalidator, MemoryCache};
use crate::core::dispatcher::Dispatcher;
use crate::core::feed::{ArticleSource, FeedGenerator};
use crate::core::tags::TagTable;
use crate::core::webhook::{parse_payload, verify_secret};
use crate::error::RevalidateError;
use crate::models::{CacheTag, Config};

const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

/// 订阅依赖的缓存标签
const FEED_TAGS: &[CacheTag] = &[CacheTag::Article];

/// 处理请求共享的状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Dispatcher,
    pub cache: Arc<MemoryCache>,
    pub feed: FeedGenerator,
    pub source: Arc<dyn ArticleSource>,
}

impl AppState {
    /// 根据配置构建状态，webhook 直接失效进程内缓存
    pub fn new(config: Config, source: Arc<dyn ArticleSource>) -> Self {
        let cache = Arc::new(MemoryCache::new());
        Self::with_backend(config, source, cache.clone(), cache)
    }

    /// 使用指定的失效后端；标签表与语言配置在此构建一次
    pub fn with_backend(
        config: Config,
        source: Arc<dyn ArticleSource>,
        cache: Arc<MemoryCache>,
        backend: Arc<dyn CacheInvalidator>,
    ) -> Self {
        let dispatcher = Dispatcher::new(
            Arc::new(TagTable::standard()),
            Arc::new(config.i18n.clone()),
            backend,
        );
        let feed = FeedGenerator::new(&config);
        Self {
            config: Arc::new(config),
            dispatcher,
            cache,
            feed,
            source,
        }
    }
}

/// HTTP 服务器
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// 构建路由
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// 启动服务器
    pub async fn start(self, port: Option<u16>) -> Result<()> {
        let server = &self.state.config.server;
        let port = port.unwrap_or(server.port);
        let addr: SocketAddr = format!("{}:{}", server.host, port).parse()?;

        if self.state.config.webhook.secret.is_none() {
            warn!("WEBHOOK_SECRET is not set, all webhook calls will be rejected");
        }

        let app = self.router();
        info!("Server started at http://localhost:{}", port);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/webhook", post(webhook))
        .route("/api/:lang", get(feed))
        .route("/health", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, RevalidateError> {
    let secret = state
        .config
        .webhook
        .secret
        .as_deref()
        .ok_or(RevalidateError::Unauthorized)?;
    verify_secret(&headers, secret)?;

    let notification = parse_payload(&body)?;
    let notification = state.dispatcher.dispatch(notification)?;

    Ok(Json(json!({
        "revalidated": true,
        "typename": notification.entity_type(),
        "now": Utc::now().timestamp_millis(),
    })))
}

fn page_response(body: String, content_type: &str, modified: DateTime<Utc>) -> Response {
    let last_modified = modified.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (LAST_MODIFIED, last_modified),
        ],
        body,
    )
        .into_response()
}

async fn feed(State(state): State<AppState>, Path(lang): Path<String>) -> Response {
    if !state.config.i18n.is_supported(&lang) {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }

    let path = FeedGenerator::feed_path(&lang);
    if let Some(page) = state.cache.get(&path) {
        return page_response(page.body, page.content_type, page.stored_at);
    }

    // 读取文章前记录代数，构建期间若被失效则不写入缓存
    let seen = match state.cache.generation(&path, FEED_TAGS) {
        Ok(seen) => Some(seen),
        Err(e) => {
            warn!("Feed for {} will not be cached: {}", lang, e);
            None
        }
    };

    let source = state.source.clone();
    let limit = state.feed.limit;
    let locale = lang.clone();
    let articles =
        tokio::task::spawn_blocking(move || source.recent_articles(&locale, limit)).await;

    let articles = match articles {
        Ok(Ok(articles)) => articles,
        Ok(Err(e)) => {
            error!("Failed to load articles for {}: {:#}", lang, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
        Err(e) => {
            error!("Article loading task failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
    };

    let body = state.feed.rss(&lang, &articles);
    if let Some(seen) = seen {
        if let Err(e) =
            state
                .cache
                .insert_if_current(&path, body.clone(), RSS_CONTENT_TYPE, FEED_TAGS, &seen)
        {
            warn!("Feed for {} was not cached: {}", lang, e);
        }
    }
    page_response(body, RSS_CONTENT_TYPE, Utc::now())
}
