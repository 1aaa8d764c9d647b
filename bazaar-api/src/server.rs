use anyhow::{Context, Result};
use axum::{
    error_handling::HandleErrorLayer,
    extract::Extension,
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post, put},
    BoxError, Router,
};
use bazaar_catalog::PgCatalog;
use bazaar_core::config::ServerConfig;
use bazaar_core::MarketContext;
use std::sync::Arc;
use std::time::Duration;
use tower::timeout::{error::Elapsed, TimeoutLayer};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing;

use crate::handlers::{self, ApiState};
use crate::response::ApiError;

/// All routes with their state attached, without the transport layers.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/collections", get(handlers::list_collections))
        .route("/api/v1/ads", post(handlers::create_ad))
        .route("/api/v1/ads/get-by-owner/:owner_id", get(handlers::list_ads_by_owner))
        .route("/api/v1/ads/get-by-collection/:collection_id", get(handlers::list_ads_by_collection))
        .route("/api/v1/ads/get-detail/:id/:current_user_id", get(handlers::get_ad_detail))
        .route("/api/v1/ads/user-interaction", post(handlers::record_user_interaction))
        .route("/api/v1/ads/:ads_id/update", post(handlers::update_ad))
        .route("/api/v1/collections/:collection_id/ads/first", get(handlers::first_ad))
        .route("/api/v1/collections/:collection_id/ads/next/:position", get(handlers::next_ad))
        .route("/api/v1/collections/:collection_id/ads/previous/:position", get(handlers::previous_ad))
        .route("/api/v1/offer", post(handlers::create_offer))
        .route("/api/v1/offer/cash", post(handlers::create_cash_offer))
        .route("/api/v1/offer/goods", post(handlers::create_goods_offer))
        .route("/api/v1/offer/status-update", put(handlers::update_offer_status))
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .fallback(handlers::route_not_found)
        .layer(Extension(state))
}

/// The routes wrapped in the transport layers the server runs with.
pub fn app(state: ApiState, config: &ServerConfig) -> Router {
    with_transport(
        router(state),
        Duration::from_secs(config.request_timeout_secs),
        cors_layer(config),
    )
}

fn with_transport(routes: Router, timeout: Duration, cors: CorsLayer) -> Router {
    routes.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(HandleErrorLayer::new(handle_layer_error))
            .layer(TimeoutLayer::new(timeout)),
    )
}

async fn handle_layer_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::new(StatusCode::REQUEST_TIMEOUT, "Request timed out")
    } else {
        tracing::error!("Unhandled middleware error: {}", err);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

/// Allow the configured origins, or everything when none are configured.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    match config.cors_origins.as_deref() {
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                })
                .collect();

            // Credentials rule out wildcard methods and headers.
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
                .allow_credentials(true)
        }
        None => {
            tracing::warn!("CORS_ORIGINS not set, using permissive CORS. Set CORS_ORIGINS for production!");
            CorsLayer::permissive()
        }
    }
}

pub async fn run(ctx: MarketContext) -> Result<()> {
    let server = &ctx.config.server;
    let state = ApiState {
        catalog: Arc::new(PgCatalog::new(ctx.db_pool.clone())),
    };

    let app = app(state, server);

    let addr = format!("{}:{}", server.host, server.api_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind API server on {}", addr))?;
    tracing::info!("Starting API server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received, draining in-flight requests");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use bazaar_catalog::{AdListing, AdView, BrowseStep, BrowsedAd, Catalog};
    use bazaar_core::{Ad, AdFields, Collection, MarketResult, NewOffer, NewUserActivity, Offer, UserActivity};
    use tower::ServiceExt;

    /// Answers only the collection list, and only after a delay.
    struct SlowCatalog {
        delay: Duration,
    }

    #[async_trait]
    impl Catalog for SlowCatalog {
        async fn list_collections(&self) -> MarketResult<Vec<Collection>> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![])
        }

        async fn list_ads_by_owner(&self, _: i64) -> MarketResult<Vec<AdListing>> {
            unimplemented!()
        }

        async fn list_ads_by_collection(&self, _: i64) -> MarketResult<Vec<AdListing>> {
            unimplemented!()
        }

        async fn ad_detail(&self, _: i64, _: i64) -> MarketResult<AdView> {
            unimplemented!()
        }

        async fn browse(&self, _: i64, _: BrowseStep, _: Option<i64>) -> MarketResult<BrowsedAd> {
            unimplemented!()
        }

        async fn create_ad(&self, _: AdFields) -> MarketResult<Ad> {
            unimplemented!()
        }

        async fn update_ad(&self, _: i64, _: AdFields) -> MarketResult<Ad> {
            unimplemented!()
        }

        async fn create_offer(&self, _: NewOffer) -> MarketResult<Offer> {
            unimplemented!()
        }

        async fn update_offer_status(&self, _: i64, _: String) -> MarketResult<Offer> {
            unimplemented!()
        }

        async fn record_interaction(&self, _: NewUserActivity) -> MarketResult<UserActivity> {
            unimplemented!()
        }
    }

    fn slow_app(delay: Duration, timeout: Duration) -> Router {
        let state = ApiState {
            catalog: Arc::new(SlowCatalog { delay }),
        };
        with_transport(router(state), timeout, CorsLayer::permissive())
    }

    async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn slow_requests_time_out_with_envelope() {
        let app = slow_app(Duration::from_millis(300), Duration::from_millis(20));
        let (status, body) = send(app, Method::GET, "/api/v1/collections").await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body, serde_json::json!({"Success": false, "Message": "Request timed out"}));
    }

    #[tokio::test]
    async fn fast_requests_pass_through_transport() {
        let app = slow_app(Duration::from_millis(1), Duration::from_secs(5));
        let (status, body) = send(app, Method::GET, "/api/v1/collections").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"Success": true, "Data": []}));
    }

    #[tokio::test]
    async fn wrong_method_gets_envelope() {
        let app = slow_app(Duration::from_millis(1), Duration::from_secs(5));
        let (status, body) = send(app, Method::GET, "/api/v1/offer").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["Success"], false);
        assert_eq!(body["Message"], "Method not allowed");
    }

    #[tokio::test]
    async fn configured_app_serves_routes() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            api_port: 0,
            request_timeout_secs: 30,
            cors_origins: Some("https://market.example".into()),
        };
        let state = ApiState {
            catalog: Arc::new(SlowCatalog {
                delay: Duration::from_millis(1),
            }),
        };
        let (status, _) = send(app(state, &config), Method::GET, "/api/v1/collections").await;
        assert_eq!(status, StatusCode::OK);
    }
}
