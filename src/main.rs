use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod clock;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod response;
mod services;
mod store;
mod watch;
mod wellness;

use clock::Clock;
use config::Config;
use watch::WatchApi;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
    pub watch: Arc<dyn WatchApi>,
    pub http: reqwest::Client,
}

fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    let protected_routes = Router::new()
        // Wellness entries
        .route("/api/wellness/add", post(handlers::wellness::add_entry))
        .route(
            "/api/wellness/dashboard",
            get(handlers::wellness::dashboard),
        )
        .route("/api/wellness/history", get(handlers::wellness::history))
        // Goals
        .route("/api/wellness/goals", post(handlers::wellness::create_goal))
        .route("/api/wellness/goals", get(handlers::wellness::list_goals))
        // Alerts
        .route(
            "/api/wellness/alerts/:id/read",
            put(handlers::wellness::mark_alert_read),
        )
        // Smartwatch
        .route("/api/watch/connect/:provider", post(handlers::watch::connect))
        .route("/api/watch/sync", post(handlers::watch::sync))
        .route("/api/watch/status", get(handlers::watch::status))
        .route("/api/watch/disconnect", post(handlers::watch::disconnect))
        // AI assistant
        .route("/api/ai/chat", post(handlers::ai::chat))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = vec![state
            .config
            .frontend_url
            .parse::<axum::http::HeaderValue>()
            .unwrap()];
        // In dev, also allow LAN access (e.g. testing from another device)
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "manasfit_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    // Database
    let db = db::create_pool(&config.database_url).await;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let watch_api =
        watch::HttpWatchApi::new(config.clone()).expect("Failed to build provider HTTP client");
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.provider_timeout_secs))
        .build()
        .expect("Failed to build HTTP client");

    let state = AppState {
        db,
        config: config.clone(),
        clock: Arc::new(clock::SystemClock),
        watch: Arc::new(watch_api),
        http,
    };

    let app = router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{NaiveDate, TimeZone, Utc};
    use http_body_util::BodyExt;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::clock::FixedClock;
    use crate::models::connection::Provider;
    use crate::watch::{DailySummary, TokenGrant, WatchError};

    struct StubWatch;

    #[async_trait::async_trait]
    impl WatchApi for StubWatch {
        async fn exchange_code(
            &self,
            provider: Provider,
            _code: &str,
        ) -> Result<TokenGrant, WatchError> {
            Err(WatchError::Unsupported(provider))
        }

        async fn daily_summary(
            &self,
            _provider: Provider,
            _access_token: &str,
            _date: NaiveDate,
        ) -> Result<DailySummary, WatchError> {
            Ok(DailySummary {
                steps: 0,
                sleep_hours: 0.0,
                heart_rate: None,
            })
        }
    }

    fn test_state() -> AppState {
        let db = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let config = Arc::new(Config {
            database_url: "postgres://localhost/unused".into(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            jwt_secret: "test-secret".into(),
            fitbit_client_id: String::new(),
            fitbit_client_secret: String::new(),
            groq_api_key: String::new(),
            groq_model: "llama3-8b-8192".into(),
            provider_timeout_secs: 1,
        });
        AppState {
            db,
            config,
            clock: Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            )),
            watch: Arc::new(StubWatch),
            http: reqwest::Client::new(),
        }
    }

    #[tokio::test]
    async fn health_check_is_public() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::get("/api/wellness/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], false);
    }

    #[tokio::test]
    async fn garbage_bearer_token_is_rejected() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::post("/api/wellness/add")
                    .header("authorization", "Bearer not-a-jwt")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_routes_are_404() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
