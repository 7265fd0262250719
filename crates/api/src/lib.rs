//! Telemetry Dashboard API Server
//!
//! Serves time-bounded sensor readings and the dashboard's static assets.

use axum::{
    extract::State,
    http::HeaderName,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use data_validator::{RangePolicy, RangeValidator};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use storage::{QueryExecutor, RangeQueryExecutor, SqliteExecutor};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

pub mod config;
pub mod error;
pub mod identity;
mod routes;

pub use crate::config::{ConfigError, LogFormat, ServiceConfig};
pub use crate::error::ApiError;
pub use crate::identity::CallerIdentity;

/// Application state shared across handlers
pub struct AppState {
    /// Validator for requested ranges
    pub validator: RangeValidator,
    /// Range query executor
    pub readings: RangeQueryExecutor,
    /// Header carrying the caller email
    pub identity_header: HeaderName,
    /// Dashboard asset directory
    pub static_dir: PathBuf,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create application state over the given query executor
    pub fn new(
        config: &ServiceConfig,
        executor: Arc<dyn QueryExecutor>,
    ) -> Result<Self, ConfigError> {
        let identity_header = HeaderName::from_str(&config.identity_header)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(Self {
            validator: RangeValidator::new(RangePolicy {
                max_span_ms: config.max_range_ms,
            }),
            readings: RangeQueryExecutor::new(
                executor,
                config.table.clone(),
                config.query_timeout(),
            ),
            identity_header,
            static_dir: PathBuf::from(&config.static_dir),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        })
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/range-readings", get(routes::readings::get_range_readings))
        .route("/api/iot-data", get(routes::iot_data::get_iot_data))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Initialize logging
pub fn init_logging(config: &ServiceConfig) -> Result<(), ConfigError> {
    let level = config.level()?;
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true);

    let result = match config.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| ConfigError::Invalid(format!("logging: {}", e)))
}

/// Run the server until interrupted
pub async fn run_server(config: ServiceConfig) -> anyhow::Result<()> {
    if let Some(addr) = config.metrics_socket()? {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        info!("Prometheus metrics on {}", addr);
    }

    let executor = SqliteExecutor::connect(&config.database_url, config.max_connections).await?;
    let state = Arc::new(AppState::new(&config, Arc::new(executor))?);
    let app = create_router(state);

    let addr = config.bind_addr();
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::DateTime;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use storage::{ParameterizedQuery, Reading, StorageError};
    use tower::ServiceExt;

    enum Mode {
        Rows(usize),
        Fail,
        Stall,
    }

    /// Query executor double that records what it was asked
    pub struct StubExecutor {
        mode: Mode,
        pub calls: AtomicUsize,
        last: Mutex<Option<ParameterizedQuery>>,
    }

    impl StubExecutor {
        fn new(mode: Mode) -> Arc<Self> {
            Arc::new(Self {
                mode,
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            })
        }

        pub fn with_rows(count: usize) -> Arc<Self> {
            Self::new(Mode::Rows(count))
        }

        pub fn failing() -> Arc<Self> {
            Self::new(Mode::Fail)
        }

        pub fn stalled() -> Arc<Self> {
            Self::new(Mode::Stall)
        }

        pub fn last_query(&self) -> Option<ParameterizedQuery> {
            self.last.lock().unwrap().clone()
        }
    }

    #[axum::async_trait]
    impl QueryExecutor for StubExecutor {
        async fn execute(&self, query: &ParameterizedQuery) -> Result<Vec<Reading>, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(query.clone());

            match self.mode {
                Mode::Rows(count) => Ok((0..count)
                    .map(|i| Reading {
                        timestamp: DateTime::from_timestamp(1_700_000_000 + i as i64 * 60, 0)
                            .unwrap(),
                        humidity: 50.0 + i as f64,
                        temperature: 20.0 + i as f64,
                    })
                    .collect()),
                Mode::Fail => Err(StorageError::DatabaseError(
                    "no such table: main.sensor_readings".to_string(),
                )),
                Mode::Stall => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    pub fn test_config() -> ServiceConfig {
        ServiceConfig::from_builder(ServiceConfig::defaults().unwrap()).unwrap()
    }

    pub fn app_with(executor: Arc<dyn QueryExecutor>) -> Router {
        let state = AppState::new(&test_config(), executor).unwrap();
        create_router(Arc::new(state))
    }

    /// Router over an in-memory SQLite store holding `rows`
    pub async fn app_with_sqlite(rows: &[(i64, f64, f64)]) -> Router {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE sensor_readings \
             (timestamp INTEGER NOT NULL, humidity REAL NOT NULL, temperature REAL NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        for (timestamp, humidity, temperature) in rows {
            sqlx::query("INSERT INTO sensor_readings VALUES (?, ?, ?)")
                .bind(*timestamp)
                .bind(*humidity)
                .bind(*temperature)
                .execute(&pool)
                .await
                .unwrap();
        }
        app_with(Arc::new(SqliteExecutor::from_pool(pool)))
    }

    /// Issue a GET and decode the JSON body
    pub async fn get(
        app: Router,
        uri: &str,
        identity: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().uri(uri);
        if let Some(identity) = identity {
            request = request.header("x-goog-authenticated-user-email", identity);
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}
