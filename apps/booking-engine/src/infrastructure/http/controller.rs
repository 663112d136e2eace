//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to the trade service. Authentication
//! lives outside this system; the acting identity arrives in the
//! `x-acting-user` header and falls back to `system` when absent.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::application::ports::{AuditRecorder, SequenceAllocator, TradeStore};
use crate::application::services::{TradeFilter, TradeService};
use crate::domain::trade::{TradeDraft, TradeUpdate};

use super::request::ListTradesQuery;
use super::response::{ApiError, HealthResponse};

/// Header carrying the acting identity.
const ACTING_USER_HEADER: &str = "x-acting-user";

/// Fallback identity when the header is absent.
const DEFAULT_ACTING_USER: &str = "system";

/// Application state shared across handlers.
pub struct AppState<A, S, R>
where
    A: SequenceAllocator,
    S: TradeStore,
    R: AuditRecorder,
{
    /// The trade service all handlers delegate to.
    pub service: Arc<TradeService<A, S, R>>,
    /// Application version reported by the health endpoint.
    pub version: String,
}

impl<A, S, R> Clone for AppState<A, S, R>
where
    A: SequenceAllocator,
    S: TradeStore,
    R: AuditRecorder,
{
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            version: self.version.clone(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router<A, S, R>(state: AppState<A, S, R>) -> Router
where
    A: SequenceAllocator + 'static,
    S: TradeStore + 'static,
    R: AuditRecorder + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/api/trades", post(record_trade).get(list_trades))
        .route("/api/trades/{id}", get(get_trade).put(update_trade))
        .route("/api/trades/{id}/audit", get(get_audit_history))
        .with_state(state)
}

/// Acting identity from the request headers.
fn acting_user(headers: &HeaderMap) -> String {
    headers
        .get(ACTING_USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_ACTING_USER)
        .to_string()
}

/// Health check endpoint.
async fn health_check<A, S, R>(State(state): State<AppState<A, S, R>>) -> impl IntoResponse
where
    A: SequenceAllocator,
    S: TradeStore,
    R: AuditRecorder,
{
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

/// Book a new trade.
async fn record_trade<A, S, R>(
    State(state): State<AppState<A, S, R>>,
    headers: HeaderMap,
    Json(draft): Json<TradeDraft>,
) -> Result<impl IntoResponse, ApiError>
where
    A: SequenceAllocator,
    S: TradeStore,
    R: AuditRecorder,
{
    let user = acting_user(&headers);
    let trade = state.service.record_trade(draft, &user).await?;
    Ok((StatusCode::CREATED, Json(trade)))
}

/// Fetch a trade by id.
async fn get_trade<A, S, R>(
    State(state): State<AppState<A, S, R>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
    A: SequenceAllocator,
    S: TradeStore,
    R: AuditRecorder,
{
    let trade = state.service.find_by_id(id).await?;
    Ok(Json(trade))
}

/// List trades, optionally filtered by date range or status.
async fn list_trades<A, S, R>(
    State(state): State<AppState<A, S, R>>,
    Query(query): Query<ListTradesQuery>,
) -> Result<impl IntoResponse, ApiError>
where
    A: SequenceAllocator,
    S: TradeStore,
    R: AuditRecorder,
{
    let filter = TradeFilter {
        date_range: match (query.start_date, query.end_date) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        },
        status: query.status,
    };
    let trades = state.service.list_trades(filter).await?;
    Ok(Json(trades))
}

/// Apply a partial update to a trade.
async fn update_trade<A, S, R>(
    State(state): State<AppState<A, S, R>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(update): Json<TradeUpdate>,
) -> Result<impl IntoResponse, ApiError>
where
    A: SequenceAllocator,
    S: TradeStore,
    R: AuditRecorder,
{
    let user = acting_user(&headers);
    let trade = state.service.update_trade(id, update, &user).await?;
    Ok(Json(trade))
}

/// Full audit history for a trade, most-recent-first.
async fn get_audit_history<A, S, R>(
    State(state): State<AppState<A, S, R>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
    A: SequenceAllocator,
    S: TradeStore,
    R: AuditRecorder,
{
    let history = state.service.audit_history(id).await?;
    Ok(Json(history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::validation::TradeLimits;
    use crate::infrastructure::persistence::InMemoryStore;
    use axum::body::Body;
    use axum::http::{HeaderValue, Request};
    use chrono::{Duration, Utc};
    use serde_json::json;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let store = Arc::new(InMemoryStore::new());
        let service = Arc::new(TradeService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            store,
            TradeLimits::default(),
        ));
        create_router(AppState {
            service,
            version: "0.0.0-test".to_string(),
        })
    }

    fn draft_body() -> String {
        let today = Utc::now().date_naive();
        json!({
            "trade_date": today,
            "value_date": today + Duration::days(2),
            "direction": "BUY",
            "base_currency": "EUR",
            "quote_currency": "USD",
            "base_amount": "1000000.00",
            "exchange_rate": "1.085000",
            "counterparty": "ACME Bank"
        })
        .to_string()
    }

    #[test]
    fn acting_user_defaults_to_system() {
        let headers = HeaderMap::new();
        assert_eq!(acting_user(&headers), "system");
    }

    #[test]
    fn acting_user_reads_header() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTING_USER_HEADER, HeaderValue::from_static("jsmith"));
        assert_eq!(acting_user(&headers), "jsmith");
    }

    #[test]
    fn blank_acting_user_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTING_USER_HEADER, HeaderValue::from_static("   "));
        assert_eq!(acting_user(&headers), "system");
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn booking_returns_created_with_reference() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/trades")
                    .header("content-type", "application/json")
                    .header(ACTING_USER_HEADER, "jsmith")
                    .body(Body::from(draft_body()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let trade: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(trade["trade_reference"]
            .as_str()
            .unwrap()
            .starts_with("FX-"));
        assert_eq!(trade["quote_amount"], "1085000.0000");
        assert_eq!(trade["created_by"], "jsmith");
    }

    #[tokio::test]
    async fn invalid_draft_returns_bad_request() {
        let app = test_router();
        let today = Utc::now().date_naive();
        let body = json!({
            "trade_date": today,
            "value_date": today - Duration::days(1),
            "direction": "BUY",
            "base_currency": "EUR",
            "quote_currency": "USD",
            "base_amount": "-5",
            "exchange_rate": "1.085000"
        })
        .to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/trades")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(error["error"], "validation_failed");
        assert!(!error["violations"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_trade_returns_not_found() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/trades/999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn audit_of_unknown_trade_is_an_empty_list() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/trades/999/audit")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let history: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(history.as_array().unwrap().len(), 0);
    }
}
