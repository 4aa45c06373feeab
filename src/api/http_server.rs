// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::errors::ApiError;
use super::handlers::{
    CommissionResponse, HealthResponse, PayingCustomerRequest, RecentQuery,
    RecordCommissionRequest, ReferralRequest, RegisterAffiliateRequest, ReleaseResponse,
    WithdrawalRequestBody, WithdrawalResponse,
};
use crate::ledger::{AffiliateStats, AffiliateSummary, CommissionLedger, Customer, RecentCommission};
use crate::payments::{PaymentMethod, PaymentMethodRegistry};
use crate::version::VERSION;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<CommissionLedger>,
    pub payment_methods: Arc<PaymentMethodRegistry>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/v1/affiliates",
            get(list_affiliates_handler).post(register_affiliate_handler),
        )
        .route("/v1/affiliates/:id/stats", get(stats_handler))
        .route("/v1/affiliates/:id/referrals", post(referral_handler))
        .route(
            "/v1/affiliates/:id/paying-customers",
            post(paying_customer_handler),
        )
        .route(
            "/v1/affiliates/:id/commissions",
            get(recent_commissions_handler).post(record_commission_handler),
        )
        .route(
            "/v1/affiliates/:id/commissions/:event_id/void",
            post(void_commission_handler),
        )
        .route("/v1/affiliates/:id/evaluate", post(evaluate_handler))
        .route(
            "/v1/affiliates/:id/withdrawals",
            get(list_withdrawals_handler).post(withdrawal_handler),
        )
        .route("/v1/affiliates/:id/payment-method", put(payment_method_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState, listen_addr: &str) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = listen_addr.parse::<SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Ledger API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: VERSION.to_string(),
        affiliates: state.ledger.affiliate_count().await,
    })
}

async fn list_affiliates_handler(State(state): State<AppState>) -> Json<Vec<AffiliateSummary>> {
    Json(state.ledger.list_affiliates().await)
}

async fn register_affiliate_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterAffiliateRequest>,
) -> Result<(StatusCode, Json<AffiliateSummary>), ApiError> {
    if request.affiliate_id.trim().is_empty() {
        return Err(ApiError::ValidationError {
            field: "affiliate_id".to_string(),
            message: "affiliate_id must not be empty".to_string(),
        });
    }

    let summary = state
        .ledger
        .register_affiliate(
            &request.affiliate_id,
            request.commission_rate,
            request.threshold_target,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn stats_handler(
    State(state): State<AppState>,
    Path(affiliate_id): Path<String>,
) -> Result<Json<AffiliateStats>, ApiError> {
    Ok(Json(state.ledger.get_stats(&affiliate_id).await?))
}

async fn referral_handler(
    State(state): State<AppState>,
    Path(affiliate_id): Path<String>,
    Json(request): Json<ReferralRequest>,
) -> Result<StatusCode, ApiError> {
    require_customer_id(&request.customer_id)?;

    state
        .ledger
        .register_referral(
            &affiliate_id,
            Customer {
                id: request.customer_id,
                name: request.name,
                email: request.email,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn paying_customer_handler(
    State(state): State<AppState>,
    Path(affiliate_id): Path<String>,
    Json(request): Json<PayingCustomerRequest>,
) -> Result<Json<ReleaseResponse>, ApiError> {
    require_customer_id(&request.customer_id)?;

    let released = state
        .ledger
        .mark_customer_paying(&affiliate_id, &request.customer_id)
        .await?;
    Ok(Json(ReleaseResponse { released }))
}

async fn record_commission_handler(
    State(state): State<AppState>,
    Path(affiliate_id): Path<String>,
    Json(request): Json<RecordCommissionRequest>,
) -> Result<Response, ApiError> {
    require_customer_id(&request.customer_id)?;

    let event = match (request.amount, request.payment_amount) {
        (Some(amount), None) => Some(
            state
                .ledger
                .record_commission(&affiliate_id, &request.customer_id, amount)
                .await?,
        ),
        (None, Some(payment_amount)) => {
            state
                .ledger
                .record_customer_payment(&affiliate_id, &request.customer_id, payment_amount)
                .await?
        }
        _ => {
            return Err(ApiError::InvalidRequest(
                "Provide exactly one of amount or payment_amount".to_string(),
            ))
        }
    };

    // customer counted but the payment earned nothing: 200 with a null body
    Ok(match event {
        Some(event) => (StatusCode::CREATED, Json(CommissionResponse::from(event))).into_response(),
        None => (StatusCode::OK, Json(None::<CommissionResponse>)).into_response(),
    })
}

fn require_customer_id(customer_id: &str) -> Result<(), ApiError> {
    if customer_id.trim().is_empty() {
        return Err(ApiError::ValidationError {
            field: "customer_id".to_string(),
            message: "customer_id must not be empty".to_string(),
        });
    }
    Ok(())
}

async fn recent_commissions_handler(
    State(state): State<AppState>,
    Path(affiliate_id): Path<String>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<RecentCommission>>, ApiError> {
    Ok(Json(
        state
            .ledger
            .recent_commissions(&affiliate_id, query.limit)
            .await?,
    ))
}

async fn void_commission_handler(
    State(state): State<AppState>,
    Path((affiliate_id, event_id)): Path<(String, Uuid)>,
) -> Result<Json<CommissionResponse>, ApiError> {
    let compensation = state
        .ledger
        .void_commission(&affiliate_id, event_id)
        .await?;
    Ok(Json(compensation.into()))
}

async fn evaluate_handler(
    State(state): State<AppState>,
    Path(affiliate_id): Path<String>,
) -> Result<Json<ReleaseResponse>, ApiError> {
    let released = state.ledger.evaluate_threshold(&affiliate_id).await?;
    Ok(Json(ReleaseResponse { released }))
}

async fn withdrawal_handler(
    State(state): State<AppState>,
    Path(affiliate_id): Path<String>,
    Json(request): Json<WithdrawalRequestBody>,
) -> Result<Json<WithdrawalResponse>, ApiError> {
    let receipt = state
        .ledger
        .request_withdrawal(&affiliate_id, request.amount)
        .await?;
    Ok(Json(receipt.into()))
}

async fn list_withdrawals_handler(
    State(state): State<AppState>,
    Path(affiliate_id): Path<String>,
) -> Result<Json<Vec<WithdrawalResponse>>, ApiError> {
    let receipts = state.ledger.withdrawals(&affiliate_id).await?;
    Ok(Json(receipts.into_iter().map(Into::into).collect()))
}

async fn payment_method_handler(
    State(state): State<AppState>,
    Path(affiliate_id): Path<String>,
    Json(method): Json<PaymentMethod>,
) -> Result<Json<PaymentMethod>, ApiError> {
    if !state.ledger.contains(&affiliate_id).await {
        return Err(ApiError::NotFound(format!(
            "Affiliate not found: {}",
            affiliate_id
        )));
    }

    state
        .payment_methods
        .upsert(&affiliate_id, method.clone())
        .await?;
    Ok(Json(method))
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.ledger.metrics().export() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => ApiError::InternalError(e.to_string()).into_response(),
    }
}
