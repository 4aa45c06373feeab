// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Route tests for the ledger HTTP API
//!
//! Every test drives the router in-process with `oneshot`, so no socket is
//! bound and each test owns a fresh in-memory ledger.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use commission_ledger::{
    api::{create_router, AppState},
    config::LedgerConfig,
    ledger::{CommissionLedger, MemoryStore},
    monitoring::LedgerMetrics,
    payments::PaymentMethodRegistry,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

async fn setup_router() -> Router {
    let payment_methods = Arc::new(PaymentMethodRegistry::new());
    let ledger = CommissionLedger::open(
        LedgerConfig::default(),
        Arc::new(MemoryStore::new()),
        payment_methods.clone(),
        Arc::new(LedgerMetrics::new().expect("metrics")),
    )
    .await
    .expect("Failed to open ledger");

    create_router(AppState {
        ledger: Arc::new(ledger),
        payment_methods,
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &Router, affiliate_id: &str, threshold: u32) {
    let (status, _) = send(
        app,
        Method::POST,
        "/v1/affiliates",
        Some(json!({ "affiliate_id": affiliate_id, "threshold_target": threshold })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn record(app: &Router, affiliate_id: &str, customer_id: &str, amount: f64) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        &format!("/v1/affiliates/{}/commissions", affiliate_id),
        Some(json!({ "customer_id": customer_id, "amount": amount })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "record failed: {}", body);
    body
}

#[cfg(test)]
mod http_route_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_affiliate_count() {
        let app = setup_router().await;
        register(&app, "aff-1", 10).await;

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["affiliates"], 1);
    }

    #[tokio::test]
    async fn test_stats_shape_matches_dashboard_contract() {
        let app = setup_router().await;
        register(&app, "aff-1", 10).await;
        record(&app, "aff-1", "c1", 50.0).await;

        let (status, body) = send(&app, Method::GET, "/v1/affiliates/aff-1/stats", None).await;
        assert_eq!(status, StatusCode::OK);

        let fields = body.as_object().unwrap();
        for key in [
            "paid_customers_count",
            "threshold_target",
            "commission_balance",
            "pending_commission",
            "total_earned",
            "commission_rate",
            "can_withdraw",
        ] {
            assert!(fields.contains_key(key), "missing {}", key);
        }
        assert_eq!(fields.len(), 7);
        assert_eq!(body["paid_customers_count"], 1);
        assert_eq!(body["pending_commission"].as_f64(), Some(50.0));
        assert_eq!(body["commission_balance"].as_f64(), Some(0.0));
        assert_eq!(body["commission_rate"].as_f64(), Some(10.0));
        assert_eq!(body["can_withdraw"], false);
    }

    #[tokio::test]
    async fn test_unknown_affiliate_is_404() {
        let app = setup_router().await;
        let (status, body) = send(&app, Method::GET, "/v1/affiliates/ghost/stats", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_type"], "not_found");
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let app = setup_router().await;
        register(&app, "aff-1", 10).await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/affiliates",
            Some(json!({ "affiliate_id": "aff-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_commission_requires_exactly_one_value() {
        let app = setup_router().await;
        register(&app, "aff-1", 10).await;

        for body in [
            json!({ "customer_id": "c1" }),
            json!({ "customer_id": "c1", "amount": 5, "payment_amount": 50 }),
        ] {
            let (status, _) = send(
                &app,
                Method::POST,
                "/v1/affiliates/aff-1/commissions",
                Some(body),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_payment_amount_uses_affiliate_rate() {
        let app = setup_router().await;
        register(&app, "aff-1", 10).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/affiliates/aff-1/commissions",
            Some(json!({ "customer_id": "c1", "payment_amount": 250 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["amount"].as_f64(), Some(25.0));
        assert_eq!(body["status"], "pending");
    }

    #[tokio::test]
    async fn test_withdrawal_flow() {
        let app = setup_router().await;
        register(&app, "aff-1", 2).await;
        record(&app, "aff-1", "c1", 20.0).await;
        record(&app, "aff-1", "c2", 30.0).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/affiliates/aff-1/withdrawals",
            Some(json!({ "amount": 1000 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["details"]["code"], "INSUFFICIENT_BALANCE");

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/affiliates/aff-1/withdrawals",
            Some(json!({ "amount": 20 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["paid_amount"].as_f64(), Some(20.0));

        let (_, stats) = send(&app, Method::GET, "/v1/affiliates/aff-1/stats", None).await;
        assert_eq!(stats["commission_balance"].as_f64(), Some(30.0));

        let (status, history) =
            send(&app, Method::GET, "/v1/affiliates/aff-1/withdrawals", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ineligible_withdrawal_is_rejected() {
        let app = setup_router().await;
        register(&app, "aff-1", 10).await;
        record(&app, "aff-1", "c1", 20.0).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/affiliates/aff-1/withdrawals",
            Some(json!({ "amount": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["details"]["code"], "AFFILIATE_NOT_ELIGIBLE");
    }

    #[tokio::test]
    async fn test_recent_commissions_limit_query() {
        let app = setup_router().await;
        register(&app, "aff-1", 10).await;
        for i in 0..4 {
            record(&app, "aff-1", &format!("c{}", i), 1.0).await;
        }

        let (status, body) = send(
            &app,
            Method::GET,
            "/v1/affiliates/aff-1/commissions?limit=2",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_payment_method_validation() {
        let app = setup_router().await;

        let method = json!({ "method_type": "paypal", "email": "payouts@example.com" });
        let (status, _) = send(
            &app,
            Method::PUT,
            "/v1/affiliates/ghost/payment-method",
            Some(method.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        register(&app, "aff-1", 10).await;
        let (status, body) = send(
            &app,
            Method::PUT,
            "/v1/affiliates/aff-1/payment-method",
            Some(method),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["method_type"], "paypal");

        let (status, _) = send(
            &app,
            Method::PUT,
            "/v1/affiliates/aff-1/payment-method",
            Some(json!({ "method_type": "paypal", "email": "not-an-email" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_exports_counters() {
        let app = setup_router().await;
        register(&app, "aff-1", 1).await;
        record(&app, "aff-1", "c1", 5.0).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("commission_ledger_commissions_recorded_total"));
    }

    #[tokio::test]
    async fn test_empty_customer_id_is_rejected() {
        let app = setup_router().await;
        register(&app, "aff-1", 1).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/affiliates/aff-1/paying-customers",
            Some(json!({ "customer_id": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], "customer_id");

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/affiliates/aff-1/commissions",
            Some(json!({ "customer_id": "", "amount": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, stats) = send(&app, Method::GET, "/v1/affiliates/aff-1/stats", None).await;
        assert_eq!(stats["paid_customers_count"], 0);
        assert_eq!(stats["total_earned"].as_f64(), Some(0.0));
    }

    #[tokio::test]
    async fn test_sub_cent_payment_counts_customer_without_commission() {
        let app = setup_router().await;
        register(&app, "aff-1", 10).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/affiliates/aff-1/commissions",
            Some(json!({ "customer_id": "c1", "payment_amount": "0.04" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());

        let (_, stats) = send(&app, Method::GET, "/v1/affiliates/aff-1/stats", None).await;
        assert_eq!(stats["paid_customers_count"], 1);
        assert_eq!(stats["total_earned"].as_f64(), Some(0.0));
    }
}
