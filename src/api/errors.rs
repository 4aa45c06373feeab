// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::ledger::LedgerError;
use crate::payments::PaymentMethodError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub request_id: Option<String>,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    NotFound(String),
    InvalidRequest(String),
    ValidationError {
        field: String,
        message: String,
    },
    Conflict(String),
    /// Business rule refused the operation; `code` is the ledger error code
    Rejected {
        code: &'static str,
        message: String,
    },
    ServiceUnavailable(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg.clone(), None),
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::Conflict(msg) => ("conflict", msg.clone(), None),
            ApiError::Rejected { code, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "code".to_string(),
                    serde_json::Value::String(code.to_string()),
                );
                ("rejected", message.clone(), Some(details))
            }
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg.clone(), None),
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            request_id,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::InvalidRequest(_) | ApiError::ValidationError { .. } => 400,
            ApiError::Conflict(_) | ApiError::Rejected { .. } => 409,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::InternalError(_) => 500,
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let message = err.user_message();
        match err {
            LedgerError::AffiliateNotFound(_) | LedgerError::CommissionNotFound(_) => {
                ApiError::NotFound(message)
            }
            LedgerError::InvalidAmount(_) => ApiError::ValidationError {
                field: "amount".to_string(),
                message,
            },
            LedgerError::InvalidRate(_) => ApiError::ValidationError {
                field: "commission_rate".to_string(),
                message,
            },
            LedgerError::InvalidThreshold(_) => ApiError::ValidationError {
                field: "threshold_target".to_string(),
                message,
            },
            LedgerError::AffiliateExists(_) => ApiError::Conflict(message),
            LedgerError::Storage(_) => ApiError::ServiceUnavailable(message),
            other => ApiError::Rejected {
                code: other.error_code(),
                message,
            },
        }
    }
}

impl From<PaymentMethodError> for ApiError {
    fn from(err: PaymentMethodError) -> Self {
        let field = match &err {
            PaymentMethodError::MissingField { field, .. } => field.to_string(),
            PaymentMethodError::InvalidEmail(_) => "email".to_string(),
            PaymentMethodError::InvalidCurrency(_) => "currency".to_string(),
            PaymentMethodError::InvalidWalletAddress { .. } => "wallet_address".to_string(),
        };
        ApiError::ValidationError {
            field,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let error_response = self.to_response(None);

        (status, Json(error_response)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Rejected { code, message } => write!(f, "Rejected ({}): {}", code, message),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}
