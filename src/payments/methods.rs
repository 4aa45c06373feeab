// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where an affiliate wants withdrawals sent, tagged by `method_type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method_type", rename_all = "snake_case")]
pub enum PaymentMethod {
    Bank {
        account_holder: String,
        bank_name: String,
        account_number: String,
        /// Routing number, sort code or IBAN depending on the bank's country
        routing_number: String,
    },
    Paypal {
        email: String,
    },
    Crypto {
        network: String,
        wallet_address: String,
    },
    Wise {
        email: String,
        currency: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethodError {
    #[error("Missing required field '{field}' for {method_type} payment method")]
    MissingField {
        method_type: &'static str,
        field: &'static str,
    },

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid currency code: {0} (expected 3-letter ISO code)")]
    InvalidCurrency(String),

    #[error("Invalid wallet address for network {network}: {address}")]
    InvalidWalletAddress { network: String, address: String },
}

impl PaymentMethod {
    pub fn method_type(&self) -> &'static str {
        match self {
            PaymentMethod::Bank { .. } => "bank",
            PaymentMethod::Paypal { .. } => "paypal",
            PaymentMethod::Crypto { .. } => "crypto",
            PaymentMethod::Wise { .. } => "wise",
        }
    }

    pub fn validate(&self) -> Result<(), PaymentMethodError> {
        let method_type = self.method_type();
        let require = |field: &'static str, value: &str| {
            if value.trim().is_empty() {
                Err(PaymentMethodError::MissingField { method_type, field })
            } else {
                Ok(())
            }
        };

        match self {
            PaymentMethod::Bank {
                account_holder,
                bank_name,
                account_number,
                routing_number,
            } => {
                require("account_holder", account_holder)?;
                require("bank_name", bank_name)?;
                require("account_number", account_number)?;
                require("routing_number", routing_number)?;
            }
            PaymentMethod::Paypal { email } => {
                require("email", email)?;
                check_email(email)?;
            }
            PaymentMethod::Crypto {
                network,
                wallet_address,
            } => {
                require("network", network)?;
                require("wallet_address", wallet_address)?;
                if wallet_address.chars().any(char::is_whitespace) || wallet_address.len() < 26 {
                    return Err(PaymentMethodError::InvalidWalletAddress {
                        network: network.clone(),
                        address: wallet_address.clone(),
                    });
                }
            }
            PaymentMethod::Wise { email, currency } => {
                require("email", email)?;
                require("currency", currency)?;
                check_email(email)?;
                if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
                    return Err(PaymentMethodError::InvalidCurrency(currency.clone()));
                }
            }
        }
        Ok(())
    }

    /// Redacted one-line description for logs and receipts
    pub fn describe(&self) -> String {
        match self {
            PaymentMethod::Bank {
                bank_name,
                account_number,
                ..
            } => format!("bank {} ****{}", bank_name, last_four(account_number)),
            PaymentMethod::Paypal { email } => format!("paypal {}", email),
            PaymentMethod::Crypto {
                network,
                wallet_address,
            } => format!("crypto {} ...{}", network, last_four(wallet_address)),
            PaymentMethod::Wise { email, currency } => format!("wise {} ({})", email, currency),
        }
    }
}

fn check_email(email: &str) -> Result<(), PaymentMethodError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(PaymentMethodError::InvalidEmail(email.to_string()))
    }
}

fn last_four(value: &str) -> &str {
    let start = value.len().saturating_sub(4);
    value.get(start..).unwrap_or(value)
}
