// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the commission ledger

/// Full version string with feature description
pub const VERSION: &str = "v1.2.0-commission-void-2025-10-13";

/// Semantic version number
pub const VERSION_NUMBER: &str = "1.2.0";

/// Build date
pub const BUILD_DATE: &str = "2025-10-13";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "threshold-batch-release",
    "fifo-withdrawals",
    "commission-void",
    "payment-methods",
    "json-file-store",
    "prometheus-metrics",
];

pub fn get_version_string() -> String {
    format!("{} ({})", VERSION_NUMBER, BUILD_DATE)
}
