// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Process environment setup shared by the server and CLI binaries

use std::env;
use std::path::Path;

/// Loads `.env`, then falls back to `default_level` when `RUST_LOG` is still
/// unset. Must run before the tracing subscriber is installed.
pub fn prepare_environment(default_level: &str) {
    dotenv::dotenv().ok();
    default_log_level(default_level);
}

/// Same as [`prepare_environment`] with an explicit env file
pub fn prepare_environment_from(env_file: &Path, default_level: &str) {
    dotenv::from_path(env_file).ok();
    default_log_level(default_level);
}

fn default_log_level(level: &str) {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", level);
    }
}
