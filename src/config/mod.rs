// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod environment;
pub mod settings;

pub use environment::prepare_environment;
pub use settings::LedgerConfig;
