// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod methods;
pub mod registry;

pub use methods::{PaymentMethod, PaymentMethodError};
pub use registry::{PaymentMethodDirectory, PaymentMethodRegistry};
