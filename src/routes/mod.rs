// ABOUTME: Route module organization for auxiliary HTTP endpoints
// ABOUTME: SSE session routes live in the sse module; this holds service-level routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Health check and system status routes
pub mod health;

pub use health::HealthRoutes;
