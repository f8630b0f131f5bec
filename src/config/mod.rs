// ABOUTME: Configuration management module for centralized server settings and parameters
// ABOUTME: Exposes environment-driven server configuration and its validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module
//!
//! - **Environment**: Server configuration from environment variables

/// Environment and server configuration
pub mod environment;

pub use environment::{Environment, ServerConfig};
