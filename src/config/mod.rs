// ABOUTME: Configuration module for environment-driven server settings
// ABOUTME: Re-exports the ServerConfig loaded from process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

/// Environment variable based server configuration
pub mod environment;

pub use environment::ServerConfig;
