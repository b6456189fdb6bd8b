// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP message source adapter for the Chatvault archiver.
//!
//! Implements the [`chatvault_core::MessageSource`] trait over a paginated
//! JSON REST API with streamed media downloads. Platform-specific clients
//! (with their own auth and rate limiting) live behind the same trait
//! outside this workspace.

pub mod http;
pub mod wire;

pub use http::HttpMessageSource;
