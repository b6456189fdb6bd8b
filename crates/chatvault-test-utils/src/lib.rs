// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the Chatvault workspace.
//!
//! Provides a scripted [`MockMessageSource`] with failure injection and
//! concurrency observation, plus shorthand message builders. Used from the
//! dev-dependency side of the other crates.

pub mod builders;
pub mod mock_source;

pub use builders::{media_message, text_message};
pub use mock_source::MockMessageSource;
