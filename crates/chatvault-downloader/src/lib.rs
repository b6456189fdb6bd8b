// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Download pipeline for the Chatvault archiver.
//!
//! Provides the bounded-concurrency [`DownloadScheduler`], the chat-scoped
//! [`DownloadIndex`], the process-lifetime [`HashCache`] used for content
//! dedup, admission filtering, and deterministic artifact path derivation.

pub mod dedup;
pub mod filter;
pub mod hash_cache;
pub mod index;
pub mod paths;
pub mod scheduler;

pub use filter::MediaFilter;
pub use hash_cache::HashCache;
pub use index::DownloadIndex;
pub use scheduler::{BatchOutcome, DownloadScheduler, SchedulerSettings};
