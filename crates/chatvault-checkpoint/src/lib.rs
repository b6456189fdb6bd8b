// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resumable checkpoint and retry tracking for the Chatvault archiver.
//!
//! The checkpoint file is the sole source of resume position after a
//! restart: last fully-processed message id and the pending-retry set per
//! chat, persisted synchronously after every batch.

pub mod state;
pub mod store;

pub use state::{ChatCheckpoint, ChatStatus};
pub use store::CheckpointStore;
