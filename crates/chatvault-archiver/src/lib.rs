// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Archiving pipeline for Chatvault.
//!
//! [`ArchiveRunner`] wires the message source, download scheduler, history
//! engine, checkpoint store, and progress feed into the chat-by-chat run
//! loop. The binary crate owns process concerns (CLI, logging, signals) and
//! drives this.

pub mod runner;

pub use runner::{ArchiveRunner, RunSummary};
