// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the archiver core and its external collaborators.

pub mod source;

pub use source::{MessageSource, NoopProgress, ProgressObserver};
