// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatvault rebuild` command implementation.
//!
//! Regenerates every presentation document and the index from the durable
//! logs on disk, without contacting the message source. Useful after a
//! renderer change or manual log edits.

use std::path::PathBuf;

use chatvault_config::ChatvaultConfig;
use chatvault_core::ChatvaultError;
use chatvault_history::{HistoryEngine, renderer_for};

/// Run the `chatvault rebuild` command.
pub fn run_rebuild(config: &ChatvaultConfig) -> Result<(), ChatvaultError> {
    let history_dir =
        PathBuf::from(&config.archive.base_directory).join(&config.archive.history_directory);
    let mut engine = HistoryEngine::new(history_dir.clone(), renderer_for(&config.archive.format));
    engine.rebuild()?;
    println!(
        "rebuilt presentation documents in {}",
        history_dir.display()
    );
    Ok(())
}
