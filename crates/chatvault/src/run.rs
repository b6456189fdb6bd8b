// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatvault run` command implementation.
//!
//! Builds the HTTP source and the archive pipeline, wires Ctrl-C to
//! between-batch cancellation, and mirrors the progress feed onto a
//! terminal spinner while the run is in flight.

use std::sync::Arc;

use chatvault_archiver::ArchiveRunner;
use chatvault_config::ChatvaultConfig;
use chatvault_core::ChatvaultError;
use chatvault_progress::ProgressFeed;
use chatvault_source::HttpMessageSource;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run the `chatvault run` command.
pub async fn run(config: ChatvaultConfig) -> Result<(), ChatvaultError> {
    init_tracing(&config.archive.log_level);

    if config.chats.iter().filter(|c| c.enabled).count() == 0 {
        println!("chatvault: no enabled chats in configuration, nothing to do");
        return Ok(());
    }

    let source = Arc::new(HttpMessageSource::from_config(&config.source)?);
    let feed = Arc::new(ProgressFeed::new());
    let cancel = CancellationToken::new();

    // First Ctrl-C drains the in-flight batch and pauses cleanly.
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("interrupt received, finishing the current batch before stopping");
            signal_cancel.cancel();
        }
    });

    let bar = progress_bar();
    let mut updates = feed.subscribe();
    let mirror_bar = bar.clone();
    let mirror = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow().clone();
            let active: u64 = state.downloads.values().map(|d| d.transferred).sum();
            mirror_bar.set_message(format!(
                "{}/{} chats · {} downloads in flight ({} bytes)",
                state.overall.finished_chats,
                state.overall.total_chats,
                state.downloads.len(),
                active,
            ));
        }
    });

    let mut runner = ArchiveRunner::new(&config, source, Arc::clone(&feed), cancel)?;
    let result = runner.run().await;
    mirror.abort();
    bar.finish_and_clear();

    let summary = result?;
    info!(
        completed = summary.chats_completed,
        paused = summary.chats_paused,
        "run complete"
    );
    println!(
        "done: {} chat(s) completed, {} paused, {} message(s) pending retry",
        summary.chats_completed, summary.chats_paused, summary.pending_retry_total
    );
    if summary.pending_retry_total > 0 {
        println!("pending ids are re-queued automatically on the next run");
    }
    Ok(())
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(std::time::Duration::from_millis(120));
    bar
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chatvault={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
