//! File watcher: lists references on startup, then again on every change.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};
use wikiref::Error;

use crate::commands;
use crate::diagnostics;

/// Debounce delay between filesystem events and re-listing.
const DEBOUNCE_MS: u64 = 100;

/// Create a filesystem watcher that signals on the given channel whenever
/// `file` is created, modified, or removed.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(
    file: PathBuf,
    tx: crossbeam_channel::Sender<()>,
) -> Result<notify::RecommendedWatcher, Error> {
    let watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
            && event.paths.iter().any(|p| return p.file_name() == file.file_name())
        {
            let _ = tx.send(());
        }
    })?;
    return Ok(watcher);
}

/// Entry point for the watch command.
///
/// Lists the file's references, then watches its directory and lists them
/// again after each change. Runs until interrupted.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be set up.
pub fn run(file: &Path) -> Result<(), Error> {
    eprintln!("watch: initial scan");
    run_list(file);

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(file.to_path_buf(), tx)?;
    let dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    tracing::debug!(dir = %dir.display(), "watching");
    eprintln!("watch: monitoring {}, press Ctrl+C to stop", file.display());

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, re-scanning...");
        run_list(file);
    }

    return Ok(());
}

/// List once, printing any error instead of stopping the watch.
fn run_list(file: &Path) {
    if let Err(e) = commands::list(file) {
        diagnostics::print_error(&e);
    }
    return;
}
