//! Watches the open image file and reports when it is rewritten on disk.

use eframe::egui;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};

pub struct ImageWatcher {
    change_rx: Receiver<()>,
    /// The watcher must be kept alive for events to fire
    _watcher: RecommendedWatcher,
}

impl ImageWatcher {
    /// Starts watching `path`.
    ///
    /// The parent directory is watched rather than the file itself so that
    /// editors which replace the file atomically are still noticed. Returns
    /// `None` if watching is not possible.
    pub fn new(ctx: egui::Context, path: &Path) -> Option<Self> {
        let path = path.canonicalize().ok()?;
        let dir = path.parent()?.to_path_buf();
        let (change_tx, change_rx) = mpsc::channel();

        let watched = path.clone();
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            if event.paths.iter().any(|p| is_same_file(p, &watched)) {
                let _ = change_tx.send(());
                ctx.request_repaint();
            }
        })
        .ok()?;

        watcher.watch(&dir, RecursiveMode::NonRecursive).ok()?;
        log::info!("Watching {} for changes", path.display());

        Some(Self {
            change_rx,
            _watcher: watcher,
        })
    }

    /// Returns `true` if the file changed since the last poll.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.change_rx.try_recv() {
                Ok(()) => changed = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Image watcher channel disconnected");
                    break;
                }
            }
        }
        changed
    }
}

fn is_same_file(candidate: &Path, watched: &Path) -> bool {
    candidate == watched || candidate.canonicalize().is_ok_and(|p| p == watched)
}
