//! Background worker thread — bundle fetches and metrics run here.
//!
//! Communication with the TUI main thread is via `mpsc` channels.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use pledgeboard_core::data::PriceTableProvider;
use pledgeboard_runner::{load_bundle_view, BundleView, SelectionTicket, ViewError, ViewSettings};

/// Commands sent from the TUI to the worker.
pub enum WorkerCommand {
    LoadBundle {
        ticket: SelectionTicket,
        provider: Arc<dyn PriceTableProvider>,
        settings: ViewSettings,
    },
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug)]
pub enum WorkerResponse {
    BundleLoaded {
        ticket: SelectionTicket,
        result: Box<Result<BundleView, ViewError>>,
    },
    /// The load finished after the user cancelled it.
    Cancelled { ticket: SelectionTicket },
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    cancel: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("pledgeboard-worker".into())
        .spawn(move || worker_loop(rx, tx, cancel))
}

/// Stop the worker on quit.
///
/// Raises the cancel flag, then asks the worker to stop. An idle worker is
/// joined; a busy one is detached so quitting never waits on a slow fetch.
/// Returns whether the worker was joined.
pub fn shutdown_worker(
    tx: &Sender<WorkerCommand>,
    handle: JoinHandle<()>,
    cancel: &AtomicBool,
    busy: bool,
) -> bool {
    cancel.store(true, Ordering::Relaxed);
    let _ = tx.send(WorkerCommand::Shutdown);
    if busy {
        tracing::info!("detaching worker with a load in flight");
        drop(handle);
        return false;
    }
    handle.join().is_ok()
}

fn worker_loop(rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>, cancel: Arc<AtomicBool>) {
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(WorkerCommand::LoadBundle {
                ticket,
                provider,
                settings,
            }) => {
                cancel.store(false, Ordering::Relaxed);
                let result = load_bundle_view(provider.as_ref(), &ticket, &settings);
                let response = if cancel.load(Ordering::Relaxed) {
                    WorkerResponse::Cancelled { ticket }
                } else {
                    WorkerResponse::BundleLoaded {
                        ticket,
                        result: Box::new(result),
                    }
                };
                if tx.send(response).is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!("worker stopped");
}
