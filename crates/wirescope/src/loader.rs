//! Background asset loading.
//!
//! Parsing and image decoding can take a while for large assets, so each
//! request runs on its own thread and reports back over a channel. The frame
//! loop calls [`AssetLoader::poll`] once per frame and uploads whatever it
//! returns; GPU resources are never touched off the frame-loop thread.
//!
//! Requests are numbered. A result is only handed out if it belongs to a
//! newer request than the last one handed out, so a slow old load finishing
//! after a quick new one cannot replace the newer model.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crate::asset::{self, NamedFile};
use crate::error::LoadError;
use crate::mesh::Mesh;

/// Parse and build a mesh synchronously.
pub fn load_mesh(files: &[NamedFile]) -> Result<Mesh, LoadError> {
    let scene = asset::parse(files)?;
    Mesh::build(scene)
}

/// A finished load, tagged with its request id.
#[derive(Debug)]
pub struct LoadResult {
    pub request: u64,
    /// Names of the files the request was made with.
    pub files: Vec<String>,
    pub outcome: Result<Mesh, LoadError>,
}

pub struct AssetLoader {
    sender: Sender<LoadResult>,
    receiver: Receiver<LoadResult>,
    next_request: u64,
    last_applied: u64,
    in_flight: usize,
}

impl AssetLoader {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            next_request: 1,
            last_applied: 0,
            in_flight: 0,
        }
    }

    /// Start loading a named-blob set. Returns the request id.
    pub fn request(&mut self, files: Vec<NamedFile>) -> u64 {
        let request = self.next_request;
        self.next_request += 1;
        self.in_flight += 1;

        let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        log::info!("load #{request} started: {}", names.join(", "));

        let sender = self.sender.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("asset-load-{request}"))
            .spawn(move || {
                let started = Instant::now();
                // A panic must still report back, or `in_flight` never drops.
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| load_mesh(&files)))
                    .unwrap_or_else(|_| {
                        let file = files.first().map_or("asset", |f| f.name.as_str());
                        Err(LoadError::format(file, "decoder panicked"))
                    });
                log::debug!("load #{request} finished in {:.1?}", started.elapsed());
                // The receiver is gone only if the loader was dropped.
                let _ = sender.send(LoadResult {
                    request,
                    files: names,
                    outcome,
                });
            });
        if let Err(e) = spawned {
            log::error!("load #{request}: could not spawn loader thread: {e}");
            self.in_flight -= 1;
        }
        request
    }

    /// True while any request has not reported back.
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Drain finished loads without blocking. Returns the newest result
    /// that is newer than anything handed out before.
    pub fn poll(&mut self) -> Option<LoadResult> {
        let mut newest = None;
        while let Ok(result) = self.receiver.try_recv() {
            newest = self.accept(result, newest);
        }
        newest
    }

    /// Block until a usable result arrives or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadResult> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(result) => {
                    if let Some(result) = self.accept(result, None) {
                        return Some(result);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn accept(&mut self, result: LoadResult, current: Option<LoadResult>) -> Option<LoadResult> {
        self.in_flight = self.in_flight.saturating_sub(1);
        if result.request <= self.last_applied {
            log::warn!(
                "load #{} finished after #{}, discarded",
                result.request,
                self.last_applied
            );
            return current;
        }
        if let Some(previous) = &current {
            log::warn!(
                "load #{} superseded by #{}, discarded",
                previous.request,
                result.request
            );
        }
        self.last_applied = result.request;
        Some(result)
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}
