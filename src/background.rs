//! Background builds
//!
//! Large documents are tokenized on a worker thread so the first screen
//! can be shown from a progressive build right away. Every build is tagged
//! with a generation number; starting a new build or invalidating the
//! current one makes any earlier result stale, and stale results are
//! dropped instead of being applied.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Instant;

use crate::code::Code;

/// A finished build
pub struct BuildResult {
    pub generation: u64,
    pub code: Code,
}

/// Runs full builds on worker threads
#[derive(Default)]
pub struct BackgroundBuilder {
    /// Generation of the most recent `start` or `invalidate`
    generation: u64,
    /// Receiver for the build currently in flight
    rx: Option<Receiver<BuildResult>>,
}

impl BackgroundBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation number
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a build is in flight
    pub fn is_pending(&self) -> bool {
        self.rx.is_some()
    }

    /// Build `text` on a worker thread using `template`'s rules and settings.
    ///
    /// Returns the generation of the new build. Any build still in flight
    /// becomes stale.
    pub fn start(&mut self, template: &Code, text: String) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let bytes = text.len();
        let mut code = template.empty_like();

        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);

        thread::spawn(move || {
            let started = Instant::now();
            code.build(&text);
            tracing::debug!(
                generation,
                lines = code.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "background build done"
            );
            // The receiver is gone if the build was superseded
            let _ = tx.send(BuildResult { generation, code });
        });

        tracing::info!(generation, bytes, "started background build");
        generation
    }

    /// Make the build in flight stale
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.rx = None;
    }

    /// Take the finished build without blocking, if it is still current
    pub fn poll(&mut self) -> Option<Code> {
        let result = match self.rx.as_ref()?.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                tracing::warn!(generation = self.generation, "background build thread exited");
                self.rx = None;
                return None;
            }
        };
        self.rx = None;
        self.accept(result)
    }

    /// Block until the build in flight finishes
    pub fn wait(&mut self) -> Option<Code> {
        let rx = self.rx.take()?;
        match rx.recv() {
            Ok(result) => self.accept(result),
            Err(_) => {
                tracing::warn!(generation = self.generation, "background build thread exited");
                None
            }
        }
    }

    fn accept(&self, result: BuildResult) -> Option<Code> {
        if result.generation == self.generation {
            Some(result.code)
        } else {
            tracing::debug!(
                stale = result.generation,
                current = self.generation,
                "dropping stale background build"
            );
            None
        }
    }
}
