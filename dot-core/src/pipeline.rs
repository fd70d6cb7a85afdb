//! Wiring: named pipe, reader thread, render worker, event channel.

use std::path::Path;
use std::sync::mpsc::{self, Receiver};

use tracing::info;

use crate::config::ViewerConfig;
use crate::error::Result;
use crate::source::{NamedPipe, PipeReader};
use crate::worker::{PipelineEvent, RenderWorker};

/// The background half of the viewer.
///
/// Owns the FIFO and both threads. Field order doubles as shutdown order:
/// the reader stops feeding first, then the worker winds down, then the
/// pipe file is unlinked.
pub struct Pipeline {
    reader: PipeReader,
    worker: RenderWorker,
    pipe: NamedPipe,
    events: Receiver<PipelineEvent>,
}

impl Pipeline {
    /// Creates the FIFO at `path` and spawns the reader and render threads.
    pub fn start(path: &Path, config: &ViewerConfig) -> Result<Self> {
        let pipe = NamedPipe::create(path)?;

        let (tx, events) = mpsc::channel();
        let worker = RenderWorker::spawn(config.renderer.clone(), tx);

        let handle = worker.handle();
        let reader = PipeReader::spawn(
            pipe.path().to_owned(),
            config.poll_interval,
            config.retry_delay,
            move |text| {
                handle.submit(text);
            },
        );

        info!(path = %pipe.path().display(), "pipeline started");
        Ok(Self {
            reader,
            worker,
            pipe,
            events,
        })
    }

    /// Event stream for the UI thread to poll.
    pub fn events(&self) -> &Receiver<PipelineEvent> {
        &self.events
    }

    /// Path of the FIFO this pipeline listens on.
    pub fn path(&self) -> &Path {
        self.pipe.path()
    }

    /// Stops both threads. Dropping the pipeline does the same and also
    /// removes the FIFO.
    pub fn shutdown(&mut self) {
        self.reader.stop();
        self.worker.stop();
    }
}
