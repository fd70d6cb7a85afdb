//! Background render worker.
//!
//! The worker owns a single-slot input: submitting a new DOT message
//! overwrites any message that has not started rendering yet, so a burst of
//! writes coalesces and only the newest text is rendered (latest wins).

use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::SystemTime;

use tracing::{debug, error};

use crate::render::{self, Frame, RendererConfig};

/// Notifications delivered to the UI thread.
#[derive(Debug)]
pub enum PipelineEvent {
    /// A complete DOT message arrived on the pipe.
    Received { at: SystemTime },
    /// A message was rendered into an image.
    Frame { frame: Frame, at: SystemTime },
    /// Rendering a message failed.
    Failed { message: String, at: SystemTime },
}

struct Shared {
    latest: String,
    pending: bool,
    running: bool,
}

type State = Arc<(Mutex<Shared>, Condvar)>;

fn lock(state: &State) -> std::sync::MutexGuard<'_, Shared> {
    state.0.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cloneable submission side of the worker, handed to the pipe reader.
#[derive(Clone)]
pub struct RenderHandle {
    state: State,
    events: Sender<PipelineEvent>,
}

impl RenderHandle {
    /// Offers a freshly received DOT message to the worker.
    ///
    /// Always reports the delivery on the event channel. The message is
    /// queued for rendering only if it differs from the previous one;
    /// returns whether it was queued.
    pub fn submit(&self, text: String) -> bool {
        let _ = self.events.send(PipelineEvent::Received {
            at: SystemTime::now(),
        });

        let mut shared = lock(&self.state);
        if !shared.running || shared.latest == text {
            debug!(len = text.len(), "message skipped");
            return false;
        }

        shared.latest = text;
        shared.pending = true;
        self.state.1.notify_one();
        true
    }
}

/// The worker thread plus the shared slot it sleeps on.
pub struct RenderWorker {
    state: State,
    events: Sender<PipelineEvent>,
    thread: Option<JoinHandle<()>>,
}

impl RenderWorker {
    /// Spawns the render thread. Results and failures are reported on
    /// `events`.
    pub fn spawn(renderer: RendererConfig, events: Sender<PipelineEvent>) -> Self {
        let state: State = Arc::new((
            Mutex::new(Shared {
                latest: String::new(),
                pending: false,
                running: true,
            }),
            Condvar::new(),
        ));

        let thread = {
            let state = Arc::clone(&state);
            let events = events.clone();
            std::thread::spawn(move || run(state, renderer, events))
        };

        Self {
            state,
            events,
            thread: Some(thread),
        }
    }

    /// Returns a handle for submitting messages to this worker.
    pub fn handle(&self) -> RenderHandle {
        RenderHandle {
            state: Arc::clone(&self.state),
            events: self.events.clone(),
        }
    }

    /// Wakes the thread, tells it to exit and joins it. Idempotent.
    pub fn stop(&mut self) {
        {
            let mut shared = lock(&self.state);
            shared.running = false;
            self.state.1.notify_all();
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(state: State, renderer: RendererConfig, events: Sender<PipelineEvent>) {
    loop {
        let text = {
            let guard = lock(&state);
            let mut guard = state
                .1
                .wait_while(guard, |s| s.running && !s.pending)
                .unwrap_or_else(PoisonError::into_inner);
            // Shutdown wins over a still-pending message.
            if !guard.running {
                break;
            }
            guard.pending = false;
            guard.latest.clone()
        };

        let event = match render::render_dot(&renderer, &text) {
            Ok(frame) => PipelineEvent::Frame {
                frame,
                at: SystemTime::now(),
            },
            Err(err) => {
                error!(error = %err, "render failed");
                PipelineEvent::Failed {
                    message: err.to_string(),
                    at: SystemTime::now(),
                }
            }
        };

        // The receiver going away means the UI is shutting down.
        if events.send(event).is_err() {
            break;
        }
    }
    debug!("render worker stopped");
}
