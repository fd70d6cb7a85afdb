//! Named pipe creation and the polling reader thread.

use std::ffi::CString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::{Result, ViewerError};

/// A FIFO created on construction and unlinked again on drop.
#[derive(Debug)]
pub struct NamedPipe {
    path: PathBuf,
}

impl NamedPipe {
    /// Creates a fresh FIFO at `path`, replacing whatever file was there.
    pub fn create(path: &Path) -> Result<Self> {
        match fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "replaced existing file"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ViewerError::PipeCreate {
                    path: path.to_owned(),
                    source,
                });
            }
        }

        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
            ViewerError::PipeCreate {
                path: path.to_owned(),
                source: io::Error::new(ErrorKind::InvalidInput, "path contains a NUL byte"),
            }
        })?;

        let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o644) };
        if rc != 0 {
            return Err(ViewerError::PipeCreate {
                path: path.to_owned(),
                source: io::Error::last_os_error(),
            });
        }

        info!(path = %path.display(), "created named pipe");
        Ok(Self {
            path: path.to_owned(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for NamedPipe {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %err, "could not remove named pipe");
        } else {
            debug!(path = %self.path.display(), "removed named pipe");
        }
    }
}

/// Polls a FIFO and hands each complete message to a callback.
///
/// A message is the concatenation of everything written between a writer
/// opening the pipe and the last writer closing it again. The pipe is
/// opened non-blocking, so an idle read returns rather than parking the
/// thread, and the stop flag stays responsive.
pub struct PipeReader {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PipeReader {
    /// Spawns the reader thread.
    ///
    /// ### Parameters
    /// - `path` - FIFO to read from.
    /// - `poll_interval` - Sleep between reads while the pipe is quiet.
    /// - `retry_delay` - Sleep after an open or read error before retrying.
    /// - `on_message` - Called on the reader thread with each message.
    pub fn spawn(
        path: PathBuf,
        poll_interval: Duration,
        retry_delay: Duration,
        on_message: impl FnMut(String) + Send + 'static,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let thread = {
            let stop = Arc::clone(&stop);
            thread::spawn(move || run(&path, poll_interval, retry_delay, &stop, on_message))
        };

        Self {
            stop,
            thread: Some(thread),
        }
    }

    /// Signals the thread to exit and joins it. Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.stop();
    }
}

fn open_nonblocking(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

fn run(
    path: &Path,
    poll_interval: Duration,
    retry_delay: Duration,
    stop: &AtomicBool,
    mut on_message: impl FnMut(String),
) {
    while !stop.load(Ordering::Relaxed) {
        let mut file = match open_nonblocking(path) {
            Ok(file) => file,
            Err(err) => {
                error!(path = %path.display(), error = %err, "could not open pipe");
                thread::sleep(retry_delay);
                continue;
            }
        };
        debug!(path = %path.display(), "pipe opened");

        let mut buffer = Vec::new();
        let mut chunk = [0u8; 4096];
        while !stop.load(Ordering::Relaxed) {
            match file.read(&mut chunk) {
                // No writers right now. Anything buffered was terminated by
                // the writer closing its end, so it forms a complete message.
                Ok(0) => {
                    if !buffer.is_empty() {
                        match String::from_utf8(std::mem::take(&mut buffer)) {
                            Ok(text) => {
                                debug!(len = text.len(), "message complete");
                                on_message(text);
                            }
                            Err(err) => warn!(error = %err, "discarded non-utf8 message"),
                        }
                    }
                    thread::sleep(poll_interval);
                }
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                // Writers are connected but nothing is buffered yet.
                Err(err) if err.kind() == ErrorKind::WouldBlock => thread::sleep(poll_interval),
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    error!(path = %path.display(), error = %err, "pipe read failed");
                    thread::sleep(retry_delay);
                    break;
                }
            }
        }
    }
    debug!("pipe reader stopped");
}
