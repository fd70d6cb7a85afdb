use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors produced by the pipe/render pipeline.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to create named pipe at {path:?}: {source}")]
    PipeCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch renderer `{program}`: {source}")]
    RendererSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("renderer exited with {status}: {stderr}")]
    RendererFailed { status: ExitStatus, stderr: String },

    #[error("could not decode renderer output: {0}")]
    Decode(#[from] image::ImageError),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
