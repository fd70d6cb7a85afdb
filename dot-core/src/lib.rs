//! Core library for the live Graphviz pipe viewer.
//!
//! Main components:
//! - [`source`] — named pipe ownership and the pipe-reading thread.
//! - [`render`] — external renderer invocation and PNG decoding.
//! - [`worker`] — the render-processing thread and its event stream.
//! - [`pipeline`] — glue that wires pipe, reader and worker together.
//! - [`camera`] — zoom/pan transform between image and view space.
//! - [`animation`] — eased camera glides for fit-and-center.
//! - [`config`] — runtime configuration for the viewer.
//! - [`error`] — shared error and result types.

pub mod animation;
pub mod camera;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod source;
pub mod worker;
