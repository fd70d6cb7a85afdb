//! DOT-to-PNG rendering through an external Graphviz process.

use std::io::{self, Write};
use std::process::{ChildStdin, Command, Stdio};
use std::thread;
use std::time::Instant;

use glam::Vec2;
use image::ImageFormat;
use tracing::debug;

use crate::error::{Result, ViewerError};

/// External renderer invocation: a program plus its arguments.
///
/// The program receives DOT text on stdin and must write a PNG image to
/// stdout. Defaults to Graphviz `dot -Tpng`.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: "dot".to_owned(),
            args: vec!["-Tpng".to_owned()],
        }
    }
}

/// A decoded RGBA frame ready for upload to a texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 pixels, row-major.
    pub rgba: Vec<u8>,
}

impl Frame {
    /// Image dimensions as a vector, for camera math.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// Renders DOT `text` to a [`Frame`] by piping it through the configured
/// renderer program.
///
/// ### Parameters
/// - `config` - Renderer program and arguments.
/// - `text` - DOT source to feed to the renderer's stdin.
///
/// ### Returns
/// The decoded frame, or an error if the process could not be launched,
/// exited non-zero, or wrote output that is not a valid PNG.
pub fn render_dot(config: &RendererConfig, text: &str) -> Result<Frame> {
    let started = Instant::now();

    let mut child = Command::new(&config.program)
        .args(&config.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ViewerError::RendererSpawn {
            program: config.program.clone(),
            source,
        })?;

    // Feed stdin from its own thread while this one drains stdout and
    // stderr. A renderer may emit more than a pipe buffer of output before
    // it has consumed all of its input; writing and draining sequentially
    // would block both sides forever.
    let stdin = child.stdin.take();
    let (output, fed) = thread::scope(|scope| {
        let writer = scope.spawn(|| feed_stdin(stdin, text));
        (child.wait_with_output(), writer.join())
    });

    let output = output?;
    if let Ok(result) = fed {
        result?;
    }
    if !output.status.success() {
        return Err(ViewerError::RendererFailed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    let decoded = image::load_from_memory_with_format(&output.stdout, ImageFormat::Png)?.to_rgba8();
    let (width, height) = decoded.dimensions();

    debug!(
        width,
        height,
        duration_ms = started.elapsed().as_millis() as u64,
        "rendered frame"
    );

    Ok(Frame {
        width,
        height,
        rgba: decoded.into_raw(),
    })
}

/// Writes the DOT text to the renderer's stdin, then closes it.
///
/// A renderer that rejects its input may close stdin before the write
/// finishes; that is tolerated and the exit status decides the outcome.
fn feed_stdin(stdin: Option<ChildStdin>, text: &str) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    match stdin.write_all(text.as_bytes()) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!("renderer closed stdin early");
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;

    fn write_png(path: &Path, width: u32, height: u32, pixel: [u8; 4]) {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(pixel));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        fs::write(path, bytes).unwrap();
    }

    /// A renderer stand-in: drains stdin, then emits the PNG file passed
    /// as its first argument.
    fn file_renderer(png: &Path) -> RendererConfig {
        RendererConfig {
            program: "sh".to_owned(),
            args: vec![
                "-c".to_owned(),
                r#"cat >/dev/null; cat "$0""#.to_owned(),
                png.display().to_string(),
            ],
        }
    }

    #[test]
    fn renders_stdout_png_into_a_frame() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("out.png");
        write_png(&png, 3, 2, [10, 20, 30, 255]);

        let frame = render_dot(&file_renderer(&png), "digraph { a -> b }").unwrap();

        assert_eq!((frame.width, frame.height), (3, 2));
        assert_eq!(frame.rgba.len(), 3 * 2 * 4);
        assert_eq!(&frame.rgba[..4], &[10, 20, 30, 255]);
        assert_eq!(frame.size(), Vec2::new(3.0, 2.0));
    }

    #[test]
    fn nonzero_exit_surfaces_stderr() {
        let config = RendererConfig {
            program: "sh".to_owned(),
            args: vec!["-c".to_owned(), "echo 'syntax error near b' >&2; exit 1".to_owned()],
        };

        let err = render_dot(&config, "digraph {").unwrap_err();
        match err {
            ViewerError::RendererFailed { stderr, .. } => {
                assert!(stderr.contains("syntax error near b"), "stderr: {stderr}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn chatty_renderer_does_not_deadlock_on_large_input() {
        // Floods stderr with more than a pipe buffer before touching
        // stdin, while the input is itself larger than a pipe buffer.
        let config = RendererConfig {
            program: "sh".to_owned(),
            args: vec![
                "-c".to_owned(),
                r#"head -c 200000 /dev/zero | tr '\000' w >&2; cat >/dev/null; exit 1"#
                    .to_owned(),
            ],
        };
        let text = "x".repeat(200_000);

        let err = render_dot(&config, &text).unwrap_err();
        match err {
            ViewerError::RendererFailed { status, stderr } => {
                assert_eq!(status.code(), Some(1));
                assert_eq!(stderr.len(), 200_000);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_output_is_a_decode_error() {
        let config = RendererConfig {
            program: "sh".to_owned(),
            args: vec!["-c".to_owned(), "cat >/dev/null; echo not-a-png".to_owned()],
        };

        let err = render_dot(&config, "digraph {}").unwrap_err();
        assert!(matches!(err, ViewerError::Decode(_)), "got: {err}");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let config = RendererConfig {
            program: "definitely-not-a-renderer".to_owned(),
            args: Vec::new(),
        };

        let err = render_dot(&config, "digraph {}").unwrap_err();
        match err {
            ViewerError::RendererSpawn { program, .. } => {
                assert_eq!(program, "definitely-not-a-renderer");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
