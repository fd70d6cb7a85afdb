//! Application entry point for the Graphviz pipe viewer.
//!
//! This binary parses the command line, sets up logging, starts the
//! background pipe/render pipeline and delegates all interactive logic
//! and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use dot_core::config::ViewerConfig;
use dot_core::pipeline::Pipeline;
use dot_core::render::RendererConfig;
use viewer::Viewer;

/// Watch a named pipe for Graphviz DOT text and display the rendered graph.
///
/// The pipe is created on startup and removed again on exit. Writing to it
/// renders a new frame as soon as the writer closes its end:
///
/// ```sh
/// echo 'digraph { a -> b }' > /tmp/render.pipe
/// ```
#[derive(Parser, Debug)]
#[command(
    name = "dotview",
    version,
    about = "Live Graphviz viewer fed through a named pipe"
)]
struct Cli {
    /// Path of the named pipe to create and watch.
    pipe: PathBuf,

    /// Renderer command; receives DOT on stdin and must print PNG to stdout.
    #[arg(long, default_value = "dot -Tpng", value_name = "CMD")]
    renderer: String,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress everything except errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Splits the `--renderer` string into a program and its arguments.
    fn renderer_config(&self) -> Result<RendererConfig> {
        let mut parts = self.renderer.split_whitespace().map(str::to_owned);
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("--renderer must name a program"))?;
        Ok(RendererConfig {
            program,
            args: parts.collect(),
        })
    }
}

fn init_logger(verbose: bool, quiet: bool) {
    let default = if quiet {
        "dotview=error,dot_core=error"
    } else if verbose {
        "dotview=debug,dot_core=debug,info"
    } else {
        "dotview=info,dot_core=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();
}

/// Starts the pipeline and the native eframe application.
///
/// The window is titled after the watched pipe and cannot shrink below
/// 300x200. All UI state lives in [`Viewer`]; the pipe and both worker
/// threads are torn down when the window closes.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if the pipe cannot be created or eframe fails to open a window.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.quiet);

    let config = ViewerConfig {
        renderer: cli.renderer_config()?,
        ..ViewerConfig::default()
    };

    let pipeline = Pipeline::start(&cli.pipe, &config)
        .with_context(|| format!("could not start watching {}", cli.pipe.display()))?;
    tracing::info!(pipe = %pipeline.path().display(), "waiting for DOT input");

    let title = format!("Graphviz: {}", pipeline.path().display());
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title.clone())
            .with_inner_size([800.0, 600.0])
            .with_min_inner_size([300.0, 200.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(Viewer::new(pipeline, config)))),
    )
    .map_err(|err| anyhow!("could not start the viewer window: {err}"))
}
