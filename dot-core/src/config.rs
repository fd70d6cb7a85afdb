use std::time::Duration;

use crate::render::RendererConfig;

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Command used to turn DOT text into a PNG image.
    pub renderer: RendererConfig,
    /// How long the pipe reader sleeps when no data is available.
    pub poll_interval: Duration,
    /// How long the pipe reader waits before retrying after an error.
    pub retry_delay: Duration,
    /// Duration of the animated fit-and-center glide, in seconds.
    pub glide_duration: f64,
    /// How long the center indicator stays visible, in seconds.
    pub indicator_duration: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            renderer: RendererConfig::default(),
            poll_interval: Duration::from_millis(10),
            retry_delay: Duration::from_secs(1),
            glide_duration: 0.4,
            indicator_duration: 0.8,
        }
    }
}
