//! Short camera glide used by the reset-view gesture.

use crate::camera::Camera;

/// Quadratic ease-out: fast at the start, settling toward the end.
fn ease_out_quad(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

/// An in-flight interpolation between two camera states.
///
/// Timing is driven by a caller-supplied clock in seconds, so the UI can
/// feed in its own frame time and tests can step time explicitly.
#[derive(Debug, Clone, Copy)]
pub struct Glide {
    from: Camera,
    to: Camera,
    start: f64,
    duration: f64,
}

impl Glide {
    /// Starts a glide from `from` to `to` at clock time `start`, lasting
    /// `duration` seconds.
    pub fn new(from: Camera, to: Camera, start: f64, duration: f64) -> Self {
        Self {
            from,
            to,
            start,
            duration,
        }
    }

    /// Returns the eased camera state at clock time `now`.
    ///
    /// Before `start` this is the starting camera; at or after
    /// `start + duration` (or for a non-positive duration) it is the target.
    pub fn sample(&self, now: f64) -> Camera {
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            (((now - self.start) / self.duration).clamp(0.0, 1.0)) as f32
        };
        let k = ease_out_quad(t);

        Camera {
            zoom: self.from.zoom + (self.to.zoom - self.from.zoom) * k,
            pan: self.from.pan + (self.to.pan - self.from.pan) * k,
        }
    }

    /// True once `now` has passed the end of the glide.
    pub fn is_finished(&self, now: f64) -> bool {
        self.duration <= 0.0 || now - self.start >= self.duration
    }

    /// The camera state the glide lands on.
    pub fn target(&self) -> Camera {
        self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn endpoints() -> (Camera, Camera) {
        let from = Camera {
            zoom: 1.0,
            pan: Vec2::new(100.0, -60.0),
        };
        let to = Camera {
            zoom: 3.0,
            pan: Vec2::ZERO,
        };
        (from, to)
    }

    #[test]
    fn sample_hits_both_endpoints() {
        let (from, to) = endpoints();
        let glide = Glide::new(from, to, 10.0, 0.4);

        assert_eq!(glide.sample(10.0), from);
        assert_eq!(glide.sample(10.4), to);
        // Sampling past the end stays at the target.
        assert_eq!(glide.sample(99.0), to);
    }

    #[test]
    fn midpoint_is_eased_not_linear() {
        let (from, to) = endpoints();
        let glide = Glide::new(from, to, 0.0, 1.0);

        // ease_out_quad(0.5) = 0.75, so the halfway sample sits three
        // quarters of the way to the target.
        let mid = glide.sample(0.5);
        assert!((mid.zoom - 2.5).abs() < 1e-5);
        assert!((mid.pan - Vec2::new(25.0, -15.0)).length() < 1e-4);
    }

    #[test]
    fn samples_move_monotonically_toward_the_target() {
        let (from, to) = endpoints();
        let glide = Glide::new(from, to, 0.0, 1.0);

        let mut last = glide.sample(0.0).zoom;
        for i in 1..=10 {
            let zoom = glide.sample(f64::from(i) / 10.0).zoom;
            assert!(zoom >= last, "zoom regressed at step {i}: {zoom} < {last}");
            last = zoom;
        }
        assert_eq!(last, to.zoom);
    }

    #[test]
    fn zero_duration_is_immediately_finished() {
        let (from, to) = endpoints();
        let glide = Glide::new(from, to, 5.0, 0.0);

        assert!(glide.is_finished(5.0));
        assert_eq!(glide.sample(5.0), to);
    }

    #[test]
    fn is_finished_tracks_the_clock() {
        let (from, to) = endpoints();
        let glide = Glide::new(from, to, 1.0, 0.5);

        assert!(!glide.is_finished(1.0));
        assert!(!glide.is_finished(1.49));
        assert!(glide.is_finished(1.5));
    }
}
