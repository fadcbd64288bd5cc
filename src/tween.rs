//! Time-bounded property interpolation.
//!
//! Used for the entrance animation that grows a freshly attached pivot from
//! zero to its target scale. A [`Tween`] is advanced by the frame clock and
//! sampled once per frame; it never skips past its end value.

use instant::Duration;

/// Easing curve variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Slow start, fast end.
    QuadraticIn,
    /// Fast start, slow end.
    QuadraticOut,
    /// Stronger ease-out than quadratic.
    CubicOut,
}

impl Easing {
    /// Evaluate the curve at time `t`, clamped to [0, 1].
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticIn => t * t,
            Easing::QuadraticOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt
            }
            Easing::CubicOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt * omt
            }
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Easing::QuadraticOut
    }
}

/// A scalar interpolation from `from` to `to` over a fixed duration.
#[derive(Debug, Clone)]
pub struct Tween {
    from: f32,
    to: f32,
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
            easing,
        }
    }

    /// Advance the clock and return the current value.
    ///
    /// A zero-duration tween is finished immediately and always yields the
    /// end value.
    pub fn advance(&mut self, dt: Duration) -> f32 {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.value()
    }

    pub fn value(&self) -> f32 {
        if self.duration.is_zero() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from + (self.to - self.from) * self.easing.evaluate(t)
    }

    pub fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn easing_curves_hit_their_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::QuadraticIn,
            Easing::QuadraticOut,
            Easing::CubicOut,
        ] {
            assert!(easing.evaluate(0.0).abs() < EPS, "{easing:?} start");
            assert!((easing.evaluate(1.0) - 1.0).abs() < EPS, "{easing:?} end");
        }
    }

    #[test]
    fn easing_input_is_clamped() {
        assert_eq!(Easing::Linear.evaluate(-0.5), 0.0);
        assert_eq!(Easing::Linear.evaluate(1.5), 1.0);
    }

    #[test]
    fn quadratic_out_leads_linear() {
        // Ease-out moves faster than linear early on
        assert!(Easing::QuadraticOut.evaluate(0.25) > 0.25);
    }

    #[test]
    fn tween_runs_from_start_to_end() {
        let mut tween = Tween::new(0.0, 2.0, Duration::from_secs(1), Easing::Linear);
        assert!(tween.value().abs() < EPS);
        let halfway = tween.advance(Duration::from_millis(500));
        assert!((halfway - 1.0).abs() < EPS);
        let done = tween.advance(Duration::from_millis(500));
        assert!((done - 2.0).abs() < EPS);
        assert!(tween.finished());
    }

    #[test]
    fn tween_never_overshoots() {
        let mut tween = Tween::new(0.0, 1.0, Duration::from_secs(1), Easing::CubicOut);
        let value = tween.advance(Duration::from_secs(10));
        assert!((value - 1.0).abs() < EPS);
        assert!(tween.finished());
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let mut tween = Tween::new(0.0, 3.0, Duration::ZERO, Easing::Linear);
        assert!(tween.finished());
        assert!((tween.advance(Duration::from_millis(1)) - 3.0).abs() < EPS);
    }
}
