//! Scalar shaping used by the effect engine: interpolation, the idle wave,
//! fade ramps and a critically damped follower.

use std::f64::consts::PI;

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Smooth 0..1 wave: `sin(t / period / 2 * PI) / 2 + 0.5`.
#[inline]
pub fn oscillation(time_sec: f64, period_sec: f32) -> f32 {
    ((time_sec / period_sec as f64 / 2.0 * PI).sin() / 2.0 + 0.5) as f32
}

/// Direction of a fade ramp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

impl FadeDirection {
    /// Value the ramp snaps to once the duration has elapsed.
    #[inline]
    pub fn target(self) -> f32 {
        match self {
            FadeDirection::In => 1.0,
            FadeDirection::Out => 0.0,
        }
    }
}

/// Fade amount after `elapsed_sec` of a ramp lasting `duration_sec`.
/// Returns `None` once the ramp is over; callers then snap to `target()`.
pub fn fade_amount(direction: FadeDirection, elapsed_sec: f64, duration_sec: f32) -> Option<f32> {
    let duration = duration_sec as f64;
    if elapsed_sec >= duration {
        return None;
    }
    let progress = (elapsed_sec.max(0.0) / duration) as f32;
    Some(match direction {
        FadeDirection::In => progress,
        FadeDirection::Out => 1.0 - progress,
    })
}

/// Critically damped spring that follows a moving target without overshoot.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SmoothDamp {
    pub value: f32,
    pub velocity: f32,
}

impl SmoothDamp {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            velocity: 0.0,
        }
    }

    /// Advance by `dt_sec` towards `target` with time constant `smooth_time_sec`.
    pub fn step(&mut self, target: f32, smooth_time_sec: f32, dt_sec: f32) -> f32 {
        if dt_sec <= 0.0 {
            return self.value;
        }
        let smooth_time = smooth_time_sec.max(1e-4);
        let omega = 2.0 / smooth_time;
        let x = omega * dt_sec;
        // Pade-style approximation of exp(-x)
        let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
        let change = self.value - target;
        let temp = (self.velocity + omega * change) * dt_sec;
        self.velocity = (self.velocity - omega * temp) * decay;
        let mut out = target + (change + temp) * decay;

        // no overshoot past the target
        if (target - self.value > 0.0) == (out > target) {
            out = target;
            self.velocity = 0.0;
        }
        self.value = out;
        out
    }
}
