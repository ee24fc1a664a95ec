//! Easing curves sampled by ability phases and status effects.

use serde::{Deserialize, Serialize};

/// A normalised curve evaluated over `t` in `[0, 1]`.
///
/// Ability movement speed and knockback strength are multiplied by the curve
/// value at the elapsed-time ratio of their phase.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum EasingCurve {
    /// Always 1.0
    #[default]
    Constant,
    /// t
    Linear,
    /// 1 - t, fades out over the phase
    LinearDecay,
    /// t squared
    EaseIn,
    /// Decelerating, 1 - (1 - t)^2
    EaseOut,
    /// Smoothstep
    EaseInOut,
    /// Piecewise-linear `(time, value)` keys, sorted by time
    Keyframes(Vec<(f32, f32)>),
}

impl EasingCurve {
    /// Evaluate the curve. `t` is clamped to `[0, 1]`.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 1.0 };
        match self {
            EasingCurve::Constant => 1.0,
            EasingCurve::Linear => t,
            EasingCurve::LinearDecay => 1.0 - t,
            EasingCurve::EaseIn => t * t,
            EasingCurve::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            EasingCurve::EaseInOut => t * t * (3.0 - 2.0 * t),
            EasingCurve::Keyframes(keys) => sample_keys(keys, t),
        }
    }
}

fn sample_keys(keys: &[(f32, f32)], t: f32) -> f32 {
    let Some(&(first_time, first_value)) = keys.first() else {
        return 1.0;
    };
    if t <= first_time {
        return first_value;
    }

    for pair in keys.windows(2) {
        let (t0, v0) = pair[0];
        let (t1, v1) = pair[1];
        if t <= t1 {
            let span = t1 - t0;
            if span <= f32::EPSILON {
                return v1;
            }
            return v0 + (v1 - v0) * ((t - t0) / span);
        }
    }

    keys.last().map(|&(_, v)| v).unwrap_or(1.0)
}

/// Elapsed fraction of the window `[start, end]` at `now`, clamped to `[0, 1]`.
///
/// A window with no length counts as already finished.
pub fn time_ratio(now: f32, start: f32, end: f32) -> f32 {
    let span = end - start;
    if span <= f32::EPSILON {
        return 1.0;
    }
    ((now - start) / span).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_curves_endpoints() {
        assert_eq!(EasingCurve::Constant.evaluate(0.3), 1.0);
        assert_eq!(EasingCurve::Linear.evaluate(0.25), 0.25);
        assert_eq!(EasingCurve::LinearDecay.evaluate(1.0), 0.0);
        assert_eq!(EasingCurve::EaseOut.evaluate(1.0), 1.0);
        assert_eq!(EasingCurve::EaseInOut.evaluate(0.5), 0.5);
    }

    #[test]
    fn test_keyframes_interpolate_and_clamp() {
        let curve = EasingCurve::Keyframes(vec![(0.0, 0.0), (0.5, 1.0), (1.0, 0.5)]);
        assert!((curve.evaluate(0.25) - 0.5).abs() < 1e-6);
        assert!((curve.evaluate(0.75) - 0.75).abs() < 1e-6);
        assert_eq!(curve.evaluate(2.0), 0.5);
        assert_eq!(EasingCurve::Keyframes(vec![]).evaluate(0.5), 1.0);
    }

    #[test]
    fn test_time_ratio_guards_zero_length() {
        assert_eq!(time_ratio(5.0, 5.0, 5.0), 1.0);
        assert_eq!(time_ratio(1.0, 0.0, 2.0), 0.5);
        assert_eq!(time_ratio(-1.0, 0.0, 2.0), 0.0);
    }
}
