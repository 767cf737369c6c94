//! Time-based tweens for non-particle visuals (attractor scale/opacity,
//! hexagram vertical offset). Particles are animated per frame elsewhere.

use crate::formation::UnitSide;

/// Easing curves, matching the usual tween-library shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    QuadraticInOut,
    CubicOut,
    ElasticOut,
}

impl Easing {
    /// Map progress `t` in [0, 1] to eased progress.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) * 0.5
                }
            }
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::ElasticOut => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                2f64.powf(-10.0 * t) * ((t - 0.1) * 5.0 * std::f64::consts::PI).sin() + 1.0
            }
        }
    }
}

/// Field a tween writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenTarget {
    AttractorScale,
    AttractorOpacity,
    UnitOffsetY(UnitSide),
}

/// Follow-up action run when a tween finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenDone {
    /// Collapse the attractor visual to zero size after its fade-out.
    CollapseAttractor,
}

#[derive(Debug, Clone)]
pub struct Tween {
    target: TweenTarget,
    from: f64,
    to: f64,
    duration: f64,
    elapsed: f64,
    easing: Easing,
    on_done: Option<TweenDone>,
}

impl Tween {
    pub fn new(target: TweenTarget, from: f64, to: f64, duration: f64) -> Self {
        Self {
            target,
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            easing: Easing::Linear,
            on_done: None,
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn on_done(mut self, done: TweenDone) -> Self {
        self.on_done = Some(done);
        self
    }

    fn value(&self) -> f64 {
        let progress = if self.duration <= 0.0 {
            1.0
        } else {
            self.elapsed / self.duration
        };
        self.from + (self.to - self.from) * self.easing.apply(progress)
    }

    fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Active tweens. At most one tween runs per target; starting another
/// on the same target replaces it.
#[derive(Debug, Default)]
pub struct TweenSet {
    tweens: Vec<Tween>,
}

impl TweenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, tween: Tween) {
        self.tweens.retain(|t| t.target != tween.target);
        self.tweens.push(tween);
    }

    pub fn cancel(&mut self, target: TweenTarget) {
        self.tweens.retain(|t| t.target != target);
    }

    pub fn is_running(&self, target: TweenTarget) -> bool {
        self.tweens.iter().any(|t| t.target == target)
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Advance every tween by `dt` seconds, writing current values through
    /// `apply`. Returns the follow-up actions of tweens that finished.
    pub fn advance(&mut self, dt: f64, mut apply: impl FnMut(TweenTarget, f64)) -> Vec<TweenDone> {
        let mut done = Vec::new();
        let dt = dt.max(0.0);

        self.tweens.retain_mut(|tween| {
            tween.elapsed = (tween.elapsed + dt).min(tween.duration);
            apply(tween.target, tween.value());
            if tween.finished() {
                if let Some(action) = tween.on_done {
                    done.push(action);
                }
                return false;
            }
            true
        });

        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "Expected {} to be close to {}",
            actual,
            expected
        );
    }

    #[test]
    fn easings_hit_both_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::QuadraticInOut,
            Easing::CubicOut,
            Easing::ElasticOut,
        ] {
            assert_close(easing.apply(0.0), 0.0);
            assert_close(easing.apply(1.0), 1.0);
        }
    }

    #[test]
    fn cubic_out_front_loads_progress() {
        assert!(Easing::CubicOut.apply(0.5) > 0.5);
        assert_close(Easing::QuadraticInOut.apply(0.5), 0.5);
    }

    #[test]
    fn elastic_out_overshoots() {
        let max = (1..100)
            .map(|i| Easing::ElasticOut.apply(i as f64 / 100.0))
            .fold(f64::MIN, f64::max);
        assert!(max > 1.0);
    }

    #[test]
    fn tween_reaches_target_and_reports_done() {
        let mut set = TweenSet::new();
        set.start(
            Tween::new(TweenTarget::AttractorOpacity, 1.0, 0.0, 0.3)
                .on_done(TweenDone::CollapseAttractor),
        );

        let mut value = 1.0;
        let done = set.advance(0.1, |_, v| value = v);
        assert!(done.is_empty());
        assert_close(value, 2.0 / 3.0);

        let done = set.advance(0.5, |_, v| value = v);
        assert_eq!(done, vec![TweenDone::CollapseAttractor]);
        assert_close(value, 0.0);
        assert!(set.is_empty());
    }

    #[test]
    fn starting_same_target_replaces_running_tween() {
        let mut set = TweenSet::new();
        set.start(Tween::new(TweenTarget::AttractorScale, 0.0, 3.0, 0.3));
        set.start(Tween::new(TweenTarget::AttractorScale, 3.0, 12.0, 1.6));
        set.start(Tween::new(
            TweenTarget::UnitOffsetY(UnitSide::Left),
            0.0,
            6.5,
            1.8,
        ));
        assert_eq!(set.len(), 2);

        let mut scale = 0.0;
        set.advance(1.6, |target, v| {
            if target == TweenTarget::AttractorScale {
                scale = v;
            }
        });
        assert_close(scale, 12.0);
        assert!(!set.is_running(TweenTarget::AttractorScale));
        assert!(set.is_running(TweenTarget::UnitOffsetY(UnitSide::Left)));
    }

    #[test]
    fn zero_duration_tween_jumps_to_end() {
        let mut set = TweenSet::new();
        set.start(Tween::new(TweenTarget::AttractorScale, 1.0, 5.0, 0.0));
        let mut value = 0.0;
        set.advance(0.0, |_, v| value = v);
        assert_close(value, 5.0);
        assert!(set.is_empty());
    }
}
