use hexrain_shared::config::AttractorConfig;
use hexrain_shared::vec3::Vec3;
use tracing::debug;

use crate::camera::ViewCamera;
use crate::tween::{Easing, Tween, TweenDone, TweenSet, TweenTarget};

/// The attraction point. Created once and re-activated for every
/// attraction cycle; `absorbed_count` restarts at each activation.
#[derive(Debug, Clone)]
pub struct Attractor {
    config: AttractorConfig,
    position: Vec3,
    active: bool,
    pulsing: bool,
    absorbed_count: u32,
    /// Tweened visual size
    scale: f64,
    /// Tweened visual opacity
    opacity: f64,
    /// Breathing multiplier on top of `scale`
    pulse_factor: f64,
}

impl Attractor {
    pub fn new(config: &AttractorConfig) -> Self {
        Self {
            config: config.clone(),
            position: Vec3::ZERO,
            active: false,
            pulsing: false,
            absorbed_count: 0,
            scale: 0.0,
            opacity: 0.0,
            pulse_factor: 1.0,
        }
    }

    /// Activate at a screen anchor and start the appear transition.
    pub fn activate(&mut self, screen_x: f64, screen_y: f64, camera: &ViewCamera, tweens: &mut TweenSet) {
        self.place(camera.unproject(screen_x, screen_y));

        tweens.start(
            Tween::new(TweenTarget::AttractorScale, self.scale, self.config.base_scale, self.config.appear_secs)
                .easing(Easing::ElasticOut),
        );
        tweens.start(Tween::new(
            TweenTarget::AttractorOpacity,
            self.opacity,
            self.config.opacity,
            self.config.fade_in_secs,
        ));
        debug!(
            "Attractor active at ({:.2}, {:.2})",
            self.position.x, self.position.y
        );
    }

    /// Activate at a scene position without any visual transition.
    pub fn place(&mut self, position: Vec3) {
        self.position = position;
        self.active = true;
        self.pulsing = true;
        self.absorbed_count = 0;
        self.pulse_factor = 1.0;
    }

    /// Per-frame update. Re-projects the anchor when one is given and
    /// advances the breathing pulse.
    pub fn update(&mut self, anchor: Option<(f64, f64)>, camera: &ViewCamera, now: f64) {
        if !self.active {
            return;
        }
        if let Some((x, y)) = anchor {
            self.position = camera.unproject(x, y);
        }
        self.pulse_factor = if self.pulsing {
            1.0 + (now * self.config.pulse_rate).sin() * self.config.pulse_amplitude
        } else {
            1.0
        };
    }

    /// Deactivate and fade out. Returns the letters absorbed during this
    /// activation.
    pub fn deactivate(&mut self, tweens: &mut TweenSet) -> u32 {
        self.active = false;
        self.pulsing = false;
        self.pulse_factor = 1.0;

        tweens.start(
            Tween::new(TweenTarget::AttractorOpacity, self.opacity, 0.0, self.config.fade_out_secs)
                .on_done(TweenDone::CollapseAttractor),
        );
        self.absorbed_count
    }

    /// Stop pulsing and swell outwards while fading to nothing.
    pub fn expand_to_hexagram(&mut self, tweens: &mut TweenSet) {
        self.pulsing = false;
        self.pulse_factor = 1.0;

        tweens.start(
            Tween::new(
                TweenTarget::AttractorScale,
                self.scale,
                self.config.expand_scale,
                self.config.expand_secs,
            )
            .easing(Easing::CubicOut),
        );
        tweens.start(
            Tween::new(TweenTarget::AttractorOpacity, self.opacity, 0.0, self.config.expand_secs)
                .easing(Easing::QuadraticInOut),
        );
    }

    pub fn record_absorbed(&mut self, count: u32) {
        self.absorbed_count += count;
    }

    pub(crate) fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub(crate) fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity;
    }

    /// Shrink the visual to nothing once it has faded out.
    pub fn collapse(&mut self, tweens: &mut TweenSet) {
        tweens.cancel(TweenTarget::AttractorScale);
        self.scale = 0.0;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn radius(&self) -> f64 {
        self.config.radius
    }

    pub fn near_radius(&self) -> f64 {
        self.config.radius * self.config.near_radius_factor
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_pulsing(&self) -> bool {
        self.pulsing
    }

    pub fn absorbed_count(&self) -> u32 {
        self.absorbed_count
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Scale including the breathing pulse, for rendering
    pub fn visual_scale(&self) -> f64 {
        self.scale * self.pulse_factor
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexrain_shared::config::CameraConfig;

    fn run(attractor: &mut Attractor, tweens: &mut TweenSet, secs: f64) {
        let mut done = Vec::new();
        for _ in 0..(secs * 60.0).ceil() as usize {
            done.extend(tweens.advance(1.0 / 60.0, |target, value| match target {
                TweenTarget::AttractorScale => attractor.set_scale(value),
                TweenTarget::AttractorOpacity => attractor.set_opacity(value),
                TweenTarget::UnitOffsetY(_) => {}
            }));
        }
        if done.contains(&TweenDone::CollapseAttractor) {
            attractor.collapse(tweens);
        }
    }

    #[test]
    fn activation_at_viewport_center_sits_at_origin() {
        let camera = ViewCamera::new(&CameraConfig::default());
        let mut tweens = TweenSet::new();
        let mut attractor = Attractor::new(&AttractorConfig::default());
        let (cx, cy) = camera.viewport_center();

        attractor.activate(cx, cy, &camera, &mut tweens);
        assert!(attractor.is_active());
        assert!(attractor.is_pulsing());
        assert!(attractor.position().x.abs() < 1e-9);
        assert!(attractor.position().y.abs() < 1e-9);

        run(&mut attractor, &mut tweens, 0.4);
        assert!((attractor.scale() - 3.0).abs() < 1e-9);
        assert!((attractor.opacity() - 0.85).abs() < 1e-9);
    }

    #[test]
    fn activation_resets_absorbed_count() {
        let mut attractor = Attractor::new(&AttractorConfig::default());
        attractor.place(Vec3::ZERO);
        attractor.record_absorbed(4);
        attractor.place(Vec3::ZERO);
        assert_eq!(attractor.absorbed_count(), 0);
    }

    #[test]
    fn pulse_breathes_only_while_pulsing() {
        let camera = ViewCamera::new(&CameraConfig::default());
        let mut tweens = TweenSet::new();
        let mut attractor = Attractor::new(&AttractorConfig::default());
        attractor.place(Vec3::ZERO);
        attractor.set_scale(3.0);

        let quarter_period = std::f64::consts::FRAC_PI_2 / 5.0;
        attractor.update(None, &camera, quarter_period);
        assert!((attractor.visual_scale() - 3.3).abs() < 1e-9);

        attractor.expand_to_hexagram(&mut tweens);
        attractor.update(None, &camera, quarter_period);
        assert!((attractor.visual_scale() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn deactivate_returns_count_and_collapses_visual() {
        let mut tweens = TweenSet::new();
        let mut attractor = Attractor::new(&AttractorConfig::default());
        attractor.place(Vec3::ZERO);
        attractor.set_scale(3.0);
        attractor.set_opacity(0.85);
        attractor.record_absorbed(9);

        assert_eq!(attractor.deactivate(&mut tweens), 9);
        assert!(!attractor.is_active());
        assert!(!attractor.is_pulsing());

        run(&mut attractor, &mut tweens, 0.35);
        assert_eq!(attractor.opacity(), 0.0);
        assert_eq!(attractor.scale(), 0.0);
    }

    #[test]
    fn expansion_grows_and_fades() {
        let mut tweens = TweenSet::new();
        let mut attractor = Attractor::new(&AttractorConfig::default());
        attractor.place(Vec3::ZERO);
        attractor.set_scale(3.0);
        attractor.set_opacity(0.85);

        attractor.expand_to_hexagram(&mut tweens);
        assert!(attractor.is_active());
        run(&mut attractor, &mut tweens, 1.7);
        assert!((attractor.scale() - 12.0).abs() < 1e-9);
        assert!(attractor.opacity().abs() < 1e-9);
    }

    #[test]
    fn inactive_update_is_ignored() {
        let camera = ViewCamera::new(&CameraConfig::default());
        let mut attractor = Attractor::new(&AttractorConfig::default());
        attractor.update(Some((0.0, 0.0)), &camera, 1.0);
        assert_eq!(attractor.position(), Vec3::ZERO);
    }
}
