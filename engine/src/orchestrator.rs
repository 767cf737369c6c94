//! Top-level scene state machine.
//!
//! RAIN -> ATTRACTING (pointer down) -> ABSORBING (pointer up) -> HEXAGRAM
//! (sky clear) -> RAIN (pointer down or timeout). The orchestrator owns every
//! component and drives them once per frame from `frame(now)`.

use hexrain_shared::config::SceneConfig;
use hexrain_shared::pattern::HexagramPattern;
use hexrain_shared::vec3::{add, Vec3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::info;

use crate::attractor::Attractor;
use crate::camera::ViewCamera;
use crate::events::{ParticleId, SceneEvent, SceneOutbox};
use crate::formation::{FormationUnit, UnitCompleted, UnitSide};
use crate::pool::{FormationActivity, ParticlePool};
use crate::timers::Timers;
use crate::tween::{Easing, Tween, TweenDone, TweenSet, TweenTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SceneState {
    Rain,
    Attracting,
    Absorbing,
    Hexagram,
}

/// Work scheduled while the hexagrams are showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceTask {
    StartFormation,
    ResetToRain,
}

/// Current state plus whatever that state owns. Leaving a state drops its
/// pending timers with it.
#[derive(Debug)]
enum Phase {
    Rain,
    Attracting,
    Absorbing { started_at: f64 },
    Hexagram { timers: Timers<SequenceTask> },
}

impl Phase {
    fn state(&self) -> SceneState {
        match self {
            Phase::Rain => SceneState::Rain,
            Phase::Attracting => SceneState::Attracting,
            Phase::Absorbing { .. } => SceneState::Absorbing,
            Phase::Hexagram { .. } => SceneState::Hexagram,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub x: f64,
    pub y: f64,
    pub down: bool,
}

/// The two units of one hexagram cycle and their completion signals.
struct FormationPair {
    left: FormationUnit,
    right: FormationUnit,
    left_done: Option<oneshot::Receiver<UnitCompleted>>,
    right_done: Option<oneshot::Receiver<UnitCompleted>>,
    completed: usize,
    rising: bool,
    next_side: UnitSide,
}

impl FormationPair {
    fn unit(&self, side: UnitSide) -> &FormationUnit {
        match side {
            UnitSide::Left => &self.left,
            UnitSide::Right => &self.right,
        }
    }

    fn unit_mut(&mut self, side: UnitSide) -> &mut FormationUnit {
        match side {
            UnitSide::Left => &mut self.left,
            UnitSide::Right => &mut self.right,
        }
    }

    /// Alternate sides, unless the side whose turn it is already has all it
    /// needs while the other does not.
    fn route(&mut self, id: ParticleId) {
        let mut side = self.next_side;
        if self.unit(side).deficit() == 0 && self.unit(side.other()).deficit() > 0 {
            side = side.other();
        }
        self.unit_mut(side).enqueue_particle(id);
        self.next_side = side.other();
    }

    /// Collect completion signals. Returns how many arrived this call.
    fn poll_completions(&mut self) -> usize {
        let mut arrived = 0;
        for slot in [&mut self.left_done, &mut self.right_done] {
            let Some(rx) = slot.as_mut() else {
                continue;
            };
            match rx.try_recv() {
                Ok(UnitCompleted { side }) => {
                    info!("{:?} hexagram reported completion", side);
                    arrived += 1;
                    *slot = None;
                }
                Err(TryRecvError::Closed) => *slot = None,
                Err(TryRecvError::Empty) => {}
            }
        }
        self.completed += arrived;
        arrived
    }

    fn activity(&self) -> FormationActivity {
        FormationActivity {
            any_animating: self.left.is_animating() || self.right.is_animating(),
            all_complete: self.left.is_complete() && self.right.is_complete(),
        }
    }

    fn dispose(&mut self, pool: &mut ParticlePool, events: &mut SceneOutbox) {
        for side in [UnitSide::Left, UnitSide::Right] {
            self.unit_mut(side).dispose(pool);
            events.push(SceneEvent::UnitDisposed { side });
        }
        self.left_done = None;
        self.right_done = None;
    }
}

pub struct Orchestrator {
    config: SceneConfig,
    left_pattern: HexagramPattern,
    right_pattern: HexagramPattern,
    camera: ViewCamera,
    pool: ParticlePool,
    attractor: Attractor,
    tweens: TweenSet,
    pair: Option<FormationPair>,
    phase: Phase,
    pointer: PointerState,
    rng: ChaCha8Rng,
    events: SceneOutbox,
    now: f64,
    last_frame: Option<f64>,
    rain_ready: bool,
}

impl Orchestrator {
    pub fn new(config: SceneConfig, seed: u64) -> Result<Self, String> {
        config.validate()?;
        let left_pattern = config.left_pattern()?;
        let right_pattern = config.right_pattern()?;

        Ok(Self {
            camera: ViewCamera::new(&config.camera),
            pool: ParticlePool::new(&config),
            attractor: Attractor::new(&config.attractor),
            left_pattern,
            right_pattern,
            config,
            tweens: TweenSet::new(),
            pair: None,
            phase: Phase::Rain,
            pointer: PointerState::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            events: SceneOutbox::default(),
            now: 0.0,
            last_frame: None,
            rain_ready: false,
        })
    }

    /// Start the rain. Called once the font gate opens; later calls are no-ops.
    pub fn init_rain(&mut self) {
        if self.rain_ready {
            return;
        }
        self.pool.init_rain(&self.camera, &mut self.rng);
        self.rain_ready = true;
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        if matches!(self.phase, Phase::Hexagram { .. }) {
            self.reset_to_rain();
            return;
        }

        self.pointer = PointerState { x, y, down: true };
        let previous = self.phase.state();
        self.phase = Phase::Attracting;

        // The attractor always sits at the viewport center
        let (cx, cy) = self.camera.viewport_center();
        self.attractor.activate(cx, cy, &self.camera, &mut self.tweens);
        info!("{:?} -> ATTRACTING", previous);
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if !self.pointer.down {
            return;
        }
        self.pointer.x = x;
        self.pointer.y = y;
    }

    pub fn pointer_up(&mut self) {
        if !self.pointer.down {
            return;
        }
        self.pointer.down = false;

        if matches!(self.phase, Phase::Attracting) {
            self.phase = Phase::Absorbing {
                started_at: self.now,
            };
            info!("ATTRACTING -> ABSORBING");
        }
    }

    pub fn pointer_cancel(&mut self) {
        self.pointer_up();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if self.camera.resize(width, height) {
            info!("Viewport resized to {}x{}", width, height);
        }
    }

    /// Advance the scene to time `now` (seconds, monotonic).
    pub fn frame(&mut self, now: f64) {
        let dt = self
            .last_frame
            .map(|last| (now - last).max(0.0))
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        self.now = now;

        self.advance_tweens(dt);

        // Transitions decided below take effect from the next frame
        let in_hexagram = matches!(self.phase, Phase::Hexagram { .. });

        if !in_hexagram {
            self.update_rain(now);
        }

        // Entering HEXAGRAM already emitted this frame's batch
        if in_hexagram {
            if let Some(pair) = self.pair.as_mut() {
                self.pool.pump_emission(&mut self.rng, |id| pair.route(id));
            }
        }
        let activity = self
            .pair
            .as_ref()
            .map(FormationPair::activity)
            .unwrap_or_default();
        self.pool.update_formation_particles(now, activity);

        if in_hexagram {
            self.update_units();
            self.run_due_tasks(now);
        }
    }

    fn update_rain(&mut self, now: f64) {
        let (attracting, absorb_elapsed) = match self.phase {
            Phase::Attracting => (true, None),
            Phase::Absorbing { started_at } => (true, Some(now - started_at)),
            _ => (false, None),
        };

        if attracting {
            self.attractor.update(None, &self.camera, now);
        }
        let attractor = if attracting {
            Some(&mut self.attractor)
        } else {
            None
        };
        self.pool
            .update_letters(attractor, absorb_elapsed, &self.camera, &mut self.rng);

        match self.phase.state() {
            SceneState::Rain if self.rain_ready => {
                self.pool.replenish(&self.camera, &mut self.rng);
            }
            SceneState::Absorbing if self.sky_is_clear() => self.show_double_hexagram(),
            _ => {}
        }
    }

    fn sky_is_clear(&self) -> bool {
        let sequence = &self.config.sequence;
        self.pool.letter_count() < sequence.max_remaining_letters
            && self
                .pool
                .count_letters_within(self.attractor.position(), self.attractor.near_radius())
                == 0
            && self.attractor.absorbed_count() > sequence.min_absorbed
    }

    fn advance_tweens(&mut self, dt: f64) {
        let Self {
            tweens,
            attractor,
            pair,
            ..
        } = self;

        let done = tweens.advance(dt, |target, value| match target {
            TweenTarget::AttractorScale => attractor.set_scale(value),
            TweenTarget::AttractorOpacity => attractor.set_opacity(value),
            TweenTarget::UnitOffsetY(side) => {
                if let Some(pair) = pair.as_mut() {
                    pair.unit_mut(side).set_position_y(value);
                }
            }
        });

        for action in done {
            match action {
                TweenDone::CollapseAttractor => self.attractor.collapse(&mut self.tweens),
            }
        }
    }

    fn update_units(&mut self) {
        let Some(pair) = self.pair.as_mut() else {
            return;
        };
        pair.left.update(&mut self.pool, &mut self.rng);
        pair.right.update(&mut self.pool, &mut self.rng);

        if pair.poll_completions() == 0 || pair.completed < 2 || pair.rising {
            return;
        }
        pair.rising = true;

        let sequence = &self.config.sequence;
        for side in [UnitSide::Left, UnitSide::Right] {
            self.tweens.start(
                Tween::new(
                    TweenTarget::UnitOffsetY(side),
                    pair.unit(side).position().y,
                    sequence.rise_target_y,
                    sequence.rise_secs,
                )
                .easing(Easing::CubicOut),
            );
        }
        info!("Both hexagrams formed, moving upward");
    }

    fn run_due_tasks(&mut self, now: f64) {
        let due = match &mut self.phase {
            Phase::Hexagram { timers } => timers.take_due(now),
            _ => return,
        };

        for task in due {
            match task {
                SequenceTask::StartFormation => {
                    if let Some(pair) = self.pair.as_mut() {
                        pair.left.start_formation();
                        pair.right.start_formation();
                    }
                }
                SequenceTask::ResetToRain => {
                    info!("Hexagram timeout");
                    self.reset_to_rain();
                    break;
                }
            }
        }
    }

    /// Enter HEXAGRAM: expand the attractor, replace any previous units with
    /// a fresh pair and start streaming particles into them.
    pub fn show_double_hexagram(&mut self) {
        if matches!(self.phase, Phase::Hexagram { .. }) {
            return;
        }
        let previous = self.phase.state();
        let now = self.now;

        self.attractor.expand_to_hexagram(&mut self.tweens);

        if let Some(mut old) = self.pair.take() {
            old.dispose(&mut self.pool, &mut self.events);
        }

        let center = self.attractor.position();
        let offset = self.config.sequence.unit_offset_x;
        let (left, left_done) = FormationUnit::new(
            UnitSide::Left,
            add(center, Vec3::new(-offset, 0.0, 0.0)),
            &self.left_pattern,
            &self.config.formation,
        );
        let (right, right_done) = FormationUnit::new(
            UnitSide::Right,
            add(center, Vec3::new(offset, 0.0, 0.0)),
            &self.right_pattern,
            &self.config.formation,
        );

        let fallback = self.config.emission.fallback_per_unit;
        let or_fallback = |needed: usize| if needed == 0 { fallback } else { needed };
        let total = or_fallback(left.total_particles_needed()) + or_fallback(right.total_particles_needed());

        let mut pair = FormationPair {
            left,
            right,
            left_done: Some(left_done),
            right_done: Some(right_done),
            completed: 0,
            rising: false,
            next_side: UnitSide::Right,
        };
        self.events.push(SceneEvent::UnitCreated {
            side: UnitSide::Left,
        });
        self.events.push(SceneEvent::UnitCreated {
            side: UnitSide::Right,
        });

        let sequence = &self.config.sequence;
        let mut timers = Timers::new();
        timers.schedule_after(now, sequence.formation_start_delay_secs, SequenceTask::StartFormation);
        timers.schedule_after(now, sequence.hexagram_timeout_secs, SequenceTask::ResetToRain);
        self.phase = Phase::Hexagram { timers };

        info!(
            "{:?} -> HEXAGRAM after absorbing {} letters",
            previous,
            self.attractor.absorbed_count()
        );
        self.pool
            .emit_formation_particles(center, total, now, &mut self.rng, |id| pair.route(id));
        self.pair = Some(pair);
    }

    /// Return to RAIN. Pending HEXAGRAM tasks are dropped with the old state.
    pub fn reset_to_rain(&mut self) {
        let previous = self.phase.state();
        self.phase = Phase::Rain;

        if let Some(pair) = self.pair.as_mut() {
            pair.left.hide();
            pair.right.hide();
        }
        self.pool.cancel_emission();
        let absorbed = self.attractor.deactivate(&mut self.tweens);
        info!("{:?} -> RAIN ({} letters absorbed)", previous, absorbed);
    }

    pub fn state(&self) -> SceneState {
        self.phase.state()
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn attractor(&self) -> &Attractor {
        &self.attractor
    }

    pub fn camera(&self) -> &ViewCamera {
        &self.camera
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn unit(&self, side: UnitSide) -> Option<&FormationUnit> {
        self.pair.as_ref().map(|pair| pair.unit(side))
    }

    /// Units that have reported completion in the current cycle
    pub fn completed_units(&self) -> usize {
        self.pair.as_ref().map_or(0, |pair| pair.completed)
    }

    pub fn is_rising(&self) -> bool {
        self.pair.as_ref().is_some_and(|pair| pair.rising)
    }

    /// Both units have formed and finished rising
    pub fn is_settled(&self) -> bool {
        self.is_rising()
            && !self.tweens.is_running(TweenTarget::UnitOffsetY(UnitSide::Left))
            && !self.tweens.is_running(TweenTarget::UnitOffsetY(UnitSide::Right))
    }

    pub fn pending_timer_count(&self) -> usize {
        match &self.phase {
            Phase::Hexagram { timers } => timers.len(),
            _ => 0,
        }
    }

    pub fn is_rain_ready(&self) -> bool {
        self.rain_ready
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// Scene changes since the last call, pool changes first.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        let mut events = self.pool.drain_events();
        events.extend(self.events.drain());
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(SceneConfig::default(), 42).unwrap()
    }

    fn press_center(o: &mut Orchestrator) {
        let (cx, cy) = o.camera().viewport_center();
        o.pointer_down(cx, cy);
    }

    /// Give `side` exactly what it still lacks, bypassing the alternating
    /// router so the other unit gets nothing.
    fn supply_one_side(o: &mut Orchestrator, side: UnitSide) {
        let Orchestrator { pool, pair, rng, .. } = o;
        let unit = pair.as_mut().unwrap().unit_mut(side);
        let count = unit.deficit();
        pool.emit_formation_particles(unit.position(), count, 0.0, rng, |id| unit.enqueue_particle(id));
        while pool.is_emitting() {
            pool.pump_emission(rng, |id| unit.enqueue_particle(id));
        }
    }

    /// Step in 10 ms frames from `now` until `done` holds. Returns the time reached.
    fn step_until(o: &mut Orchestrator, mut now: f64, done: impl Fn(&Orchestrator) -> bool) -> f64 {
        for _ in 0..20_000 {
            if done(o) {
                break;
            }
            now += 0.01;
            o.frame(now);
        }
        now
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SceneConfig::default();
        config.sequence.right_pattern = vec![2, 0, 0, 0, 0, 0];
        let err = Orchestrator::new(config, 1).err().unwrap();
        assert!(err.starts_with("right_pattern"));
    }

    #[test]
    fn pointer_down_and_up_walk_into_absorbing() {
        let mut o = orchestrator();
        o.init_rain();
        assert_eq!(o.state(), SceneState::Rain);

        press_center(&mut o);
        assert_eq!(o.state(), SceneState::Attracting);
        assert!(o.attractor().is_active());
        assert!(o.attractor().position().x.abs() < 1e-9);

        o.frame(0.1);
        o.pointer_up();
        assert_eq!(o.state(), SceneState::Absorbing);
    }

    #[test]
    fn pointer_up_without_press_is_ignored() {
        let mut o = orchestrator();
        o.pointer_up();
        o.pointer_cancel();
        assert_eq!(o.state(), SceneState::Rain);
    }

    #[test]
    fn pointer_move_only_tracks_while_down() {
        let mut o = orchestrator();
        o.pointer_move(5.0, 5.0);
        assert_eq!(o.pointer(), PointerState::default());

        o.pointer_down(1.0, 2.0);
        o.pointer_move(5.0, 6.0);
        assert_eq!(
            o.pointer(),
            PointerState {
                x: 5.0,
                y: 6.0,
                down: true
            }
        );
    }

    #[test]
    fn hexagram_owns_two_timers() {
        let mut o = orchestrator();
        press_center(&mut o);
        o.show_double_hexagram();
        assert_eq!(o.state(), SceneState::Hexagram);
        assert_eq!(o.pending_timer_count(), 2);

        o.show_double_hexagram();
        assert_eq!(o.pending_timer_count(), 2);
    }

    #[test]
    fn routing_gives_each_unit_its_share() {
        let mut o = orchestrator();
        press_center(&mut o);
        o.show_double_hexagram();
        for i in 1..400 {
            o.frame(i as f64 / 60.0);
            if !o.pool().is_emitting() {
                break;
            }
        }

        let left = o.unit(UnitSide::Left).unwrap();
        let right = o.unit(UnitSide::Right).unwrap();
        assert_eq!(left.deficit(), 0);
        assert_eq!(right.deficit(), 0);
        assert_eq!(
            o.pool().formation_particle_count(),
            left.total_particles_needed() + right.total_particles_needed()
        );
    }

    #[test]
    fn formation_starts_after_delay() {
        let mut o = orchestrator();
        press_center(&mut o);
        o.frame(0.0);
        o.show_double_hexagram();

        o.frame(0.5);
        assert!(!o.unit(UnitSide::Left).unwrap().is_animating());
        o.frame(1.0);
        assert!(o.unit(UnitSide::Left).unwrap().is_animating());
        assert!(o.unit(UnitSide::Right).unwrap().is_animating());
        assert_eq!(o.pending_timer_count(), 1);
    }

    #[test]
    fn timeout_returns_to_rain() {
        let mut o = orchestrator();
        press_center(&mut o);
        o.frame(0.0);
        o.show_double_hexagram();

        o.frame(14.9);
        assert_eq!(o.state(), SceneState::Hexagram);
        o.frame(15.1);
        assert_eq!(o.state(), SceneState::Rain);
        assert_eq!(o.pending_timer_count(), 0);
        assert!(!o.attractor().is_active());
    }

    #[test]
    fn transition_frame_emits_a_single_batch() {
        let mut o = orchestrator();
        press_center(&mut o);
        o.frame(0.0);
        o.pointer_up();
        o.attractor.record_absorbed(10);

        o.frame(0.1);
        assert_eq!(o.state(), SceneState::Hexagram);
        assert_eq!(o.pool().formation_particle_count(), 5);

        o.frame(0.2);
        assert_eq!(o.pool().formation_particle_count(), 10);
    }

    #[test]
    fn rise_waits_for_both_units() {
        let mut config = SceneConfig::default();
        config.sequence.hexagram_timeout_secs = 1000.0;
        let mut o = Orchestrator::new(config, 42).unwrap();
        press_center(&mut o);
        o.frame(0.0);
        o.show_double_hexagram();
        o.pool.cancel_emission();

        supply_one_side(&mut o, UnitSide::Left);
        assert!(o.unit(UnitSide::Right).unwrap().deficit() > 0);
        let left_y = o.unit(UnitSide::Left).unwrap().position().y;
        let right_y = o.unit(UnitSide::Right).unwrap().position().y;

        let now = step_until(&mut o, 0.0, |o| o.completed_units() > 0);
        assert!(o.unit(UnitSide::Left).unwrap().is_complete());
        let now = step_until(&mut o, now, |o| o.now() > now + 1.0);

        assert_eq!(o.completed_units(), 1);
        assert!(!o.is_rising());
        assert!(o.unit(UnitSide::Right).unwrap().is_animating());
        assert_eq!(o.unit(UnitSide::Left).unwrap().position().y, left_y);
        assert_eq!(o.unit(UnitSide::Right).unwrap().position().y, right_y);

        supply_one_side(&mut o, UnitSide::Right);
        step_until(&mut o, now, |o| o.completed_units() == 2);
        assert_eq!(o.completed_units(), 2);
        assert!(o.is_rising());
    }

    #[test]
    fn new_cycle_disposes_previous_units() {
        let mut o = orchestrator();
        press_center(&mut o);
        o.frame(0.0);
        o.show_double_hexagram();
        for i in 1..200 {
            o.frame(i as f64 / 60.0);
        }
        let first_cycle = o.pool().formation_particle_count();
        assert!(first_cycle > 0);

        press_center(&mut o);
        assert_eq!(o.state(), SceneState::Rain);
        press_center(&mut o);
        o.show_double_hexagram();
        o.drain_events();

        // Only the first batch of the new emission is alive
        assert_eq!(o.pool().formation_particle_count(), 5);
    }
}
