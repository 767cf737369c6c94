//! Symbol formation: a unit arranges queued formation particles into a
//! hexagram, one line at a time from the bottom up.

use std::collections::VecDeque;

use hexrain_shared::config::FormationConfig;
use hexrain_shared::pattern::{HexagramPattern, LineKind};
use hexrain_shared::vec3::Vec3;
use rand::Rng;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::events::ParticleId;
use crate::pool::ParticlePool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitSide {
    Left,
    Right,
}

impl UnitSide {
    pub fn other(self) -> Self {
        match self {
            UnitSide::Left => UnitSide::Right,
            UnitSide::Right => UnitSide::Left,
        }
    }
}

/// Fractional span along a line's width, 0 = left edge, 1 = right edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

/// One line of the hexagram
#[derive(Debug, Clone, PartialEq)]
pub struct FormationLine {
    pub kind: LineKind,
    /// Offset of the line center from the unit position
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
    pub segments: Vec<Segment>,
    /// Particles required to draw the line
    pub needed: usize,
    /// Particles assigned so far, in assignment order
    pub particles: Vec<ParticleId>,
    pub active: bool,
    pub formed: bool,
    /// Opacity of the line visual, grows with the locked fraction
    pub brightness: f64,
}

impl FormationLine {
    fn new(kind: LineKind, offset_y: f64, config: &FormationConfig) -> Self {
        let width = config.line_width;
        let (segments, needed) = match kind {
            LineKind::Yang => {
                let needed = (width * config.density).floor() as usize;
                (vec![Segment { start: 0.0, end: 1.0 }], needed)
            }
            LineKind::Yin => {
                let left_end = (1.0 - config.yin_gap) / 2.0;
                let per_half = (left_end * config.density * width).floor() as usize;
                (
                    vec![
                        Segment {
                            start: 0.0,
                            end: left_end,
                        },
                        Segment {
                            start: 1.0 - left_end,
                            end: 1.0,
                        },
                    ],
                    per_half * 2,
                )
            }
        };

        Self {
            kind,
            offset_x: 0.0,
            offset_y,
            width,
            segments,
            needed,
            particles: Vec::new(),
            active: false,
            formed: false,
            brightness: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitPhase {
    Idle,
    /// Line `line` is collecting and steering particles
    Animating { line: usize },
    Complete,
}

/// Sent once when every line of a unit has formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitCompleted {
    pub side: UnitSide,
}

pub struct FormationUnit {
    side: UnitSide,
    config: FormationConfig,
    position: Vec3,
    /// Position y at the last update, for rigid vertical moves
    prev_y: f64,
    lines: Vec<FormationLine>,
    queue: VecDeque<ParticleId>,
    /// Every particle ever enqueued, for disposal
    used: Vec<ParticleId>,
    phase: UnitPhase,
    completion: Option<oneshot::Sender<UnitCompleted>>,
    disposed: bool,
}

impl FormationUnit {
    /// Build a unit centred on `position`. The receiver resolves when the
    /// unit completes, or errors if the unit is disposed first.
    pub fn new(
        side: UnitSide,
        position: Vec3,
        pattern: &HexagramPattern,
        config: &FormationConfig,
    ) -> (Self, oneshot::Receiver<UnitCompleted>) {
        let count = pattern.lines().len();
        let start_y = -((count.saturating_sub(1)) as f64) * config.line_spacing / 2.0;
        let lines: Vec<FormationLine> = pattern
            .lines()
            .iter()
            .enumerate()
            .map(|(i, kind)| FormationLine::new(*kind, start_y + i as f64 * config.line_spacing, config))
            .collect();

        let (tx, rx) = oneshot::channel();
        let unit = Self {
            side,
            config: config.clone(),
            position,
            prev_y: position.y,
            lines,
            queue: VecDeque::new(),
            used: Vec::new(),
            phase: UnitPhase::Idle,
            completion: Some(tx),
            disposed: false,
        };
        info!(
            "{:?} hexagram requires {} particles",
            side,
            unit.total_particles_needed()
        );
        (unit, rx)
    }

    pub fn total_particles_needed(&self) -> usize {
        self.lines.iter().map(|l| l.needed).sum()
    }

    /// Hand a particle to the unit. It gets a target only once the active
    /// line pulls it from the queue.
    pub fn enqueue_particle(&mut self, id: ParticleId) {
        if self.disposed {
            return;
        }
        self.queue.push_back(id);
        self.used.push(id);
    }

    /// Activate the first line. No-op unless idle.
    pub fn start_formation(&mut self) {
        if self.phase != UnitPhase::Idle {
            return;
        }
        info!("{:?} hexagram formation begins", self.side);
        self.activate_line(0);
    }

    fn activate_line(&mut self, index: usize) {
        match self.lines.get_mut(index) {
            Some(line) => {
                line.active = true;
                line.formed = false;
                self.phase = UnitPhase::Animating { line: index };
                debug!("{:?} hexagram line {} activated", self.side, index + 1);
            }
            None => self.complete(),
        }
    }

    fn complete(&mut self) {
        self.phase = UnitPhase::Complete;
        if let Some(tx) = self.completion.take() {
            info!("{:?} hexagram fully formed", self.side);
            let _ = tx.send(UnitCompleted { side: self.side });
        }
    }

    /// Per-frame step: follow the unit's vertical moves, then feed and steer
    /// the active line.
    pub fn update(&mut self, pool: &mut ParticlePool, rng: &mut impl Rng) {
        let dy = self.position.y - self.prev_y;
        if dy != 0.0 {
            for id in self.lines.iter().flat_map(|l| l.particles.iter()) {
                if let Some(p) = pool.particle_mut(*id) {
                    p.position.y += dy;
                    if let Some(target) = p.target.as_mut() {
                        target.y += dy;
                    }
                }
            }
            self.prev_y = self.position.y;
        }

        let UnitPhase::Animating { line: index } = self.phase else {
            return;
        };

        self.assign_queued(index, pool, rng);
        let locked = self.steer_line(index, pool);

        let cfg = &self.config;
        let line = &mut self.lines[index];
        line.brightness = if line.needed == 0 {
            cfg.brightness_max
        } else {
            (locked as f64 / line.needed as f64).powf(cfg.brightness_exponent) * cfg.brightness_max
        };

        if locked as f64 >= line.needed as f64 * cfg.formed_fraction {
            line.formed = true;
            line.active = false;
            info!("{:?} hexagram line {} formed", self.side, index + 1);
            self.activate_line(index + 1);
        }
    }

    /// Give queued particles a target on line `index`, a few per frame.
    fn assign_queued(&mut self, index: usize, pool: &mut ParticlePool, rng: &mut impl Rng) {
        let center = self.position;
        let cfg = &self.config;
        let line = &mut self.lines[index];

        let remaining = line.needed.saturating_sub(line.particles.len());
        let take = remaining.min(self.queue.len()).min(cfg.assign_per_frame);

        for _ in 0..take {
            let Some(id) = self.queue.pop_front() else {
                break;
            };
            let Some(particle) = pool.particle_mut(id) else {
                continue;
            };

            let t = line.particles.len() as f64 / line.needed as f64;
            let segment = if line.segments.len() == 1 || rng.gen::<f64>() < 0.5 {
                line.segments[0]
            } else {
                line.segments[1]
            };
            let seg_t = segment.start + t * (segment.end - segment.start);

            particle.target = Some(Vec3::new(
                center.x + line.offset_x - line.width / 2.0 + seg_t * line.width,
                center.y + line.offset_y + (rng.gen::<f64>() - 0.5) * cfg.target_jitter_y,
                center.z,
            ));
            particle.lock_progress = 0.0;
            line.particles.push(id);
        }
    }

    /// Move the particles of line `index` toward their targets. Returns how
    /// many are locked.
    fn steer_line(&mut self, index: usize, pool: &mut ParticlePool) -> usize {
        let cfg = &self.config;
        let mut locked = 0;

        for id in &self.lines[index].particles {
            let Some(p) = pool.particle_mut(*id) else {
                continue;
            };
            let Some(target) = p.target else {
                continue;
            };

            p.lock_progress = (p.lock_progress + p.motion.speed).min(1.0);
            let t = p.lock_progress;
            let ease = t.powf(1.5) * (2.0 - t);

            p.motion.noise_phase_x += cfg.noise_step_x;
            p.motion.noise_phase_y += cfg.noise_step_y;
            let noise_x = p.motion.noise_phase_x.sin() * p.motion.noise_amp;
            let noise_y = p.motion.noise_phase_y.cos() * p.motion.noise_amp;

            p.position.x += (target.x - p.position.x) * (cfg.approach_x_base + ease * cfg.approach_x_gain) + noise_x;
            p.position.y += (target.y - p.position.y) * (cfg.approach_y_base + ease * cfg.approach_y_gain) + noise_y;
            p.opacity = (p.opacity + cfg.opacity_step).min(1.0);

            if t > cfg.lock_threshold {
                locked += 1;
            }
        }
        locked
    }

    /// Blank the line visuals. Particles and progress are kept.
    pub fn hide(&mut self) {
        for line in &mut self.lines {
            line.brightness = 0.0;
        }
    }

    /// Tear the unit down: remove every particle it was given from the pool
    /// and drop the completion signal unsent. Safe to call twice.
    pub fn dispose(&mut self, pool: &mut ParticlePool) {
        if self.disposed {
            return;
        }
        for id in self.used.drain(..) {
            pool.remove_formation_particle(id);
        }
        self.lines.clear();
        self.queue.clear();
        self.completion = None;
        self.phase = UnitPhase::Complete;
        self.disposed = true;
        debug!("{:?} hexagram disposed", self.side);
    }

    pub fn set_position_y(&mut self, y: f64) {
        self.position.y = y;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn side(&self) -> UnitSide {
        self.side
    }

    pub fn lines(&self) -> &[FormationLine] {
        &self.lines
    }

    pub fn phase(&self) -> UnitPhase {
        self.phase
    }

    pub fn active_line(&self) -> Option<usize> {
        match self.phase {
            UnitPhase::Animating { line } => Some(line),
            _ => None,
        }
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Particles already given a line
    pub fn assigned_particles(&self) -> usize {
        self.lines.iter().map(|l| l.particles.len()).sum()
    }

    /// Particles still missing before every line has its full share
    pub fn deficit(&self) -> usize {
        self.total_particles_needed().saturating_sub(self.used.len())
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.phase, UnitPhase::Animating { .. })
    }

    pub fn is_complete(&self) -> bool {
        self.phase == UnitPhase::Complete
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
