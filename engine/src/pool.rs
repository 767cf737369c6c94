//! Particle pool: falling-letter columns and formation particles.
//!
//! All scene-space quantities are per frame; the pool never looks at wall
//! time except for the formation fade-in delay.

use std::collections::HashMap;

use hexrain_shared::config::{AttractionConfig, EmissionConfig, FormationConfig, RainConfig, SceneConfig};
use hexrain_shared::vec3::{add, clamp_length, distance_xy, length_xy, scale, sub, Vec3};
use rand::Rng;
use tracing::{debug, info};

use crate::attractor::Attractor;
use crate::camera::ViewCamera;
use crate::events::{LetterId, ParticleId, SceneEvent, SceneOutbox};

const TAU: f64 = std::f64::consts::PI * 2.0;

/// One glyph of a falling column
#[derive(Debug, Clone, PartialEq)]
pub struct Letter {
    pub id: LetterId,
    pub glyph: char,
    /// Base alpha for the renderer; later glyphs of a column are brighter
    pub alpha: f64,
    pub position: Vec3,
    pub velocity: Vec3,
    pub original_velocity: Vec3,
}

/// Letters spawned together from one source line
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub letters: Vec<Letter>,
    pub origin_x: f64,
}

/// Per-particle convergence parameters, drawn when the particle is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationMotion {
    /// Lock progress gained per frame
    pub speed: f64,
    pub noise_phase_x: f64,
    pub noise_phase_y: f64,
    pub noise_amp: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormationParticle {
    pub id: ParticleId,
    pub position: Vec3,
    pub velocity: Vec3,
    /// 0..1, advanced by the pool after the emission delay
    pub fade_in: f64,
    pub opacity: f64,
    /// Set once a formation unit assigns the particle to a line
    pub target: Option<Vec3>,
    /// 0..1 progress toward `target`; never decreases
    pub lock_progress: f64,
    pub motion: FormationMotion,
}

/// What the formation units are doing this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormationActivity {
    /// Some unit is currently steering particles
    pub any_animating: bool,
    /// Every unit has finished; particles stay where they are
    pub all_complete: bool,
}

#[derive(Debug, Clone, Copy)]
struct Emission {
    center: Vec3,
    remaining: usize,
}

pub struct ParticlePool {
    rain: RainConfig,
    attraction: AttractionConfig,
    emission_config: EmissionConfig,
    formation: FormationConfig,
    columns: Vec<Column>,
    particles: HashMap<ParticleId, FormationParticle>,
    emission: Option<Emission>,
    /// Scene time of the last emission start
    emitted_at: Option<f64>,
    next_letter_id: u64,
    next_particle_id: u64,
    outbox: SceneOutbox,
}

impl ParticlePool {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            rain: config.rain.clone(),
            attraction: config.attraction.clone(),
            emission_config: config.emission.clone(),
            formation: config.formation.clone(),
            columns: Vec::new(),
            particles: HashMap::new(),
            emission: None,
            emitted_at: None,
            next_letter_id: 1,
            next_particle_id: 1,
            outbox: SceneOutbox::default(),
        }
    }

    /// Column cap for the current viewport
    pub fn max_columns(&self, camera: &ViewCamera) -> usize {
        if camera.is_narrow(self.rain.narrow_viewport_width) {
            self.rain.max_columns_narrow
        } else {
            self.rain.max_columns
        }
    }

    /// Fill the sky with the full column budget. Returns the letter count.
    pub fn init_rain(&mut self, camera: &ViewCamera, rng: &mut impl Rng) -> usize {
        let target = self.max_columns(camera);
        while self.columns.len() < target {
            if self.spawn_column(None, None, camera, rng) == 0 {
                break;
            }
        }
        let total = self.letter_count();
        info!("Rain ready: {} falling letters in {} columns", total, self.columns.len());
        total
    }

    /// Spawn at most one column above the view when below the column budget.
    pub fn replenish(&mut self, camera: &ViewCamera, rng: &mut impl Rng) -> bool {
        if self.columns.len() >= self.max_columns(camera) {
            return false;
        }
        let top = camera.frustum_height() * 0.5 + rng.gen::<f64>() * self.rain.respawn_height;
        self.spawn_column(None, Some(top), camera, rng) > 0
    }

    /// Spawn a column from a random source line. `x`/`y` default to a random
    /// spot spread around the view. Returns the number of letters created.
    pub fn spawn_column(
        &mut self,
        x: Option<f64>,
        y: Option<f64>,
        camera: &ViewCamera,
        rng: &mut impl Rng,
    ) -> usize {
        if self.rain.lines.is_empty() {
            return 0;
        }
        let index = rng.gen_range(0..self.rain.lines.len());
        let line = self.rain.lines[index].clone();
        self.spawn_column_from(&line, x, y, camera, rng)
    }

    /// Spawn a column from `text`. Whitespace is dropped and long lines are
    /// truncated; text with no glyphs spawns nothing.
    pub fn spawn_column_from(
        &mut self,
        text: &str,
        x: Option<f64>,
        y: Option<f64>,
        camera: &ViewCamera,
        rng: &mut impl Rng,
    ) -> usize {
        let glyphs: Vec<char> = text
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .take(self.rain.max_line_chars)
            .collect();
        if glyphs.is_empty() {
            return 0;
        }

        let column_x =
            x.unwrap_or_else(|| (rng.gen::<f64>() - 0.5) * camera.frustum_width() * self.rain.column_spread_x);
        let start_y =
            y.unwrap_or_else(|| (rng.gen::<f64>() - 0.5) * camera.frustum_height() * self.rain.column_spread_y);

        let total = glyphs.len();
        let mut letters = Vec::with_capacity(total);
        for (i, glyph) in glyphs.into_iter().enumerate() {
            let id = LetterId(self.next_letter_id);
            self.next_letter_id += 1;

            let position = Vec3::new(
                column_x + (rng.gen::<f64>() - 0.5) * self.rain.letter_jitter_x,
                start_y - i as f64 * self.rain.letter_spacing,
                rng.gen::<f64>() * -self.rain.letter_depth,
            );
            let velocity = Vec3::new(
                (rng.gen::<f64>() - 0.5) * self.rain.drift_x,
                -self.rain.fall_speed_min - rng.gen::<f64>() * self.rain.fall_speed_jitter,
                0.0,
            );
            let alpha = 0.5 + (i as f64 / total as f64) * 0.5;

            self.outbox.push(SceneEvent::LetterSpawned { id, glyph, alpha });
            letters.push(Letter {
                id,
                glyph,
                alpha,
                position,
                velocity,
                original_velocity: velocity,
            });
        }

        self.columns.push(Column {
            letters,
            origin_x: column_x,
        });
        total
    }

    /// Move every letter one frame, applying the attractor's pull when one is
    /// given and active. `absorb_elapsed` is the time since absorption began,
    /// `None` while not absorbing. Returns how many letters were absorbed.
    pub fn update_letters(
        &mut self,
        attractor: Option<&mut Attractor>,
        absorb_elapsed: Option<f64>,
        camera: &ViewCamera,
        rng: &mut impl Rng,
    ) -> u32 {
        let cfg = &self.attraction;
        let absorbing = absorb_elapsed.is_some();
        let absorb_factor = absorb_elapsed
            .map(|t| (t / cfg.absorb_ramp_secs).min(1.0))
            .unwrap_or(0.0);
        let gain = cfg.idle_gain + absorb_factor * absorb_factor * cfg.absorb_gain;
        let forced = absorb_elapsed.is_some_and(|t| t > cfg.forced_after_secs);

        let pull = attractor
            .as_deref()
            .filter(|a| a.is_active())
            .map(|a| (a.position(), a.radius()));

        let half_height = camera.frustum_height() * 0.5;
        let exit_y = -half_height - self.rain.exit_margin;
        let respawn_height = self.rain.respawn_height;

        let mut absorbed = 0u32;
        let outbox = &mut self.outbox;

        self.columns.retain_mut(|column| {
            column.letters.retain_mut(|letter| {
                if let Some((center, radius)) = pull {
                    let delta = sub(center, letter.position);
                    let dist = length_xy(delta);
                    let falloff =
                        1.0 / (dist.max(cfg.min_distance) * cfg.falloff_scale + cfg.falloff_offset);
                    let force = cfg.base_force * gain * falloff;
                    letter.velocity.x += delta.x * force;
                    letter.velocity.y += delta.y * force;

                    if dist < radius * cfg.absorb_radius_factor {
                        outbox.push(SceneEvent::LetterRemoved { id: letter.id });
                        absorbed += 1;
                        return false;
                    }

                    if forced {
                        letter.velocity.x += delta.x * cfg.forced_pull;
                        letter.velocity.y += delta.y * cfg.forced_pull;
                        letter.velocity = scale(letter.velocity, cfg.forced_damping);

                        if dist < radius * cfg.forced_radius_factor {
                            outbox.push(SceneEvent::LetterRemoved { id: letter.id });
                            absorbed += 1;
                            return false;
                        }
                    }

                    letter.velocity = clamp_length(letter.velocity, cfg.max_letter_speed);
                }

                letter.position = add(letter.position, letter.velocity);

                if letter.position.y < exit_y {
                    if absorbing {
                        outbox.push(SceneEvent::LetterRemoved { id: letter.id });
                        return false;
                    }
                    letter.position.y = half_height + rng.gen::<f64>() * respawn_height;
                }
                true
            });
            !column.letters.is_empty()
        });

        if absorbed > 0 {
            if let Some(attractor) = attractor {
                attractor.record_absorbed(absorbed);
            }
        }
        absorbed
    }

    /// Fade in and drift the formation particles.
    pub fn update_formation_particles(&mut self, now: f64, activity: FormationActivity) {
        if activity.all_complete {
            return;
        }
        let Some(emitted_at) = self.emitted_at else {
            return;
        };
        if now - emitted_at <= self.emission_config.fade_delay_secs {
            return;
        }

        let cfg = &self.emission_config;
        for particle in self.particles.values_mut() {
            if particle.fade_in < 1.0 {
                particle.fade_in = (particle.fade_in + cfg.fade_step).min(1.0);
                particle.opacity = particle.fade_in * cfg.max_opacity;
            }

            // Units own the motion while they animate
            if activity.any_animating {
                particle.velocity = Vec3::ZERO;
                continue;
            }

            particle.position = add(particle.position, particle.velocity);
            particle.velocity = scale(particle.velocity, cfg.drift_decay);
        }
    }

    /// Start emitting `count` formation particles around `center`. The first
    /// batch is created immediately; the rest come one batch per
    /// [`pump_emission`](Self::pump_emission) call. `on_new` sees every id
    /// exactly once. A running emission is replaced.
    pub fn emit_formation_particles(
        &mut self,
        center: Vec3,
        count: usize,
        now: f64,
        rng: &mut impl Rng,
        on_new: impl FnMut(ParticleId),
    ) -> usize {
        info!("Emitting {} formation particles", count);
        self.emitted_at = Some(now);
        self.emission = (count > 0).then_some(Emission {
            center,
            remaining: count,
        });
        self.pump_emission(rng, on_new)
    }

    /// Emit the next batch of a running emission. Returns how many particles
    /// were created.
    pub fn pump_emission(&mut self, rng: &mut impl Rng, mut on_new: impl FnMut(ParticleId)) -> usize {
        let Some(mut emission) = self.emission else {
            return 0;
        };

        let batch = self.emission_config.batch_size.min(emission.remaining);
        for _ in 0..batch {
            let id = self.create_particle(emission.center, rng);
            on_new(id);
        }
        emission.remaining -= batch;

        if emission.remaining == 0 {
            debug!("Formation particle emission finished");
            self.emission = None;
        } else {
            self.emission = Some(emission);
        }
        batch
    }

    pub fn cancel_emission(&mut self) {
        self.emission = None;
    }

    pub fn is_emitting(&self) -> bool {
        self.emission.is_some()
    }

    fn create_particle(&mut self, center: Vec3, rng: &mut impl Rng) -> ParticleId {
        let id = ParticleId(self.next_particle_id);
        self.next_particle_id += 1;

        let cfg = &self.emission_config;
        let angle = rng.gen::<f64>() * TAU;
        let offset = rng.gen::<f64>() * cfg.radial_jitter;
        let speed = cfg.speed_min + rng.gen::<f64>() * cfg.speed_jitter;
        let (sin, cos) = angle.sin_cos();

        let f = &self.formation;
        let motion = FormationMotion {
            speed: f.speed_min + rng.gen::<f64>() * f.speed_jitter,
            noise_phase_x: rng.gen::<f64>() * TAU,
            noise_phase_y: rng.gen::<f64>() * TAU,
            noise_amp: f.noise_amp_min + rng.gen::<f64>() * f.noise_amp_jitter,
        };

        self.particles.insert(
            id,
            FormationParticle {
                id,
                position: Vec3::new(center.x + cos * offset, center.y + sin * offset, center.z),
                velocity: Vec3::new(cos * speed, sin * speed, 0.0),
                fade_in: 0.0,
                opacity: 0.0,
                target: None,
                lock_progress: 0.0,
                motion,
            },
        );
        self.outbox.push(SceneEvent::ParticleSpawned { id });
        id
    }

    pub fn particle(&self, id: ParticleId) -> Option<&FormationParticle> {
        self.particles.get(&id)
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut FormationParticle> {
        self.particles.get_mut(&id)
    }

    pub fn formation_particles(&self) -> impl Iterator<Item = &FormationParticle> {
        self.particles.values()
    }

    pub fn formation_particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Remove a formation particle. Unknown ids are ignored.
    pub fn remove_formation_particle(&mut self, id: ParticleId) -> bool {
        if self.particles.remove(&id).is_some() {
            self.outbox.push(SceneEvent::ParticleRemoved { id });
            return true;
        }
        false
    }

    /// Remove every letter.
    pub fn clear(&mut self) {
        for column in self.columns.drain(..) {
            for letter in column.letters {
                self.outbox.push(SceneEvent::LetterRemoved { id: letter.id });
            }
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn letters(&self) -> impl Iterator<Item = &Letter> {
        self.columns.iter().flat_map(|c| c.letters.iter())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn letter_count(&self) -> usize {
        self.columns.iter().map(|c| c.letters.len()).sum()
    }

    /// Letters whose XY distance to `center` is below `radius`
    pub fn count_letters_within(&self, center: Vec3, radius: f64) -> usize {
        self.letters()
            .filter(|l| distance_xy(l.position, center) < radius)
            .count()
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        self.outbox.drain()
    }
}
