use std::collections::HashMap;

use bevy::prelude::*;
use bevy_prototype_lyon::prelude::*;
use hexrain_engine::events::{ParticleId, SceneEvent};
use hexrain_engine::formation::UnitSide;
use hexrain_shared::vec3::Vec3 as SceneVec3;

use crate::constants::{color_from_hex, Colors, LINE_THICKNESS, LINE_Z, PARTICLE_SIZE, PARTICLE_Z};

use super::core::{place, SceneEngine, SceneEventMessage};
use super::UpdateSet;

pub struct FormationPlugin;

#[derive(Component)]
struct ParticleDot;

/// Bevy entity per live formation particle
#[derive(Resource, Default)]
struct ParticleEntities(HashMap<ParticleId, Entity>);

/// Visual for line `index` of the unit on `side`
#[derive(Component)]
struct HexagramLine {
    side: UnitSide,
    index: usize,
}

impl Plugin for FormationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ParticleEntities>()
            .add_systems(
                Update,
                (mirror_particle_events, sync_particles)
                    .chain()
                    .in_set(UpdateSet::Visuals),
            )
            .add_systems(
                Update,
                (mirror_unit_events, sync_lines)
                    .chain()
                    .in_set(UpdateSet::Visuals),
            );
    }
}

fn mirror_particle_events(
    mut commands: Commands,
    mut events: MessageReader<SceneEventMessage>,
    mut entities: ResMut<ParticleEntities>,
) {
    // Unit diameter, scaled per frame
    let dot = shapes::Circle {
        radius: 0.5,
        center: Vec2::ZERO,
    };

    for SceneEventMessage(event) in events.read() {
        match event {
            SceneEvent::ParticleSpawned { id } => {
                let entity = commands
                    .spawn((
                        ShapeBuilder::with(&dot)
                            .fill(color_from_hex(Colors::PARTICLE).with_alpha(0.0))
                            .build(),
                        Transform::default(),
                        Visibility::Hidden,
                        ParticleDot,
                    ))
                    .id();
                entities.0.insert(*id, entity);
            }
            SceneEvent::ParticleRemoved { id } => {
                if let Some(entity) = entities.0.remove(id) {
                    commands.entity(entity).despawn();
                }
            }
            _ => {}
        }
    }
}

fn sync_particles(
    engine: Res<SceneEngine>,
    entities: Res<ParticleEntities>,
    mut q_dots: Query<(&mut Transform, &mut Visibility, &mut Shape), With<ParticleDot>>,
) {
    let camera = engine.scene.camera();
    for particle in engine.scene.pool().formation_particles() {
        let Some(&entity) = entities.0.get(&particle.id) else {
            continue;
        };
        let Ok((mut transform, mut visibility, mut shape)) = q_dots.get_mut(entity) else {
            continue;
        };

        let Some((translation, pixels_per_unit)) = place(camera, particle.position, PARTICLE_Z) else {
            *visibility = Visibility::Hidden;
            continue;
        };
        transform.translation = translation;
        transform.scale = Vec3::splat(pixels_per_unit * PARTICLE_SIZE as f32);
        if let Some(fill) = shape.fill.as_mut() {
            fill.color = color_from_hex(Colors::PARTICLE).with_alpha(particle.opacity as f32);
        }
        *visibility = Visibility::Visible;
    }
}

fn mirror_unit_events(
    mut commands: Commands,
    mut events: MessageReader<SceneEventMessage>,
    engine: Res<SceneEngine>,
    q_lines: Query<(Entity, &HexagramLine)>,
) {
    let bar = shapes::Rectangle {
        extents: Vec2::ONE,
        origin: shapes::RectangleOrigin::Center,
        radii: None,
    };

    for SceneEventMessage(event) in events.read() {
        match event {
            SceneEvent::UnitCreated { side } => {
                let Some(unit) = engine.scene.unit(*side) else {
                    continue;
                };
                for index in 0..unit.lines().len() {
                    commands.spawn((
                        ShapeBuilder::with(&bar)
                            .fill(color_from_hex(Colors::LINE).with_alpha(0.0))
                            .build(),
                        Transform::default(),
                        Visibility::Hidden,
                        HexagramLine { side: *side, index },
                    ));
                }
            }
            SceneEvent::UnitDisposed { side } => {
                for (entity, line) in &q_lines {
                    if line.side == *side {
                        commands.entity(entity).despawn();
                    }
                }
            }
            _ => {}
        }
    }
}

fn sync_lines(
    engine: Res<SceneEngine>,
    mut q_lines: Query<(&HexagramLine, &mut Transform, &mut Visibility, &mut Shape)>,
) {
    let camera = engine.scene.camera();
    for (line_ref, mut transform, mut visibility, mut shape) in &mut q_lines {
        let unit = engine
            .scene
            .unit(line_ref.side)
            .filter(|unit| !unit.is_disposed());
        let Some((unit, line)) = unit.and_then(|u| Some((u, u.lines().get(line_ref.index)?))) else {
            *visibility = Visibility::Hidden;
            continue;
        };
        if line.brightness <= 0.0 {
            *visibility = Visibility::Hidden;
            continue;
        }

        let origin = unit.position();
        let center = SceneVec3::new(origin.x + line.offset_x, origin.y + line.offset_y, origin.z);
        let Some((translation, pixels_per_unit)) = place(camera, center, LINE_Z) else {
            *visibility = Visibility::Hidden;
            continue;
        };
        transform.translation = translation;
        transform.scale = Vec3::new(
            pixels_per_unit * line.width as f32,
            pixels_per_unit * LINE_THICKNESS as f32,
            1.0,
        );
        if let Some(fill) = shape.fill.as_mut() {
            fill.color = color_from_hex(Colors::LINE).with_alpha(line.brightness as f32);
        }
        *visibility = Visibility::Visible;
    }
}
