use std::collections::HashMap;

use bevy::prelude::*;
use hexrain_engine::events::{LetterId, SceneEvent};

use crate::constants::{color_from_hex, Colors, LETTER_FONT_SIZE, LETTER_SIZE, LETTER_Z};

use super::core::{place, SceneEngine, SceneEventMessage};
use super::font::FontGate;
use super::UpdateSet;

pub struct LettersPlugin;

#[derive(Component)]
struct LetterGlyph;

/// Bevy entity per live engine letter
#[derive(Resource, Default)]
struct LetterEntities(HashMap<LetterId, Entity>);

impl Plugin for LettersPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LetterEntities>().add_systems(
            Update,
            (mirror_letter_events, sync_letter_transforms)
                .chain()
                .in_set(UpdateSet::Visuals),
        );
    }
}

fn mirror_letter_events(
    mut commands: Commands,
    mut events: MessageReader<SceneEventMessage>,
    mut entities: ResMut<LetterEntities>,
    gate: Res<FontGate>,
) {
    for SceneEventMessage(event) in events.read() {
        match event {
            SceneEvent::LetterSpawned { id, glyph, alpha } => {
                let entity = commands
                    .spawn((
                        Text2d::new(glyph.to_string()),
                        TextFont {
                            font: gate.text_font(),
                            font_size: LETTER_FONT_SIZE,
                            ..default()
                        },
                        TextColor(color_from_hex(Colors::LETTER).with_alpha(*alpha as f32)),
                        Transform::default(),
                        // Shown once the first transform sync has placed it
                        Visibility::Hidden,
                        LetterGlyph,
                    ))
                    .id();
                entities.0.insert(*id, entity);
            }
            SceneEvent::LetterRemoved { id } => {
                if let Some(entity) = entities.0.remove(id) {
                    commands.entity(entity).despawn();
                }
            }
            _ => {}
        }
    }
}

fn sync_letter_transforms(
    engine: Res<SceneEngine>,
    entities: Res<LetterEntities>,
    mut q_letters: Query<(&mut Transform, &mut Visibility), With<LetterGlyph>>,
) {
    let camera = engine.scene.camera();
    for letter in engine.scene.pool().letters() {
        let Some(&entity) = entities.0.get(&letter.id) else {
            continue;
        };
        let Ok((mut transform, mut visibility)) = q_letters.get_mut(entity) else {
            continue;
        };

        let depth = LETTER_Z + letter.position.z as f32;
        match place(camera, letter.position, depth) {
            Some((translation, pixels_per_unit)) => {
                transform.translation = translation;
                transform.scale = Vec3::splat(pixels_per_unit * LETTER_SIZE as f32 / LETTER_FONT_SIZE);
                *visibility = Visibility::Visible;
            }
            None => *visibility = Visibility::Hidden,
        }
    }
}
