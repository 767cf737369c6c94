use bevy::prelude::*;
use bevy_prototype_lyon::prelude::*;

use crate::constants::{color_from_hex, Colors, ATTRACTOR_SIZE, ATTRACTOR_Z};

use super::core::{place, SceneEngine};
use super::UpdateSet;

pub struct AttractorPlugin;

/// One ring of the attractor's ink blot. Rings are drawn outermost first and
/// together approximate a radial fade from a black core to a grey rim.
#[derive(Component)]
struct AttractorRing {
    color: u32,
    alpha: f32,
}

const RINGS: [(f32, u32, f32); 3] = [
    (1.0, Colors::ATTRACTOR_OUTER, 0.35),
    (0.65, Colors::ATTRACTOR_INNER, 0.8),
    (0.25, Colors::ATTRACTOR_CORE, 1.0),
];

impl Plugin for AttractorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_attractor)
            .add_systems(Update, sync_attractor.in_set(UpdateSet::Visuals));
    }
}

fn spawn_attractor(mut commands: Commands) {
    for (i, (fraction, color, alpha)) in RINGS.iter().enumerate() {
        let ring = shapes::Circle {
            radius: 0.5 * fraction,
            center: Vec2::ZERO,
        };
        commands.spawn((
            ShapeBuilder::with(&ring)
                .fill(color_from_hex(*color).with_alpha(0.0))
                .build(),
            Transform::from_xyz(0.0, 0.0, ATTRACTOR_Z + i as f32 * 0.1),
            Visibility::Hidden,
            AttractorRing {
                color: *color,
                alpha: *alpha,
            },
        ));
    }
}

fn sync_attractor(
    engine: Res<SceneEngine>,
    mut q_rings: Query<(&AttractorRing, &mut Transform, &mut Visibility, &mut Shape)>,
) {
    let attractor = engine.scene.attractor();
    let scale = attractor.visual_scale();
    let opacity = attractor.opacity();
    let placed = place(engine.scene.camera(), attractor.position(), ATTRACTOR_Z);

    for (ring, mut transform, mut visibility, mut shape) in &mut q_rings {
        let Some((translation, pixels_per_unit)) = placed.filter(|_| scale > 0.0 && opacity > 0.0)
        else {
            *visibility = Visibility::Hidden;
            continue;
        };
        transform.translation.x = translation.x;
        transform.translation.y = translation.y;
        transform.scale = Vec3::splat(pixels_per_unit * (scale * ATTRACTOR_SIZE) as f32);
        if let Some(fill) = shape.fill.as_mut() {
            fill.color = color_from_hex(ring.color).with_alpha(ring.alpha * opacity as f32);
        }
        *visibility = Visibility::Visible;
    }
}
