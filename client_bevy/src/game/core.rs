use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};
use hexrain_engine::camera::ViewCamera;
use hexrain_engine::events::SceneEvent;
use hexrain_engine::orchestrator::Orchestrator;
use hexrain_shared::vec3::Vec3 as SceneVec3;

use crate::constants::{color_from_hex, Colors};
use crate::coord::{screen_to_world, ScreenPos, Viewport};

#[derive(SystemSet, Debug, Hash, Eq, PartialEq, Clone)]
pub(crate) enum UpdateSet {
    Input,
    Engine,
    Visuals,
}

/// The scene engine, advanced once per rendered frame.
#[derive(Resource)]
pub(crate) struct SceneEngine {
    pub(crate) scene: Orchestrator,
}

impl SceneEngine {
    pub(crate) fn new(scene: Orchestrator) -> Self {
        Self { scene }
    }
}

/// One engine scene event, forwarded to the visual plugins.
#[derive(Message, Clone, Debug)]
pub(crate) struct SceneEventMessage(pub(crate) SceneEvent);

/// Expects a `SceneEngine` resource to be inserted by the app.
pub struct CorePlugin;

#[derive(Component)]
struct MainCamera;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<SceneEventMessage>()
            .insert_resource(ClearColor(color_from_hex(Colors::BACKGROUND)))
            .configure_sets(
                Update,
                (UpdateSet::Input, UpdateSet::Engine, UpdateSet::Visuals).chain(),
            )
            .add_systems(Startup, (setup_camera, sync_viewport_to_window))
            .add_systems(Update, resize_system.before(UpdateSet::Input))
            .add_systems(Update, engine_frame_system.in_set(UpdateSet::Engine));
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((Camera2d, Msaa::Sample4, MainCamera));
}

fn sync_viewport_to_window(
    q_window: Query<&Window, With<PrimaryWindow>>,
    mut engine: ResMut<SceneEngine>,
) {
    let Ok(window) = q_window.single() else {
        return;
    };
    engine
        .scene
        .resize(window.width() as f64, window.height() as f64);
}

fn resize_system(mut resized: MessageReader<WindowResized>, mut engine: ResMut<SceneEngine>) {
    // Only the last size of the frame matters
    if let Some(last) = resized.read().last() {
        engine.scene.resize(last.width as f64, last.height as f64);
    }
}

fn engine_frame_system(
    time: Res<Time>,
    mut engine: ResMut<SceneEngine>,
    mut events: MessageWriter<SceneEventMessage>,
) {
    engine.scene.frame(time.elapsed_secs_f64());
    for event in engine.scene.drain_events() {
        events.write(SceneEventMessage(event));
    }
}

/// Project a scene point into Bevy world space at draw depth `z`.
/// Returns the translation and the pixels-per-unit scale at the point's depth,
/// or `None` when the point is behind the camera.
pub(crate) fn place(camera: &ViewCamera, point: SceneVec3, z: f32) -> Option<(Vec3, f32)> {
    let (sx, sy) = camera.project(point)?;
    let viewport = Viewport::new(camera.width() as f32, camera.height() as f32);
    let translation = screen_to_world(ScreenPos::new(sx as f32, sy as f32), viewport, z);
    Some((translation, camera.pixels_per_unit(point.z) as f32))
}
