mod constants;
mod coord;
mod game;

use bevy::prelude::*;
use bevy::window::{PresentMode, WindowResolution};
use bevy_prototype_lyon::prelude::ShapePlugin;
use hexrain_engine::orchestrator::Orchestrator;
use hexrain_shared::config::SceneConfig;

use constants::{DEFAULT_SEED, WINDOW_HEIGHT, WINDOW_WIDTH};
use game::{
    AttractorPlugin, CorePlugin, FontPlugin, FormationPlugin, InputPlugin, LettersPlugin,
    SceneEngine,
};

fn main() {
    let scene = match Orchestrator::new(scene_config_from_env(), seed_from_env()) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Invalid scene configuration: {}", e);
            std::process::exit(1);
        }
    };

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Hexrain".to_string(),
                resolution: WindowResolution::new(WINDOW_WIDTH, WINDOW_HEIGHT),
                present_mode: PresentMode::AutoVsync,
                resizable: true,
                ..default()
            }),
            ..default()
        }))
        .add_plugins(ShapePlugin)
        .insert_resource(SceneEngine::new(scene))
        .add_plugins(CorePlugin)
        .add_plugins(FontPlugin)
        .add_plugins(InputPlugin)
        .add_plugins(LettersPlugin)
        .add_plugins(AttractorPlugin)
        .add_plugins(FormationPlugin)
        .run();
}

/// Scene config from `HEXRAIN_CONFIG`. An unreadable file falls back to the
/// defaults; invalid values are rejected later by `Orchestrator::new`.
fn scene_config_from_env() -> SceneConfig {
    let Ok(path) = std::env::var("HEXRAIN_CONFIG") else {
        return SceneConfig::default();
    };
    SceneConfig::load_from_path(std::path::Path::new(&path)).unwrap_or_else(|e| {
        eprintln!("{}; using default scene config", e);
        SceneConfig::default()
    })
}

fn seed_from_env() -> u64 {
    std::env::var("HEXRAIN_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED)
}
