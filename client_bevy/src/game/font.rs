use bevy::asset::LoadState;
use bevy::prelude::*;

use crate::constants::{FONT_PATH, FONT_TIMEOUT_SECS};

use super::core::SceneEngine;
use super::UpdateSet;

pub struct FontPlugin;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FontStatus {
    Loading,
    Loaded,
    Failed,
}

/// Why the gate opened
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum GateOutcome {
    Loaded,
    Failed,
    TimedOut,
}

/// Holds the rain back until the letter font is ready, or until
/// `FONT_TIMEOUT_SECS` have passed, whichever comes first.
#[derive(Resource)]
pub(crate) struct FontGate {
    handle: Handle<Font>,
    timeout: f32,
    waited: f32,
    open: bool,
    loaded: bool,
}

impl FontGate {
    pub(crate) fn new(handle: Handle<Font>, timeout: f32) -> Self {
        Self {
            handle,
            timeout,
            waited: 0.0,
            open: false,
            loaded: false,
        }
    }

    /// Feed the current load status. Returns the outcome on the frame the
    /// gate opens and `None` otherwise.
    pub(crate) fn advance(&mut self, status: FontStatus, dt: f32) -> Option<GateOutcome> {
        if status == FontStatus::Loaded {
            self.loaded = true;
        }
        if self.open {
            return None;
        }

        let outcome = match status {
            FontStatus::Loaded => GateOutcome::Loaded,
            FontStatus::Failed => GateOutcome::Failed,
            FontStatus::Loading => {
                self.waited += dt;
                if self.waited < self.timeout {
                    return None;
                }
                GateOutcome::TimedOut
            }
        };
        self.open = true;
        Some(outcome)
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open
    }

    /// The letter font if it has arrived, Bevy's built-in face otherwise.
    /// A font that finishes loading after the timeout is picked up by
    /// letters spawned from then on.
    pub(crate) fn text_font(&self) -> Handle<Font> {
        if self.loaded {
            self.handle.clone()
        } else {
            Handle::default()
        }
    }
}

impl Plugin for FontPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, start_font_load)
            .add_systems(Update, font_gate_system.before(UpdateSet::Engine));
    }
}

fn start_font_load(mut commands: Commands, asset_server: Res<AssetServer>) {
    commands.insert_resource(FontGate::new(asset_server.load(FONT_PATH), FONT_TIMEOUT_SECS));
}

fn font_gate_system(
    asset_server: Res<AssetServer>,
    time: Res<Time>,
    mut gate: ResMut<FontGate>,
    mut engine: ResMut<SceneEngine>,
) {
    if gate.is_open() && gate.loaded {
        return;
    }

    let status = match asset_server.load_state(&gate.handle) {
        LoadState::Loaded => FontStatus::Loaded,
        LoadState::Failed(_) => FontStatus::Failed,
        _ => FontStatus::Loading,
    };

    let Some(outcome) = gate.advance(status, time.delta_secs()) else {
        return;
    };
    match outcome {
        GateOutcome::Loaded => info!("Font loaded from {}", FONT_PATH),
        GateOutcome::Failed => warn!("Font load failed, continuing with the default font"),
        GateOutcome::TimedOut => warn!(
            "Font not ready after {}s, continuing with the default font",
            FONT_TIMEOUT_SECS
        ),
    }
    engine.scene.init_rain();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> FontGate {
        FontGate::new(Handle::default(), 0.3)
    }

    #[test]
    fn opens_when_font_arrives() {
        let mut gate = gate();
        assert_eq!(gate.advance(FontStatus::Loading, 0.1), None);
        assert_eq!(gate.advance(FontStatus::Loaded, 0.1), Some(GateOutcome::Loaded));
        assert!(gate.is_open());
    }

    #[test]
    fn opens_on_failure_without_waiting() {
        let mut gate = gate();
        assert_eq!(gate.advance(FontStatus::Failed, 0.0), Some(GateOutcome::Failed));
    }

    #[test]
    fn opens_after_timeout() {
        let mut gate = gate();
        assert_eq!(gate.advance(FontStatus::Loading, 0.2), None);
        assert_eq!(gate.advance(FontStatus::Loading, 0.2), Some(GateOutcome::TimedOut));
        assert!(gate.is_open());
    }

    #[test]
    fn opens_only_once() {
        let mut gate = gate();
        assert!(gate.advance(FontStatus::Failed, 0.0).is_some());
        assert_eq!(gate.advance(FontStatus::Failed, 0.0), None);
        assert_eq!(gate.advance(FontStatus::Loading, 1.0), None);
    }

    #[test]
    fn late_font_is_still_picked_up() {
        let mut gate = gate();
        gate.advance(FontStatus::Loading, 1.0);
        assert!(!gate.loaded);
        assert_eq!(gate.advance(FontStatus::Loaded, 0.0), None);
        assert!(gate.loaded);
    }
}
