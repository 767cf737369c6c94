use bevy::input::touch::Touches;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::core::SceneEngine;
use super::UpdateSet;

pub struct InputPlugin;

/// Which device currently holds the pointer. Only one press is tracked at a
/// time; extra fingers are ignored until the first one lifts.
#[derive(Resource, Default, Debug, PartialEq)]
pub(crate) struct PointerOwner {
    pub(crate) mouse: bool,
    pub(crate) touch: Option<u64>,
}

impl PointerOwner {
    fn is_free(&self) -> bool {
        !self.mouse && self.touch.is_none()
    }
}

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PointerOwner>().add_systems(
            Update,
            (mouse_input_system, touch_input_system)
                .chain()
                .in_set(UpdateSet::Input),
        );
    }
}

fn mouse_input_system(
    buttons: Res<ButtonInput<MouseButton>>,
    q_window: Query<&Window, With<PrimaryWindow>>,
    mut owner: ResMut<PointerOwner>,
    mut engine: ResMut<SceneEngine>,
) {
    let Ok(window) = q_window.single() else {
        return;
    };
    let cursor = window.cursor_position();

    if buttons.just_pressed(MouseButton::Left) && owner.is_free() {
        if let Some(pos) = cursor {
            owner.mouse = true;
            engine.scene.pointer_down(pos.x as f64, pos.y as f64);
        }
    }

    if !owner.mouse {
        return;
    }

    if buttons.just_released(MouseButton::Left) {
        owner.mouse = false;
        engine.scene.pointer_up();
        return;
    }

    match cursor {
        Some(pos) => engine.scene.pointer_move(pos.x as f64, pos.y as f64),
        None => {
            // Dragged out of the window
            owner.mouse = false;
            engine.scene.pointer_cancel();
        }
    }
}

fn touch_input_system(
    touches: Res<Touches>,
    mut owner: ResMut<PointerOwner>,
    mut engine: ResMut<SceneEngine>,
) {
    for touch in touches.iter_just_pressed() {
        if owner.is_free() {
            owner.touch = Some(touch.id());
            let pos = touch.position();
            engine.scene.pointer_down(pos.x as f64, pos.y as f64);
        }
    }

    let Some(id) = owner.touch else {
        return;
    };

    if touches.just_released(id) {
        owner.touch = None;
        engine.scene.pointer_up();
    } else if touches.just_canceled(id) {
        owner.touch = None;
        engine.scene.pointer_cancel();
    } else if let Some(touch) = touches.get_pressed(id) {
        if touch.delta() != Vec2::ZERO {
            let pos = touch.position();
            engine.scene.pointer_move(pos.x as f64, pos.y as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_starts_free() {
        assert!(PointerOwner::default().is_free());
    }

    #[test]
    fn either_device_holds_the_pointer() {
        let mouse = PointerOwner {
            mouse: true,
            touch: None,
        };
        let touch = PointerOwner {
            mouse: false,
            touch: Some(3),
        };
        assert!(!mouse.is_free());
        assert!(!touch.is_free());
    }
}
