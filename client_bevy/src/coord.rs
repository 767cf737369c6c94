use bevy::prelude::Vec3;

/// Window pixel coordinates as the engine sees them (origin top-left, Y-down).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPos {
    pub x: f32,
    pub y: f32,
}

impl ScreenPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Logical window size in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Convert window pixels (Y-down) to Bevy world coordinates (Y-up, origin at
/// the window center, one unit per logical pixel).
pub fn screen_to_world(pos: ScreenPos, viewport: Viewport, z: f32) -> Vec3 {
    let wx = pos.x - viewport.width * 0.5;
    let wy = viewport.height * 0.5 - pos.y;
    Vec3::new(wx, wy, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_center_is_world_origin() {
        let world = screen_to_world(ScreenPos::new(400.0, 300.0), Viewport::new(800.0, 600.0), 3.0);
        assert_eq!(world, Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn top_of_screen_is_positive_world_y() {
        let world = screen_to_world(ScreenPos::new(400.0, 0.0), Viewport::new(800.0, 600.0), 0.0);
        assert!((world.y - 300.0).abs() < 1e-6);
    }
}
