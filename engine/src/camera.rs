use hexrain_shared::config::CameraConfig;
use hexrain_shared::vec3::Vec3;

/// Perspective camera at (0, 0, distance) looking down -Z.
///
/// Screen coordinates are window pixels with the origin top-left and Y
/// pointing down. Scene coordinates are Y-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCamera {
    fov_degrees: f64,
    distance: f64,
    width: f64,
    height: f64,
}

impl ViewCamera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            fov_degrees: config.fov_degrees,
            distance: config.distance,
            width: config.viewport_width,
            height: config.viewport_height,
        }
    }

    /// Apply a viewport resize. Degenerate sizes (minimised windows) are ignored.
    /// Returns true if the projection changed.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        if !(width > 0.0 && height > 0.0) {
            return false;
        }
        if width == self.width && height == self.height {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    fn half_fov_tan(&self) -> f64 {
        (self.fov_degrees.to_radians() * 0.5).tan()
    }

    /// Visible height of the z = 0 plane
    pub fn frustum_height(&self) -> f64 {
        2.0 * self.half_fov_tan() * self.distance.abs()
    }

    /// Visible width of the z = 0 plane
    pub fn frustum_width(&self) -> f64 {
        self.frustum_height() * self.aspect()
    }

    pub fn viewport_center(&self) -> (f64, f64) {
        (self.width * 0.5, self.height * 0.5)
    }

    /// Screen pixel -> point on the z = 0 plane along the view ray.
    pub fn unproject(&self, screen_x: f64, screen_y: f64) -> Vec3 {
        let ndc_x = (screen_x / self.width) * 2.0 - 1.0;
        let ndc_y = -(screen_y / self.height) * 2.0 + 1.0;
        Vec3::new(
            ndc_x * self.frustum_width() * 0.5,
            ndc_y * self.frustum_height() * 0.5,
            0.0,
        )
    }

    /// Scene point -> screen pixel. None for points at or behind the camera.
    pub fn project(&self, p: Vec3) -> Option<(f64, f64)> {
        let depth = self.distance - p.z;
        if depth <= 1e-6 {
            return None;
        }
        let half_h = self.half_fov_tan() * depth;
        let half_w = half_h * self.aspect();
        let ndc_x = p.x / half_w;
        let ndc_y = p.y / half_h;
        Some((
            (ndc_x + 1.0) * 0.5 * self.width,
            (1.0 - ndc_y) * 0.5 * self.height,
        ))
    }

    /// Screen pixels per scene unit at depth `z`.
    pub fn pixels_per_unit(&self, z: f64) -> f64 {
        let depth = (self.distance - z).max(1e-6);
        self.height / (2.0 * self.half_fov_tan() * depth)
    }

    pub fn is_narrow(&self, threshold_px: f64) -> bool {
        self.width < threshold_px
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> ViewCamera {
        ViewCamera::new(&CameraConfig::default())
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "Expected {} to be close to {}",
            actual,
            expected
        );
    }

    #[test]
    fn frustum_matches_fov_and_distance() {
        let cam = camera();
        let expected = 2.0 * (37.5_f64).to_radians().tan() * 15.0;
        assert_close(cam.frustum_height(), expected);
        assert_close(cam.frustum_width(), expected * 1280.0 / 720.0);
    }

    #[test]
    fn viewport_center_unprojects_to_origin() {
        let cam = camera();
        let (cx, cy) = cam.viewport_center();
        let p = cam.unproject(cx, cy);
        assert_close(p.x, 0.0);
        assert_close(p.y, 0.0);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn top_left_corner_is_up_and_left() {
        let cam = camera();
        let p = cam.unproject(0.0, 0.0);
        assert_close(p.x, -cam.frustum_width() * 0.5);
        assert_close(p.y, cam.frustum_height() * 0.5);
    }

    #[test]
    fn project_inverts_unproject_on_view_plane() {
        let cam = camera();
        let p = cam.unproject(200.0, 100.0);
        let (sx, sy) = cam.project(p).unwrap();
        assert_close(sx, 200.0);
        assert_close(sy, 100.0);
    }

    #[test]
    fn deeper_points_project_closer_to_center() {
        let cam = camera();
        let (near_x, _) = cam.project(Vec3::new(3.0, 0.0, 0.0)).unwrap();
        let (far_x, _) = cam.project(Vec3::new(3.0, 0.0, -5.0)).unwrap();
        let cx = cam.viewport_center().0;
        assert!((far_x - cx).abs() < (near_x - cx).abs());
    }

    #[test]
    fn points_behind_camera_do_not_project() {
        assert!(camera().project(Vec3::new(0.0, 0.0, 20.0)).is_none());
    }

    #[test]
    fn resize_ignores_degenerate_sizes() {
        let mut cam = camera();
        assert!(!cam.resize(0.0, 500.0));
        assert!(cam.resize(600.0, 800.0));
        assert_close(cam.aspect(), 0.75);
        assert!(cam.is_narrow(800.0));
    }
}
