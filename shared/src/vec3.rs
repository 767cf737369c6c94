/// 3D vector utilities for scene-space positions and velocities.
/// Scene units: camera looks down -Z, the z = 0 plane is the "view plane".

#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Add two vectors
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z)
}

/// Subtract vectors (a - b)
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z)
}

/// Scale vector by scalar
pub fn scale(v: Vec3, s: f64) -> Vec3 {
    Vec3::new(v.x * s, v.y * s, v.z * s)
}

/// Vector length
pub fn length(v: Vec3) -> f64 {
    (v.x * v.x + v.y * v.y + v.z * v.z).sqrt()
}

/// Length of the XY projection. Attraction and proximity ignore depth.
pub fn length_xy(v: Vec3) -> f64 {
    (v.x * v.x + v.y * v.y).sqrt()
}

/// Planar (XY) distance between two points.
pub fn distance_xy(a: Vec3, b: Vec3) -> f64 {
    length_xy(sub(a, b))
}

/// Rescale `v` so its length does not exceed `max_len`.
pub fn clamp_length(v: Vec3, max_len: f64) -> Vec3 {
    let len = length(v);
    if len <= max_len || len < 1e-10 {
        return v;
    }
    scale(v, max_len / len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec3_close(actual: Vec3, expected: Vec3) {
        assert!(
            (actual.x - expected.x).abs() < 1e-6
                && (actual.y - expected.y).abs() < 1e-6
                && (actual.z - expected.z).abs() < 1e-6,
            "Expected {:?} to be close to {:?}",
            actual,
            expected
        );
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
    fn add_and_sub_are_inverse() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_vec3_close(add(a, b), Vec3::new(5.0, 7.0, 9.0));
        assert_vec3_close(sub(add(a, b), b), a);
    }

    #[test]
    fn length_of_3_4_0_is_5() {
        assert_eq!(length(Vec3::new(3.0, 4.0, 0.0)), 5.0);
    }

    #[test]
    fn planar_distance_ignores_depth() {
        let a = Vec3::new(0.0, 0.0, -4.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert_close(distance_xy(a, b), 5.0);
    }

    #[test]
    fn clamp_length_shrinks_long_vectors_only() {
        let long = clamp_length(Vec3::new(3.0, 4.0, 0.0), 1.0);
        assert_close(length(long), 1.0);
        assert_vec3_close(long, Vec3::new(0.6, 0.8, 0.0));

        let short = Vec3::new(0.1, 0.1, 0.0);
        assert_eq!(clamp_length(short, 1.0), short);
    }
}
