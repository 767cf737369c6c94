//! Scene tunables. Every section deserializes from partial camelCase JSON,
//! falling back to the defaults below for missing fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pattern::HexagramPattern;

/// Falling-letter rain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RainConfig {
    pub max_columns: usize,
    /// Column cap on narrow (mobile) viewports
    pub max_columns_narrow: usize,
    /// Viewports narrower than this (px) count as narrow
    pub narrow_viewport_width: f64,
    /// Longer source lines are truncated to this many glyphs
    pub max_line_chars: usize,
    /// Vertical distance between consecutive letters of a column
    pub letter_spacing: f64,
    pub letter_jitter_x: f64,
    /// Letters are placed at z in [-letter_depth, 0]
    pub letter_depth: f64,
    pub drift_x: f64,
    pub fall_speed_min: f64,
    pub fall_speed_jitter: f64,
    /// Column origins spread over this fraction of the frustum width
    pub column_spread_x: f64,
    pub column_spread_y: f64,
    /// Distance below the frustum before a letter counts as off-screen
    pub exit_margin: f64,
    /// Recycled letters re-enter up to this far above the frustum top
    pub respawn_height: f64,
    pub lines: Vec<String>,
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            max_columns: 80,
            max_columns_narrow: 40,
            narrow_viewport_width: 800.0,
            max_line_chars: 40,
            letter_spacing: 0.8,
            letter_jitter_x: 0.1,
            letter_depth: 5.0,
            drift_x: 0.003,
            fall_speed_min: 0.01,
            fall_speed_jitter: 0.015,
            column_spread_x: 1.3,
            column_spread_y: 1.8,
            exit_margin: 2.0,
            respawn_height: 5.0,
            lines: [
                "when you touch the silence,",
                "time breathes.",
                "every moment writes itself,",
                "then disappears, into your hand.",
                "what remains, is not the word,",
                "but the pattern it leaves.",
                "your fingerprint of time.",
                "when",
                "time",
                "every",
                "moment",
                "times,",
                "your",
                "fingerprint",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Pull exerted on letters while the attractor is active.
/// Per-frame quantities are in scene units per frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AttractionConfig {
    pub base_force: f64,
    /// Distances below this are clamped before the falloff
    pub min_distance: f64,
    pub falloff_scale: f64,
    pub falloff_offset: f64,
    /// Gain while attracting but not yet absorbing
    pub idle_gain: f64,
    /// Extra gain at full absorb ramp
    pub absorb_gain: f64,
    pub absorb_ramp_secs: f64,
    /// Letters closer than radius * factor are absorbed
    pub absorb_radius_factor: f64,
    /// Absorption older than this switches to the forced regime
    pub forced_after_secs: f64,
    pub forced_pull: f64,
    pub forced_damping: f64,
    pub forced_radius_factor: f64,
    /// Speed cap per frame. Kept below the absorb radius so a letter
    /// cannot step over the absorb disc.
    pub max_letter_speed: f64,
}

impl Default for AttractionConfig {
    fn default() -> Self {
        Self {
            base_force: 0.00035,
            min_distance: 0.12,
            falloff_scale: 0.9,
            falloff_offset: 1.2,
            idle_gain: 0.12,
            absorb_gain: 2.3,
            absorb_ramp_secs: 2.5,
            absorb_radius_factor: 0.38,
            forced_after_secs: 1.8,
            forced_pull: 0.0008,
            forced_damping: 0.982,
            forced_radius_factor: 0.4,
            max_letter_speed: 0.35,
        }
    }
}

/// Attractor geometry and visual transitions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AttractorConfig {
    pub radius: f64,
    pub base_scale: f64,
    /// Pulse angular rate (rad/s)
    pub pulse_rate: f64,
    pub pulse_amplitude: f64,
    pub appear_secs: f64,
    pub fade_in_secs: f64,
    pub opacity: f64,
    pub fade_out_secs: f64,
    pub expand_scale: f64,
    pub expand_secs: f64,
    /// "Near" query radius as a multiple of `radius`
    pub near_radius_factor: f64,
}

impl Default for AttractorConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            base_scale: 3.0,
            pulse_rate: 5.0,
            pulse_amplitude: 0.1,
            appear_secs: 0.3,
            fade_in_secs: 0.28,
            opacity: 0.85,
            fade_out_secs: 0.3,
            expand_scale: 12.0,
            expand_secs: 1.6,
            near_radius_factor: 4.0,
        }
    }
}

/// Hexagram geometry and per-particle convergence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FormationConfig {
    pub line_spacing: f64,
    pub line_width: f64,
    pub line_thickness: f64,
    /// Particles per unit of line width
    pub density: f64,
    /// Central gap of a yin line, as a fraction of its width
    pub yin_gap: f64,
    pub assign_per_frame: usize,
    pub lock_threshold: f64,
    /// Fraction of a line's particles that must lock before it counts as formed
    pub formed_fraction: f64,
    pub brightness_exponent: f64,
    pub brightness_max: f64,
    pub speed_min: f64,
    pub speed_jitter: f64,
    pub noise_amp_min: f64,
    pub noise_amp_jitter: f64,
    pub noise_step_x: f64,
    pub noise_step_y: f64,
    pub target_jitter_y: f64,
    pub approach_x_base: f64,
    pub approach_x_gain: f64,
    pub approach_y_base: f64,
    pub approach_y_gain: f64,
    pub opacity_step: f64,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            line_spacing: 0.6,
            line_width: 2.6,
            line_thickness: 0.16,
            density: 60.0,
            yin_gap: 0.22,
            assign_per_frame: 3,
            lock_threshold: 0.95,
            formed_fraction: 0.9,
            brightness_exponent: 0.7,
            brightness_max: 0.9,
            speed_min: 0.008,
            speed_jitter: 0.012,
            noise_amp_min: 0.004,
            noise_amp_jitter: 0.003,
            noise_step_x: 0.03,
            noise_step_y: 0.027,
            target_jitter_y: 0.03,
            approach_x_base: 0.05,
            approach_x_gain: 0.12,
            approach_y_base: 0.05,
            approach_y_gain: 0.10,
            opacity_step: 0.03,
        }
    }
}

/// Batched emission of formation particles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EmissionConfig {
    pub batch_size: usize,
    pub radial_jitter: f64,
    pub speed_min: f64,
    pub speed_jitter: f64,
    pub fade_delay_secs: f64,
    pub fade_step: f64,
    pub max_opacity: f64,
    /// Per-frame velocity decay while drifting free
    pub drift_decay: f64,
    /// Emitted per unit when a unit reports no requirement
    pub fallback_per_unit: usize,
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            radial_jitter: 0.18,
            speed_min: 0.015,
            speed_jitter: 0.085,
            fade_delay_secs: 0.1,
            fade_step: 0.035,
            max_opacity: 0.85,
            drift_decay: 0.965,
            fallback_per_unit: 260,
        }
    }
}

/// State machine thresholds and timings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SequenceConfig {
    /// ABSORBING exits once fewer letters than this remain...
    pub max_remaining_letters: usize,
    /// ...and more than this many were absorbed
    pub min_absorbed: u32,
    /// Horizontal offset of each unit from the attractor
    pub unit_offset_x: f64,
    pub formation_start_delay_secs: f64,
    pub hexagram_timeout_secs: f64,
    pub rise_target_y: f64,
    pub rise_secs: f64,
    pub left_pattern: Vec<u8>,
    pub right_pattern: Vec<u8>,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            max_remaining_letters: 20,
            min_absorbed: 5,
            unit_offset_x: 2.8,
            formation_start_delay_secs: 0.9,
            hexagram_timeout_secs: 15.0,
            rise_target_y: 6.5,
            rise_secs: 1.8,
            left_pattern: vec![1, 0, 1, 1, 0, 0],
            right_pattern: vec![0, 1, 0, 0, 1, 1],
        }
    }
}

/// Perspective camera looking down -Z at the z = 0 plane
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConfig {
    pub fov_degrees: f64,
    pub distance: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            distance: 15.0,
            viewport_width: 1280.0,
            viewport_height: 720.0,
        }
    }
}

/// Complete scene configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneConfig {
    pub rain: RainConfig,
    pub attraction: AttractionConfig,
    pub attractor: AttractorConfig,
    pub formation: FormationConfig,
    pub emission: EmissionConfig,
    pub sequence: SequenceConfig,
    pub camera: CameraConfig,
}

fn positive(name: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("{} must be finite and > 0", name));
    }
    Ok(())
}

fn non_negative(name: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} must be finite and >= 0", name));
    }
    Ok(())
}

fn unit_interval(name: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(format!("{} must be within [0, 1]", name));
    }
    Ok(())
}

impl SceneConfig {
    /// Parse a (possibly partial) JSON document.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("invalid scene config: {}", e))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        Self::from_json(&text)
    }

    pub fn left_pattern(&self) -> Result<HexagramPattern, String> {
        HexagramPattern::from_bits(&self.sequence.left_pattern)
            .map_err(|e| format!("left_pattern: {}", e))
    }

    pub fn right_pattern(&self) -> Result<HexagramPattern, String> {
        HexagramPattern::from_bits(&self.sequence.right_pattern)
            .map_err(|e| format!("right_pattern: {}", e))
    }

    pub fn validate(&self) -> Result<(), String> {
        let rain = &self.rain;
        if rain.max_columns == 0 || rain.max_columns_narrow == 0 {
            return Err("max_columns must be > 0".to_string());
        }
        if rain.max_line_chars == 0 {
            return Err("max_line_chars must be > 0".to_string());
        }
        if rain.lines.iter().all(|l| l.trim().is_empty()) {
            return Err("rain needs at least one non-blank source line".to_string());
        }
        positive("letter_spacing", rain.letter_spacing)?;
        non_negative("letter_depth", rain.letter_depth)?;
        non_negative("fall_speed_min", rain.fall_speed_min)?;

        let attraction = &self.attraction;
        positive("base_force", attraction.base_force)?;
        positive("min_distance", attraction.min_distance)?;
        positive("absorb_ramp_secs", attraction.absorb_ramp_secs)?;
        unit_interval("forced_damping", attraction.forced_damping)?;
        positive("max_letter_speed", attraction.max_letter_speed)?;
        if attraction.absorb_radius_factor > attraction.forced_radius_factor {
            return Err("forced_radius_factor must be >= absorb_radius_factor".to_string());
        }

        positive("attractor radius", self.attractor.radius)?;
        unit_interval("attractor opacity", self.attractor.opacity)?;

        let formation = &self.formation;
        positive("line_width", formation.line_width)?;
        positive("density", formation.density)?;
        if !(0.0..1.0).contains(&formation.yin_gap) {
            return Err("yin_gap must be within [0, 1)".to_string());
        }
        if formation.assign_per_frame == 0 {
            return Err("assign_per_frame must be > 0".to_string());
        }
        unit_interval("lock_threshold", formation.lock_threshold)?;
        unit_interval("formed_fraction", formation.formed_fraction)?;
        positive("speed_min", formation.speed_min)?;

        if self.emission.batch_size == 0 {
            return Err("batch_size must be > 0".to_string());
        }
        unit_interval("drift_decay", self.emission.drift_decay)?;

        let sequence = &self.sequence;
        non_negative("formation_start_delay_secs", sequence.formation_start_delay_secs)?;
        positive("hexagram_timeout_secs", sequence.hexagram_timeout_secs)?;
        positive("rise_secs", sequence.rise_secs)?;
        self.left_pattern()?;
        self.right_pattern()?;

        let camera = &self.camera;
        if !camera.fov_degrees.is_finite() || camera.fov_degrees <= 0.0 || camera.fov_degrees >= 180.0
        {
            return Err("fov_degrees must be within (0, 180)".to_string());
        }
        positive("camera distance", camera.distance)?;
        positive("viewport_width", camera.viewport_width)?;
        positive("viewport_height", camera.viewport_height)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scene_config_is_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config =
            SceneConfig::from_json(r#"{ "rain": { "maxColumns": 12 }, "sequence": { "riseSecs": 3.0 } }"#)
                .unwrap();
        assert_eq!(config.rain.max_columns, 12);
        assert_eq!(config.rain.letter_spacing, 0.8);
        assert_eq!(config.sequence.rise_secs, 3.0);
        assert_eq!(config.attraction, AttractionConfig::default());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(SceneConfig::from_json("{ rain: ").is_err());
    }

    #[test]
    fn bad_pattern_invalid() {
        let mut config = SceneConfig::default();
        config.sequence.left_pattern = vec![1, 1, 1];
        let err = config.validate().unwrap_err();
        assert!(err.starts_with("left_pattern"));
    }

    #[test]
    fn absorb_radius_beyond_forced_radius_invalid() {
        let mut config = SceneConfig::default();
        config.attraction.absorb_radius_factor = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_source_lines_invalid() {
        let mut config = SceneConfig::default();
        config.rain.lines = vec!["   ".to_string(), String::new()];
        assert!(config.validate().is_err());
    }
}
