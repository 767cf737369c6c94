use std::path::PathBuf;

/// Headless runner configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub frame_rate_hz: u32,
    pub rng_seed: u64,
    /// Upper bound on a session (seconds)
    pub session_secs: f64,
    /// Scripted pointer-down time (seconds)
    pub press_at_secs: f64,
    /// How long the scripted pointer stays down (seconds)
    pub hold_secs: f64,
    /// Font file raced against `font_timeout_ms` before the rain starts
    pub font_path: Option<PathBuf>,
    pub font_timeout_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 60,
            rng_seed: 42,
            session_secs: 30.0,
            press_at_secs: 0.5,
            hold_secs: 1.5,
            font_path: None,
            font_timeout_ms: 300,
        }
    }
}

impl SimConfig {
    /// Apply `--seconds S`, `--seed N`, `--hold S`, `--fps N` and
    /// `--font PATH`. Unparsable values keep the default.
    pub fn from_args(args: &[String]) -> Self {
        let mut config = Self::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--seconds" => {
                    i += 1;
                    config.session_secs = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(config.session_secs);
                }
                "--seed" => {
                    i += 1;
                    config.rng_seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(config.rng_seed);
                }
                "--hold" => {
                    i += 1;
                    config.hold_secs = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(config.hold_secs);
                }
                "--fps" => {
                    i += 1;
                    config.frame_rate_hz = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(config.frame_rate_hz);
                }
                "--font" => {
                    i += 1;
                    config.font_path = args.get(i).map(PathBuf::from);
                }
                _ => {}
            }
            i += 1;
        }
        config
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_rate_hz == 0 {
            return Err("frame_rate_hz must be > 0".to_string());
        }
        if !self.session_secs.is_finite() || self.session_secs <= 0.0 {
            return Err("session_secs must be > 0".to_string());
        }
        if !self.press_at_secs.is_finite() || self.press_at_secs < 0.0 {
            return Err("press_at_secs must be >= 0".to_string());
        }
        if !self.hold_secs.is_finite() || self.hold_secs < 0.0 {
            return Err("hold_secs must be >= 0".to_string());
        }
        if self.press_at_secs + self.hold_secs >= self.session_secs {
            return Err("session must outlast the scripted press".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("hexrain-sim")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn default_sim_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn args_override_defaults() {
        let config = SimConfig::from_args(&args(&["--seconds", "12", "--seed", "7", "--fps", "30"]));
        assert_eq!(config.session_secs, 12.0);
        assert_eq!(config.rng_seed, 7);
        assert_eq!(config.frame_rate_hz, 30);
        assert_eq!(config.hold_secs, 1.5);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let config = SimConfig::from_args(&args(&["--seed", "abc", "--hold"]));
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn zero_fps_invalid() {
        let config = SimConfig {
            frame_rate_hz: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn press_must_fit_in_session() {
        let config = SimConfig {
            session_secs: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
