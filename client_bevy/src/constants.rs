/// Startup window size in logical pixels
pub const WINDOW_WIDTH: u32 = 1280;
pub const WINDOW_HEIGHT: u32 = 720;

/// Seed for the scene RNG when `HEXRAIN_SEED` is unset
pub const DEFAULT_SEED: u64 = 42;

pub const FONT_PATH: &str = "fonts/Inter-SemiBold.ttf";
/// The rain starts after this long even if the font is still loading
pub const FONT_TIMEOUT_SECS: f32 = 0.3;

/// Glyphs are rasterized at this size and scaled to `LETTER_SIZE`
pub const LETTER_FONT_SIZE: f32 = 48.0;
/// Glyph height in scene units
pub const LETTER_SIZE: f64 = 0.72;

/// Formation particle diameter in scene units
pub const PARTICLE_SIZE: f64 = 0.15;
/// Hexagram line thickness in scene units
pub const LINE_THICKNESS: f64 = 0.16;
/// Attractor sprite diameter at scale 1, in scene units
pub const ATTRACTOR_SIZE: f64 = 1.0;

/// Draw order bands. Letters take z in [LETTER_Z - depth, LETTER_Z].
pub const LETTER_Z: f32 = 10.0;
pub const ATTRACTOR_Z: f32 = 20.0;
pub const LINE_Z: f32 = 30.0;
pub const PARTICLE_Z: f32 = 40.0;

#[derive(Clone, Copy)]
pub struct Colors;

impl Colors {
    pub const BACKGROUND: u32 = 0x000000;
    pub const LETTER: u32 = 0xffffff;
    pub const PARTICLE: u32 = 0xffffff;
    pub const LINE: u32 = 0xffffff;
    pub const ATTRACTOR_CORE: u32 = 0x000000;
    pub const ATTRACTOR_INNER: u32 = 0x141414;
    pub const ATTRACTOR_OUTER: u32 = 0x505050;
}

pub fn color_from_hex(rgb: u32) -> bevy::prelude::Color {
    let r = ((rgb >> 16) & 0xff) as f32 / 255.0;
    let g = ((rgb >> 8) & 0xff) as f32 / 255.0;
    let b = (rgb & 0xff) as f32 / 255.0;
    bevy::prelude::Color::srgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_from_hex_parses_correctly() {
        let c = color_from_hex(0xFF8040);
        if let bevy::prelude::Color::Srgba(srgba) = c {
            assert!((srgba.red - 1.0).abs() < 1e-3);
            assert!((srgba.green - 0.502).abs() < 1e-2);
            assert!((srgba.blue - 0.251).abs() < 1e-2);
        } else {
            panic!("Expected Srgba color variant");
        }
    }
}
