mod attractor;
mod core;
mod font;
mod formation;
mod input;
mod letters;

pub use attractor::AttractorPlugin;
pub use core::CorePlugin;
pub(crate) use core::{SceneEngine, UpdateSet};
pub use font::FontPlugin;
pub use formation::FormationPlugin;
pub use input::InputPlugin;
pub use letters::LettersPlugin;
