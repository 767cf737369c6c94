use crate::formation::UnitSide;

/// Stable handle of a falling letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LetterId(pub u64);

/// Stable handle of a formation particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(pub u64);

/// Scene-graph changes for the renderer. The engine only tracks logical
/// state; whoever draws it mirrors these into its own objects.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    LetterSpawned { id: LetterId, glyph: char, alpha: f64 },
    LetterRemoved { id: LetterId },
    ParticleSpawned { id: ParticleId },
    ParticleRemoved { id: ParticleId },
    UnitCreated { side: UnitSide },
    UnitDisposed { side: UnitSide },
}

/// Pending events, drained once per frame.
#[derive(Debug, Default)]
pub struct SceneOutbox {
    events: Vec<SceneEvent>,
}

impl SceneOutbox {
    pub fn push(&mut self, event: SceneEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
