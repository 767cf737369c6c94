//! Hexrain scene engine.
//!
//! Letter rain, the attractor, hexagram formation units and the state
//! machine that drives them. Rendering and input live in the clients.

pub mod attractor;
pub mod camera;
pub mod config;
pub mod events;
pub mod formation;
pub mod orchestrator;
pub mod pool;
pub mod sim_loop;
pub mod timers;
pub mod tween;
