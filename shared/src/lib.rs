//! Types shared by the hexrain engine and its Bevy client.

pub mod config;
pub mod pattern;
pub mod vec3;
