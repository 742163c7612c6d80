// Renderer schema and export targets.

pub mod export;
pub mod schema;
