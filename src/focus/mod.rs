pub mod aggregates;
pub mod engine;
pub mod scoring;

pub use engine::FocusEngine;
pub use scoring::compute_focus_score;
