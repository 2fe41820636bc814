pub mod state;

pub use state::{TickOutcome, TimerPhase, TimerPreset, TimerState};
