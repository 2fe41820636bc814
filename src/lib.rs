pub mod achievements;
pub mod detection;
pub mod export;
pub mod focus;
pub mod models;
pub mod session;
pub mod settings;
pub mod store;
pub mod tasks;
pub mod timer;

pub use achievements::{AchievementStore, BadgeContext, BADGES};
pub use detection::{DetectionClient, DetectionState, PollerController};
pub use focus::FocusEngine;
pub use models::{Analytics, SessionMeta, SessionRecord, Task};
pub use session::{SessionOrchestrator, TimerSnapshot};
pub use settings::{Settings, SettingsStore};
pub use store::Store;
pub use tasks::{TaskFilter, TaskStore};
pub use timer::{TimerPhase, TimerPreset, TimerState};
