use serde::{Deserialize, Serialize};

/// Built-in work/break duration pairs (minutes).
const POMODORO: (u32, u32) = (25, 5);
const DEEPWORK: (u32, u32) = (50, 10);
const DEFAULT_CUSTOM: (u32, u32) = (30, 5);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimerPreset {
    Pomodoro,
    Deepwork,
    Custom,
}

impl Default for TimerPreset {
    fn default() -> Self {
        TimerPreset::Pomodoro
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerPhase {
    Work,
    Break,
}

/// Emitted by `tick` when a phase runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    WorkCompleted,
    BreakCompleted,
}

/// Countdown state machine for work/break intervals.
///
/// `time_left` is ephemeral and never persisted; only `sessions_completed`
/// survives restarts (the orchestrator writes it through on work→break).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub preset: TimerPreset,
    pub phase: TimerPhase,
    /// Seconds remaining in the current phase.
    pub time_left: u32,
    pub running: bool,
    pub sessions_completed: u32,
    pub custom_work_minutes: u32,
    pub custom_break_minutes: u32,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(TimerPreset::default())
    }
}

impl TimerState {
    pub fn new(preset: TimerPreset) -> Self {
        let mut state = Self {
            preset,
            phase: TimerPhase::Work,
            time_left: 0,
            running: false,
            sessions_completed: 0,
            custom_work_minutes: DEFAULT_CUSTOM.0,
            custom_break_minutes: DEFAULT_CUSTOM.1,
        };
        state.time_left = state.work_secs();
        state
    }

    fn durations_min(&self) -> (u32, u32) {
        match self.preset {
            TimerPreset::Pomodoro => POMODORO,
            TimerPreset::Deepwork => DEEPWORK,
            TimerPreset::Custom => (self.custom_work_minutes, self.custom_break_minutes),
        }
    }

    pub fn work_secs(&self) -> u32 {
        self.durations_min().0 * 60
    }

    pub fn break_secs(&self) -> u32 {
        self.durations_min().1 * 60
    }

    /// Nominal duration of the current phase.
    pub fn total_secs(&self) -> u32 {
        match self.phase {
            TimerPhase::Work => self.work_secs(),
            TimerPhase::Break => self.break_secs(),
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop counting down; `time_left` is retained.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Back to a stopped work phase at the full work duration.
    pub fn reset(&mut self) {
        self.running = false;
        self.phase = TimerPhase::Work;
        self.time_left = self.work_secs();
    }

    /// Toggle the phase immediately, forcing a stop.
    pub fn skip(&mut self) {
        self.phase = match self.phase {
            TimerPhase::Work => TimerPhase::Break,
            TimerPhase::Break => TimerPhase::Work,
        };
        self.time_left = self.total_secs();
        self.running = false;
    }

    pub fn change_preset(&mut self, preset: TimerPreset) {
        self.preset = preset;
        self.running = false;
        self.phase = TimerPhase::Work;
        self.time_left = self.work_secs();
    }

    /// Override the custom preset's durations (minutes).
    pub fn set_custom_time(&mut self, work_minutes: u32, break_minutes: u32) {
        self.custom_work_minutes = work_minutes;
        self.custom_break_minutes = break_minutes;
        if self.preset == TimerPreset::Custom {
            self.time_left = self.work_secs();
        }
    }

    /// Advance one second. At the phase boundary the phase flips, the new
    /// phase's full duration is loaded, and the timer auto-pauses — it never
    /// rolls straight into the next phase on its own.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if !self.running {
            return None;
        }

        if self.time_left > 1 {
            self.time_left -= 1;
            return None;
        }

        self.running = false;
        match self.phase {
            TimerPhase::Work => {
                self.sessions_completed += 1;
                self.phase = TimerPhase::Break;
                self.time_left = self.break_secs();
                Some(TickOutcome::WorkCompleted)
            }
            TimerPhase::Break => {
                self.phase = TimerPhase::Work;
                self.time_left = self.work_secs();
                Some(TickOutcome::BreakCompleted)
            }
        }
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        (total - self.time_left) as f64 / total as f64
    }

    /// "MM:SS" rendering of the remaining time.
    pub fn format_time(&self) -> String {
        let mins = self.time_left / 60;
        let secs = self.time_left % 60;
        format!("{mins:02}:{secs:02}")
    }
}
