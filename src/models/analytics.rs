use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SessionRecord;

/// Persisted analytics aggregate.
///
/// `sessions` is the single source of truth; every other field is derived
/// from it (plus today's date) and recomputed in full when a session ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Analytics {
    pub sessions: Vec<SessionRecord>,
    pub weekly_data: Vec<WeeklyEntry>,
    pub total_focused_minutes: u32,
    pub total_distraction_minutes: u32,
    pub average_session_length: u32,
    /// Hybrid focus score over the full history, 0-100.
    pub focus_score: u32,
}

impl Default for Analytics {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            weekly_data: Vec::new(),
            total_focused_minutes: 0,
            total_distraction_minutes: 0,
            average_session_length: 0,
            focus_score: 100,
        }
    }
}

/// One calendar day of the trailing-week view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyEntry {
    pub date: NaiveDate,
    /// Short weekday name ("Mon", "Tue", ...).
    pub day: String,
    pub focused: u32,
    pub distracted: u32,
}

/// Summary of today's sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    pub sessions: usize,
    pub focused_minutes: u32,
    pub distracted_minutes: u32,
    pub total_minutes: u32,
}
