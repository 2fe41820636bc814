use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerPreset;

pub const DEFAULT_SUBJECT: &str = "General";

/// Caller-supplied metadata for a new tracking session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMeta {
    pub subject: Option<String>,
    pub preset: Option<TimerPreset>,
    pub planned_minutes: Option<u32>,
}

/// A study session that is currently being tracked.
///
/// Mutated only by the focus engine while tracking is active; the 1 Hz
/// detection poll is the sole writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    /// Creation-time epoch milliseconds.
    pub id: i64,
    pub start_time: DateTime<Utc>,
    pub focused_seconds: u32,
    pub distracted_seconds: u32,
    pub blink_count: u32,
    /// Number of detection ticks where no face was present.
    pub face_detection_lost: u32,
    /// Durations (seconds) of closed distraction episodes, in order.
    pub distraction_events: Vec<u32>,
    /// Start of the in-progress distraction episode, if one is open.
    pub current_distraction_start: Option<DateTime<Utc>>,
    pub subject: String,
    pub preset: Option<TimerPreset>,
    pub planned_minutes: Option<u32>,
}

impl ActiveSession {
    pub fn new(meta: SessionMeta, now: DateTime<Utc>) -> Self {
        Self {
            id: now.timestamp_millis(),
            start_time: now,
            focused_seconds: 0,
            distracted_seconds: 0,
            blink_count: 0,
            face_detection_lost: 0,
            distraction_events: Vec::new(),
            current_distraction_start: None,
            subject: meta.subject.unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            preset: meta.preset,
            planned_minutes: meta.planned_minutes,
        }
    }

    /// Close an open distraction episode, folding its duration into
    /// `distraction_events`. No-op when none is open.
    pub fn close_open_distraction(&mut self, now: DateTime<Utc>) {
        if let Some(started) = self.current_distraction_start.take() {
            let millis = (now - started).num_milliseconds().max(0);
            let secs = ((millis as f64) / 1000.0).round() as u32;
            self.distraction_events.push(secs);
        }
    }

    /// Seal the session. Any open distraction episode is closed first.
    pub fn finalize(mut self, end_time: DateTime<Utc>) -> SessionRecord {
        self.close_open_distraction(end_time);
        SessionRecord {
            id: self.id,
            start_time: self.start_time,
            end_time: Some(end_time),
            focused_seconds: self.focused_seconds,
            distracted_seconds: self.distracted_seconds,
            blink_count: self.blink_count,
            face_detection_lost: self.face_detection_lost,
            distraction_events: self.distraction_events,
            subject: self.subject,
            preset: self.preset,
            planned_minutes: self.planned_minutes,
        }
    }
}

/// A finalized study session. Immutable once appended to the analytics
/// history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub focused_seconds: u32,
    pub distracted_seconds: u32,
    pub blink_count: u32,
    pub face_detection_lost: u32,
    pub distraction_events: Vec<u32>,
    pub subject: String,
    pub preset: Option<TimerPreset>,
    pub planned_minutes: Option<u32>,
}

impl SessionRecord {
    pub fn total_seconds(&self) -> u32 {
        self.focused_seconds + self.distracted_seconds
    }

    /// Focused share of the session as a 0-100 percentage.
    pub fn focus_rate(&self) -> u32 {
        let total = self.total_seconds();
        if total == 0 {
            return 0;
        }
        ((self.focused_seconds as f64 / total as f64) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn finalize_closes_open_distraction() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let mut session = ActiveSession::new(SessionMeta::default(), start);
        session.current_distraction_start =
            Some(Utc.with_ymd_and_hms(2025, 3, 10, 9, 5, 0).unwrap());

        let record = session.finalize(Utc.with_ymd_and_hms(2025, 3, 10, 9, 5, 7).unwrap());
        assert_eq!(record.distraction_events, vec![7]);
        assert!(record.end_time.is_some());
    }

    #[test]
    fn default_subject_applied() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let session = ActiveSession::new(SessionMeta::default(), now);
        assert_eq!(session.subject, "General");
        assert_eq!(session.id, now.timestamp_millis());
    }

    #[test]
    fn focus_rate_rounds() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let mut session = ActiveSession::new(SessionMeta::default(), now);
        session.focused_seconds = 540;
        session.distracted_seconds = 60;
        let record = session.finalize(now);
        assert_eq!(record.focus_rate(), 90);
    }
}
