//! Derived analytics: full-history totals, the trailing-week view, today's
//! summary, and the day streak.
//!
//! Everything here is a pure function of the session history plus a caller
//! supplied "today", so the calendar-sensitive parts stay testable. The
//! engine recomputes from scratch on every session end rather than
//! maintaining increments; at the scale of one person's study history the
//! O(n) pass is not worth trading for incremental bookkeeping.

use chrono::{Datelike, Days, NaiveDate};

use crate::focus::scoring::compute_focus_score;
use crate::models::{Analytics, SessionRecord, TodayStats, WeeklyEntry};

fn round_minutes(seconds: f64) -> u32 {
    (seconds / 60.0).round() as u32
}

/// Recompute every derived field of the aggregate from the session list.
pub fn recompute(analytics: &mut Analytics, today: NaiveDate) {
    let sessions = &analytics.sessions;

    let focused_secs: f64 = sessions.iter().map(|s| s.focused_seconds as f64).sum();
    let distracted_secs: f64 = sessions.iter().map(|s| s.distracted_seconds as f64).sum();
    let total_secs = focused_secs + distracted_secs;

    let episodes: Vec<u32> = sessions
        .iter()
        .flat_map(|s| s.distraction_events.iter().copied())
        .collect();

    let average_secs = if sessions.is_empty() {
        0.0
    } else {
        focused_secs / sessions.len() as f64
    };

    let score = compute_focus_score(focused_secs, total_secs, episodes.len(), &episodes);

    analytics.total_focused_minutes = round_minutes(focused_secs);
    analytics.total_distraction_minutes = round_minutes(distracted_secs);
    analytics.average_session_length = round_minutes(average_secs);
    analytics.focus_score = score.round() as u32;
    analytics.weekly_data = weekly_data(sessions, today);
}

/// Sum today's sessions, bucketed by the calendar date of their start.
pub fn today_stats(sessions: &[SessionRecord], today: NaiveDate) -> TodayStats {
    let todays: Vec<&SessionRecord> = sessions
        .iter()
        .filter(|s| s.start_time.date_naive() == today)
        .collect();

    let focused_secs: f64 = todays.iter().map(|s| s.focused_seconds as f64).sum();
    let distracted_secs: f64 = todays.iter().map(|s| s.distracted_seconds as f64).sum();

    TodayStats {
        sessions: todays.len(),
        focused_minutes: round_minutes(focused_secs),
        distracted_minutes: round_minutes(distracted_secs),
        total_minutes: round_minutes(focused_secs + distracted_secs),
    }
}

/// The last 7 calendar days, oldest first and ending today, with per-day
/// focused/distracted minute sums. Sessions outside the window are excluded.
pub fn weekly_data(sessions: &[SessionRecord], today: NaiveDate) -> Vec<WeeklyEntry> {
    (0u64..7)
        .map(|i| {
            let date = today - Days::new(6 - i);
            let mut focused_secs = 0.0;
            let mut distracted_secs = 0.0;
            for session in sessions {
                if session.start_time.date_naive() == date {
                    focused_secs += session.focused_seconds as f64;
                    distracted_secs += session.distracted_seconds as f64;
                }
            }
            WeeklyEntry {
                date,
                day: date.weekday().to_string(),
                focused: round_minutes(focused_secs),
                distracted: round_minutes(distracted_secs),
            }
        })
        .collect()
}

/// Count consecutive calendar days with at least one session, walking back
/// from today. The first gap day breaks the streak.
pub fn streak(sessions: &[SessionRecord], today: NaiveDate) -> u32 {
    let mut days: Vec<NaiveDate> = sessions.iter().map(|s| s.start_time.date_naive()).collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let mut streak = 0;
    let mut cursor = today;
    for day in days {
        if day == cursor {
            streak += 1;
            cursor = cursor - Days::new(1);
        } else if day < cursor {
            break;
        }
        // A day after the cursor (only possible for future-dated sessions)
        // neither extends nor breaks the streak.
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActiveSession, SessionMeta};
    use chrono::{TimeZone, Utc};

    fn session_on(date: NaiveDate, focused: u32, distracted: u32) -> SessionRecord {
        let start = Utc
            .with_ymd_and_hms(date.year(), date.month(), date.day(), 10, 0, 0)
            .unwrap();
        let mut active = ActiveSession::new(SessionMeta::default(), start);
        active.focused_seconds = focused;
        active.distracted_seconds = distracted;
        active.finalize(start + chrono::Duration::seconds((focused + distracted) as i64))
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn streak_breaks_on_gap() {
        let today = day(2025, 3, 10);
        let sessions = vec![
            session_on(day(2025, 3, 10), 600, 0),
            session_on(day(2025, 3, 9), 600, 0),
            session_on(day(2025, 3, 8), 600, 0),
            // Gap on the 7th.
            session_on(day(2025, 3, 6), 600, 0),
        ];
        assert_eq!(streak(&sessions, today), 3);
    }

    #[test]
    fn streak_ignores_duplicate_days() {
        let today = day(2025, 3, 10);
        let sessions = vec![
            session_on(day(2025, 3, 10), 600, 0),
            session_on(day(2025, 3, 10), 300, 0),
            session_on(day(2025, 3, 9), 600, 0),
        ];
        assert_eq!(streak(&sessions, today), 2);
    }

    #[test]
    fn streak_zero_without_session_today() {
        let today = day(2025, 3, 10);
        let sessions = vec![session_on(day(2025, 3, 9), 600, 0)];
        assert_eq!(streak(&sessions, today), 0);
    }

    #[test]
    fn weekly_buckets_by_day_once() {
        let today = day(2025, 3, 10);
        let sessions = vec![
            session_on(day(2025, 3, 10), 1200, 60),
            session_on(day(2025, 3, 8), 600, 120),
            // Outside the 7-day window, must be excluded.
            session_on(day(2025, 3, 1), 6000, 0),
        ];
        let week = weekly_data(&sessions, today);
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, day(2025, 3, 4));
        assert_eq!(week[6].date, today);
        assert_eq!(week[6].focused, 20);
        assert_eq!(week[6].distracted, 1);
        assert_eq!(week[4].focused, 10);
        assert_eq!(week[4].distracted, 2);
        let bucketed: u32 = week.iter().map(|e| e.focused).sum();
        assert_eq!(bucketed, 30);
    }

    #[test]
    fn today_stats_filters_by_date() {
        let today = day(2025, 3, 10);
        let sessions = vec![
            session_on(day(2025, 3, 10), 540, 60),
            session_on(day(2025, 3, 9), 6000, 0),
        ];
        let stats = today_stats(&sessions, today);
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.focused_minutes, 9);
        assert_eq!(stats.distracted_minutes, 1);
        assert_eq!(stats.total_minutes, 10);
    }

    #[test]
    fn recompute_derives_all_fields() {
        let today = day(2025, 3, 10);
        let mut analytics = Analytics::default();
        analytics.sessions = vec![session_on(day(2025, 3, 10), 540, 60)];
        recompute(&mut analytics, today);

        assert_eq!(analytics.total_focused_minutes, 9);
        assert_eq!(analytics.total_distraction_minutes, 1);
        assert_eq!(analytics.average_session_length, 9);
        // 0.7*0.9 + 0.2*1.0 + 0.1*1.0 = 0.93 (no recorded episodes).
        assert_eq!(analytics.focus_score, 93);
        assert_eq!(analytics.weekly_data.len(), 7);
    }
}
