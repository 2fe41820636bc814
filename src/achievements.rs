use std::sync::RwLock;

use anyhow::Result;
use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use log::info;
use serde::{Deserialize, Serialize};

use crate::models::Analytics;
use crate::store::{keys, Store};

/// Everything a badge requirement can look at.
pub struct BadgeContext<'a> {
    pub analytics: &'a Analytics,
    pub streak: u32,
}

pub struct BadgeSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    requirement: fn(&BadgeContext<'_>) -> bool,
}

impl BadgeSpec {
    pub fn earned(&self, ctx: &BadgeContext<'_>) -> bool {
        (self.requirement)(ctx)
    }
}

pub const BADGES: &[BadgeSpec] = &[
    BadgeSpec {
        id: "first_session",
        name: "Getting Started",
        description: "Complete your first study session",
        icon: "🎯",
        requirement: |ctx| ctx.analytics.sessions.len() >= 1,
    },
    BadgeSpec {
        id: "three_sessions",
        name: "Consistency Builder",
        description: "Complete 3 study sessions",
        icon: "📚",
        requirement: |ctx| ctx.analytics.sessions.len() >= 3,
    },
    BadgeSpec {
        id: "ten_sessions",
        name: "Dedicated Learner",
        description: "Complete 10 study sessions",
        icon: "⭐",
        requirement: |ctx| ctx.analytics.sessions.len() >= 10,
    },
    BadgeSpec {
        id: "fifty_sessions",
        name: "Study Master",
        description: "Complete 50 study sessions",
        icon: "🏆",
        requirement: |ctx| ctx.analytics.sessions.len() >= 50,
    },
    BadgeSpec {
        id: "streak_3",
        name: "3-Day Streak",
        description: "Study for 3 days in a row",
        icon: "🔥",
        requirement: |ctx| ctx.streak >= 3,
    },
    BadgeSpec {
        id: "streak_7",
        name: "Week Warrior",
        description: "Study for 7 days in a row",
        icon: "💪",
        requirement: |ctx| ctx.streak >= 7,
    },
    BadgeSpec {
        id: "streak_30",
        name: "Monthly Master",
        description: "Study for 30 days in a row",
        icon: "👑",
        requirement: |ctx| ctx.streak >= 30,
    },
    BadgeSpec {
        id: "focused_30min",
        name: "Focus Apprentice",
        description: "Stay focused for 30 minutes straight",
        icon: "🎓",
        requirement: |ctx| {
            ctx.analytics
                .sessions
                .iter()
                .any(|s| s.focused_seconds >= 1800)
        },
    },
    BadgeSpec {
        id: "focused_60min",
        name: "Concentration King",
        description: "Stay focused for 60 minutes straight",
        icon: "👨‍🎓",
        requirement: |ctx| {
            ctx.analytics
                .sessions
                .iter()
                .any(|s| s.focused_seconds >= 3600)
        },
    },
    BadgeSpec {
        id: "high_focus_score",
        name: "Laser Focused",
        description: "Achieve 90%+ focus score",
        icon: "🎯",
        requirement: |ctx| ctx.analytics.focus_score >= 90,
    },
    BadgeSpec {
        id: "total_10hours",
        name: "10 Hour Club",
        description: "Accumulate 10 hours of focused study",
        icon: "⏰",
        requirement: |ctx| ctx.analytics.total_focused_minutes >= 600,
    },
    BadgeSpec {
        id: "total_50hours",
        name: "50 Hour Hero",
        description: "Accumulate 50 hours of focused study",
        icon: "🌟",
        requirement: |ctx| ctx.analytics.total_focused_minutes >= 3000,
    },
    BadgeSpec {
        id: "early_bird",
        name: "Early Bird",
        description: "Complete a session before 8 AM",
        icon: "🌅",
        requirement: |ctx| {
            ctx.analytics
                .sessions
                .iter()
                .any(|s| s.start_time.hour() < 8)
        },
    },
    BadgeSpec {
        id: "night_owl",
        name: "Night Owl",
        description: "Complete a session after 10 PM",
        icon: "🦉",
        requirement: |ctx| {
            ctx.analytics
                .sessions
                .iter()
                .any(|s| s.start_time.hour() >= 22)
        },
    },
    BadgeSpec {
        id: "weekend_warrior",
        name: "Weekend Warrior",
        description: "Study on a Saturday or Sunday",
        icon: "🏖️",
        requirement: |ctx| {
            ctx.analytics.sessions.iter().any(|s| {
                matches!(s.start_time.weekday(), Weekday::Sat | Weekday::Sun)
            })
        },
    },
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedBadge {
    pub id: String,
    pub earned_at: DateTime<Utc>,
}

/// Persisted record of which badges have been earned. Unlocking is
/// one-way: a badge stays earned even if the stats later dip below its
/// requirement.
pub struct AchievementStore {
    store: Store,
    unlocked: RwLock<Vec<UnlockedBadge>>,
}

impl AchievementStore {
    pub async fn load(store: Store) -> Result<Self> {
        let unlocked = store.get_or(keys::ACHIEVEMENTS, Vec::new()).await?;
        Ok(Self {
            store,
            unlocked: RwLock::new(unlocked),
        })
    }

    pub fn unlocked(&self) -> Vec<UnlockedBadge> {
        self.unlocked.read().unwrap().clone()
    }

    pub fn is_unlocked(&self, badge_id: &str) -> bool {
        self.unlocked.read().unwrap().iter().any(|b| b.id == badge_id)
    }

    /// (earned, total) badge counts.
    pub fn progress(&self) -> (usize, usize) {
        (self.unlocked.read().unwrap().len(), BADGES.len())
    }

    /// Evaluate every badge against the current stats and persist any new
    /// unlocks. Returns only the newly earned badges; repeated calls with
    /// the same stats return nothing.
    pub async fn check_unlocks(
        &self,
        ctx: &BadgeContext<'_>,
    ) -> Result<Vec<&'static BadgeSpec>> {
        let mut newly_earned = Vec::new();
        let mut updated = self.unlocked.read().unwrap().clone();

        for badge in BADGES {
            let already = updated.iter().any(|b| b.id == badge.id);
            if !already && badge.earned(ctx) {
                info!("Badge unlocked: {} ({})", badge.name, badge.id);
                updated.push(UnlockedBadge {
                    id: badge.id.to_string(),
                    earned_at: Utc::now(),
                });
                newly_earned.push(badge);
            }
        }

        if !newly_earned.is_empty() {
            self.store.set(keys::ACHIEVEMENTS, &updated).await?;
            *self.unlocked.write().unwrap() = updated;
        }

        Ok(newly_earned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::focus::aggregates;
    use crate::models::{ActiveSession, SessionMeta};
    use chrono::TimeZone;

    fn analytics_with_sessions(count: usize) -> Analytics {
        let mut analytics = Analytics::default();
        for i in 0..count {
            let start = Utc
                .with_ymd_and_hms(2025, 3, 10, 10, 0, 0)
                .unwrap()
                + chrono::Duration::hours(i as i64);
            let mut session = ActiveSession::new(SessionMeta::default(), start);
            session.focused_seconds = 1800;
            analytics
                .sessions
                .push(session.finalize(start + chrono::Duration::seconds(1800)));
        }
        aggregates::recompute(
            &mut analytics,
            chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        );
        analytics
    }

    async fn temp_achievements() -> (tempfile::TempDir, AchievementStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("store.sqlite3")).unwrap();
        let achievements = AchievementStore::load(store).await.unwrap();
        (dir, achievements)
    }

    #[tokio::test]
    async fn first_session_unlocks_once() {
        let (_dir, achievements) = temp_achievements().await;
        let analytics = analytics_with_sessions(1);
        let ctx = BadgeContext {
            analytics: &analytics,
            streak: 1,
        };

        let earned = achievements.check_unlocks(&ctx).await.unwrap();
        assert!(earned.iter().any(|b| b.id == "first_session"));
        assert!(earned.iter().any(|b| b.id == "focused_30min"));

        // Idempotent: nothing new the second time around.
        let again = achievements.check_unlocks(&ctx).await.unwrap();
        assert!(again.is_empty());
        assert!(achievements.is_unlocked("first_session"));
    }

    #[tokio::test]
    async fn streak_badges_follow_the_streak() {
        let (_dir, achievements) = temp_achievements().await;
        let analytics = analytics_with_sessions(3);
        let ctx = BadgeContext {
            analytics: &analytics,
            streak: 7,
        };

        let earned = achievements.check_unlocks(&ctx).await.unwrap();
        let ids: Vec<&str> = earned.iter().map(|b| b.id).collect();
        assert!(ids.contains(&"streak_3"));
        assert!(ids.contains(&"streak_7"));
        assert!(!ids.contains(&"streak_30"));
    }

    #[tokio::test]
    async fn unlocks_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.sqlite3");
        let analytics = analytics_with_sessions(1);

        {
            let store = Store::open(path.clone()).unwrap();
            let achievements = AchievementStore::load(store).await.unwrap();
            achievements
                .check_unlocks(&BadgeContext {
                    analytics: &analytics,
                    streak: 1,
                })
                .await
                .unwrap();
        }

        let store = Store::open(path).unwrap();
        let achievements = AchievementStore::load(store).await.unwrap();
        assert!(achievements.is_unlocked("first_session"));
    }
}
