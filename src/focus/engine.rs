use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::detection::DetectionState;
use crate::focus::aggregates;
use crate::models::{ActiveSession, Analytics, SessionMeta, SessionRecord, TodayStats};
use crate::store::{keys, Store};

/// Active-session snapshot written to the store so a crash mid-session can
/// be recovered instead of losing the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionCheckpoint {
    session: ActiveSession,
    saved_at: DateTime<Utc>,
}

/// Owns the session lifecycle and the persisted analytics aggregate.
///
/// The 1 Hz detection poll is the only writer of the active session;
/// analytics are rewritten only when a session ends.
pub struct FocusEngine {
    store: Store,
    analytics: Analytics,
    active: Option<ActiveSession>,
}

impl FocusEngine {
    /// Load persisted analytics and recover any session that was active
    /// when the process last stopped.
    pub async fn load(store: Store) -> Result<Self> {
        let analytics = store
            .get_or(keys::ANALYTICS, Analytics::default())
            .await?;

        let mut engine = Self {
            store,
            analytics,
            active: None,
        };
        engine.recover_interrupted().await?;
        Ok(engine)
    }

    /// Finalize an orphaned checkpoint into the history. The last
    /// checkpoint time stands in for the unknown true end of the session.
    async fn recover_interrupted(&mut self) -> Result<()> {
        let Some(checkpoint) = self
            .store
            .get::<SessionCheckpoint>(keys::ACTIVE_SESSION)
            .await?
        else {
            return Ok(());
        };

        warn!(
            "Recovering interrupted session {} (last checkpoint {})",
            checkpoint.session.id, checkpoint.saved_at
        );

        let record = checkpoint.session.finalize(checkpoint.saved_at);
        self.analytics.sessions.push(record);
        aggregates::recompute(&mut self.analytics, Utc::now().date_naive());
        self.store.set(keys::ANALYTICS, &self.analytics).await?;
        self.store.remove(keys::ACTIVE_SESSION).await?;
        Ok(())
    }

    pub fn is_tracking(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_session(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    pub async fn start_session(&mut self, meta: SessionMeta) -> Result<()> {
        self.start_session_at(meta, Utc::now()).await
    }

    pub async fn start_session_at(&mut self, meta: SessionMeta, now: DateTime<Utc>) -> Result<()> {
        if self.active.is_some() {
            bail!("session already active");
        }

        let session = ActiveSession::new(meta, now);
        info!("Started session {} ({})", session.id, session.subject);
        self.active = Some(session);
        self.checkpoint_at(now).await
    }

    /// Fold one detection reading into the active session. No-op when no
    /// session is being tracked (e.g. a stale poll tick after a session
    /// ended).
    pub fn update_session_stats(&mut self, detection: &DetectionState, now: DateTime<Utc>) {
        let Some(session) = self.active.as_mut() else {
            return;
        };

        if detection.face_detected {
            session.focused_seconds += 1;
            session.close_open_distraction(now);
        } else {
            session.distracted_seconds += 1;
            session.face_detection_lost += 1;
            if session.current_distraction_start.is_none() {
                session.current_distraction_start = Some(now);
            }
        }

        // High-water mark: the backend may restart and report a lower
        // count; never let the session counter go backwards.
        if detection.blink_count > session.blink_count {
            session.blink_count = detection.blink_count;
        }
    }

    /// Persist the active-session snapshot for crash recovery.
    pub async fn checkpoint(&self) -> Result<()> {
        self.checkpoint_at(Utc::now()).await
    }

    async fn checkpoint_at(&self, now: DateTime<Utc>) -> Result<()> {
        let Some(session) = self.active.as_ref() else {
            return Ok(());
        };
        self.store
            .set(
                keys::ACTIVE_SESSION,
                &SessionCheckpoint {
                    session: session.clone(),
                    saved_at: now,
                },
            )
            .await
    }

    pub async fn end_session(&mut self) -> Result<SessionRecord> {
        self.end_session_at(Utc::now()).await
    }

    /// Finalize the active session and rebuild every derived analytics
    /// field over the full history.
    pub async fn end_session_at(&mut self, now: DateTime<Utc>) -> Result<SessionRecord> {
        let Some(session) = self.active.take() else {
            bail!("no active session to end");
        };

        let record = session.finalize(now);
        info!(
            "Ended session {}: {}s focused, {}s distracted, {} episodes",
            record.id,
            record.focused_seconds,
            record.distracted_seconds,
            record.distraction_events.len()
        );

        self.analytics.sessions.push(record.clone());
        aggregates::recompute(&mut self.analytics, now.date_naive());
        self.store.set(keys::ANALYTICS, &self.analytics).await?;
        self.store.remove(keys::ACTIVE_SESSION).await?;

        Ok(record)
    }

    pub fn today_stats(&self) -> TodayStats {
        aggregates::today_stats(&self.analytics.sessions, Utc::now().date_naive())
    }

    pub fn streak(&self) -> u32 {
        aggregates::streak(&self.analytics.sessions, Utc::now().date_naive())
    }
}
