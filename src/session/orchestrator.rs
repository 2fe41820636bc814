use std::{sync::Arc, time::Duration};

use anyhow::Result;
use log::{error, info};
use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle, time};

use crate::{
    detection::{DetectionClient, PollerController},
    focus::FocusEngine,
    models::{SessionMeta, SessionRecord},
    settings::SettingsStore,
    store::{keys, Store},
    timer::{TimerPhase, TimerPreset, TimerState},
};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub formatted_time: String,
    pub progress: f64,
}

/// Couples the countdown timer with focus tracking: sessions start and end
/// in lockstep with work-phase transitions, and detection polling runs only
/// while a work timer is counting down with the camera enabled.
#[derive(Clone)]
pub struct SessionOrchestrator {
    timer: Arc<Mutex<TimerState>>,
    engine: Arc<Mutex<FocusEngine>>,
    poller: Arc<Mutex<PollerController>>,
    settings: Arc<SettingsStore>,
    client: DetectionClient,
    store: Store,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
}

impl SessionOrchestrator {
    pub async fn new(
        store: Store,
        engine: Arc<Mutex<FocusEngine>>,
        settings: Arc<SettingsStore>,
        client: DetectionClient,
    ) -> Result<Self> {
        let prefs = settings.get();
        let mut timer = TimerState::new(prefs.timer_preset);
        timer.set_custom_time(prefs.custom_work_minutes, prefs.custom_break_minutes);
        timer.sessions_completed = store.get_or(keys::SESSIONS_COUNT, 0u32).await?;

        Ok(Self {
            timer: Arc::new(Mutex::new(timer)),
            engine,
            poller: Arc::new(Mutex::new(PollerController::new())),
            settings,
            client,
            store,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
        })
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        let timer = self.timer.lock().await;
        TimerSnapshot {
            formatted_time: timer.format_time(),
            progress: timer.progress(),
            state: timer.clone(),
        }
    }

    /// Receiver for the latest camera frame, for embedding in a view.
    pub async fn latest_frame(&self) -> tokio::sync::watch::Receiver<Option<String>> {
        self.poller.lock().await.latest_frame()
    }

    /// Begin the best-effort frame refresh. Independent of timer state,
    /// gated only on camera enablement.
    pub async fn start_frames(&self) -> Result<()> {
        if !self.settings.get().camera_enabled {
            return Ok(());
        }
        self.poller.lock().await.start_frames(self.client.clone())
    }

    pub async fn stop_frames(&self) -> Result<()> {
        self.poller.lock().await.stop_frames().await
    }

    /// Start (or resume) the countdown. Entering a running work phase with
    /// no active session begins focus tracking, tagged with the preset and
    /// the phase's planned length.
    pub async fn start(&self) -> Result<TimerSnapshot> {
        let work_meta = {
            let mut timer = self.timer.lock().await;
            if timer.running {
                drop(timer);
                return Ok(self.snapshot().await);
            }
            timer.start();
            (timer.phase == TimerPhase::Work).then(|| SessionMeta {
                subject: None,
                preset: Some(timer.preset),
                planned_minutes: Some(timer.total_secs() / 60),
            })
        };

        if let Some(meta) = work_meta {
            {
                let mut engine = self.engine.lock().await;
                if !engine.is_tracking() {
                    engine.start_session(meta).await?;
                }
            }

            if self.settings.get().camera_enabled {
                let mut poller = self.poller.lock().await;
                if !poller.detection_active() {
                    poller.start_detection(self.client.clone(), self.engine.clone())?;
                }
            }
        }

        self.spawn_ticker().await;
        Ok(self.snapshot().await)
    }

    /// Pause the countdown. The session stays open; stats simply stop
    /// accruing while detection polling is down.
    pub async fn pause(&self) -> Result<TimerSnapshot> {
        self.timer.lock().await.pause();
        self.cancel_ticker().await;
        self.poller.lock().await.stop_detection().await?;
        self.finalize_completed_session().await;
        Ok(self.snapshot().await)
    }

    /// Stop everything and return to a fresh work phase. An active session
    /// is always ended, however far along the timer was (the abandoned
    /// path records just like a completed one).
    pub async fn reset(&self) -> Result<TimerSnapshot> {
        self.timer.lock().await.reset();
        self.cancel_ticker().await;
        self.poller.lock().await.stop_detection().await?;

        let mut engine = self.engine.lock().await;
        if engine.is_tracking() {
            match engine.end_session().await {
                Ok(record) => info!("Session {} ended by reset", record.id),
                Err(err) => error!("Failed to end session on reset: {err:#}"),
            }
        }
        drop(engine);

        Ok(self.snapshot().await)
    }

    /// Toggle work/break immediately, forcing a stop.
    pub async fn skip(&self) -> Result<TimerSnapshot> {
        self.timer.lock().await.skip();
        self.cancel_ticker().await;
        self.poller.lock().await.stop_detection().await?;
        self.finalize_completed_session().await;
        Ok(self.snapshot().await)
    }

    pub async fn change_preset(&self, preset: TimerPreset) -> Result<TimerSnapshot> {
        self.timer.lock().await.change_preset(preset);
        self.cancel_ticker().await;
        self.poller.lock().await.stop_detection().await?;
        self.finalize_completed_session().await;
        Ok(self.snapshot().await)
    }

    pub async fn set_custom_time(&self, work_minutes: u32, break_minutes: u32) -> TimerSnapshot {
        self.timer
            .lock()
            .await
            .set_custom_time(work_minutes, break_minutes);
        self.snapshot().await
    }

    /// User-initiated early stop: end the active session unconditionally
    /// and reset the timer.
    pub async fn complete_session(&self) -> Result<Option<SessionRecord>> {
        self.cancel_ticker().await;
        self.poller.lock().await.stop_detection().await?;

        let record = {
            let mut engine = self.engine.lock().await;
            if engine.is_tracking() {
                Some(engine.end_session().await?)
            } else {
                None
            }
        };

        self.timer.lock().await.reset();
        Ok(record)
    }

    /// End the active session when a phase just ran out: the timer is
    /// stopped with `time_left` back at the full phase duration. A manual
    /// reset mid-phase never matches this (time_left < total there), but a
    /// reset issued in the same instant the timer expires is
    /// indistinguishable from natural completion.
    async fn finalize_completed_session(&self) {
        let completed = {
            let timer = self.timer.lock().await;
            !timer.running && timer.time_left == timer.total_secs()
        };
        if !completed {
            return;
        }

        let mut engine = self.engine.lock().await;
        if engine.is_tracking() {
            match engine.end_session().await {
                Ok(record) => info!(
                    "Session {} completed: {}s focused",
                    record.id, record.focused_seconds
                ),
                Err(err) => error!("Failed to finalize completed session: {err:#}"),
            }
        }
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let timer = self.timer.clone();
        let poller = self.poller.clone();
        let store = self.store.clone();
        let tick_interval = self.tick_interval;
        let orchestrator = self.clone();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            // The immediate first tick would otherwise eat a second.
            interval.tick().await;

            loop {
                interval.tick().await;

                let (outcome, sessions_completed) = {
                    let mut guard = timer.lock().await;
                    if !guard.running {
                        break;
                    }
                    (guard.tick(), guard.sessions_completed)
                };

                let Some(outcome) = outcome else {
                    continue;
                };

                info!("Timer phase boundary: {outcome:?}");

                if outcome == crate::timer::TickOutcome::WorkCompleted {
                    if let Err(err) = store.set(keys::SESSIONS_COUNT, &sessions_completed).await {
                        error!("Failed to persist session counter: {err:#}");
                    }
                }

                if let Err(err) = poller.lock().await.stop_detection().await {
                    error!("Failed to stop detection at phase boundary: {err:#}");
                }

                orchestrator.finalize_completed_session().await;

                // The boundary auto-pauses the timer; this ticker is done.
                break;
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}
