use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use log::info;
use tokio::sync::Mutex;

use studylens::{
    achievements::BadgeContext,
    detection::{DetectionClient, DEFAULT_BASE_URL},
    AchievementStore, FocusEngine, SessionOrchestrator, SettingsStore, Store, TaskFilter,
    TaskStore, TimerPhase,
};

const STATUS_EVERY_SECS: u64 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    // Reads RUST_LOG for overrides.
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("StudyLens starting up...");

    let data_dir = dirs::data_dir()
        .context("could not resolve a platform data directory")?
        .join("studylens");
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;

    let store = Store::open(data_dir.join("studylens.sqlite3"))?;

    // Finalizes any session that was live when the process last stopped.
    let engine = Arc::new(Mutex::new(FocusEngine::load(store.clone()).await?));
    let settings = Arc::new(SettingsStore::load(store.clone()).await?);
    let tasks = TaskStore::load(store.clone()).await?;
    let achievements = AchievementStore::load(store.clone()).await?;

    let base_url = std::env::var("STUDYLENS_BACKEND_URL")
        .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let client = DetectionClient::new(base_url);

    let orchestrator =
        SessionOrchestrator::new(store, engine.clone(), settings.clone(), client).await?;

    let active_tasks = tasks.list(TaskFilter::Active).len();
    if active_tasks > 0 {
        info!("{active_tasks} active tasks on the planner");
    }

    orchestrator.start_frames().await?;
    let snapshot = orchestrator.start().await?;
    info!(
        "Timer started: {} remaining ({:?} preset)",
        snapshot.formatted_time, snapshot.state.preset
    );

    let frame_rx = orchestrator.latest_frame().await;
    let mut status = tokio::time::interval(Duration::from_secs(STATUS_EVERY_SECS));
    status.tick().await;
    loop {
        tokio::select! {
            _ = status.tick() => {
                let snap = orchestrator.snapshot().await;
                let phase = match snap.state.phase {
                    TimerPhase::Work => "focus",
                    TimerPhase::Break => "break",
                };
                let camera = if frame_rx.borrow().is_some() { "live" } else { "no feed" };
                info!(
                    "{} left in {} phase ({:.0}% done, camera {})",
                    snap.formatted_time,
                    phase,
                    snap.progress * 100.0,
                    camera
                );
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("Shutting down...");
    orchestrator.stop_frames().await?;
    if let Some(record) = orchestrator.complete_session().await? {
        info!(
            "Session {} saved: {} min focused, {} min distracted",
            record.id,
            record.focused_seconds / 60,
            record.distracted_seconds / 60
        );
    }

    let engine = engine.lock().await;
    let today = engine.today_stats();
    let streak = engine.streak();
    info!(
        "Today: {} sessions, {} focused minutes (streak: {} days)",
        today.sessions, today.focused_minutes, streak
    );

    let newly_earned = achievements
        .check_unlocks(&BadgeContext {
            analytics: engine.analytics(),
            streak,
        })
        .await?;
    for badge in newly_earned {
        info!("Badge unlocked: {} {}", badge.icon, badge.name);
    }

    Ok(())
}
