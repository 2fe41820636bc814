use std::sync::Arc;

use chrono::Utc;
use log::{error, info, warn};
use tokio::sync::{watch, Mutex};
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::client::DetectionClient;
use crate::focus::FocusEngine;

const POLL_INTERVAL_SECS: u64 = 1;
const POLL_TIMEOUT_SECS: u64 = 10;
const CHECKPOINT_EVERY_TICKS: u32 = 10;

/// Pause between frame fetch attempts after a failure, so a down backend
/// does not turn the best-effort loop into a busy spin.
const FRAME_RETRY_DELAY_MS: u64 = 500;

/// Fixed 1 Hz poll of the detection backend, feeding the focus engine.
///
/// A failed or timed-out fetch is logged and the tick skipped; at most one
/// second of stats is lost and nothing is backfilled. The active session is
/// checkpointed every `CHECKPOINT_EVERY_TICKS` successful readings.
pub async fn detection_loop(
    client: DetectionClient,
    engine: Arc<Mutex<FocusEngine>>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(POLL_INTERVAL_SECS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut ticks: u32 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let fut = client.detection_state();
                match tokio::time::timeout(Duration::from_secs(POLL_TIMEOUT_SECS), fut).await {
                    Ok(Ok(state)) => {
                        let now = Utc::now();
                        let mut guard = engine.lock().await;
                        guard.update_session_stats(&state, now);

                        ticks = ticks.wrapping_add(1);
                        if ticks % CHECKPOINT_EVERY_TICKS == 0 {
                            if let Err(err) = guard.checkpoint().await {
                                error!("Failed to checkpoint active session: {err:#}");
                            }
                        }
                    }
                    Ok(Err(err)) => warn!("detection poll failed, skipping tick: {err:#}"),
                    Err(_) => warn!("detection poll timeout (> {POLL_TIMEOUT_SECS}s), skipping tick"),
                }
            }
            _ = cancel_token.cancelled() => {
                info!("detection poll shutting down");
                break;
            }
        }
    }
}

/// Best-effort continuous frame refresh: the next fetch is scheduled only
/// once the previous one resolves. Latest frame is published on the watch
/// channel; stale frames are simply overwritten.
pub async fn frame_loop(
    client: DetectionClient,
    frame_tx: watch::Sender<Option<String>>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            result = client.frame() => {
                match result {
                    Ok(update) => {
                        let _ = frame_tx.send(Some(update.frame));
                    }
                    Err(err) => {
                        warn!("frame fetch failed: {err:#}");
                        tokio::time::sleep(Duration::from_millis(FRAME_RETRY_DELAY_MS)).await;
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                info!("frame loop shutting down");
                break;
            }
        }
    }
}
