use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::client::DetectionClient;
use super::poller::{detection_loop, frame_loop};
use crate::focus::FocusEngine;

struct LoopHandle {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Owns the polling tasks. Each loop is cancelled through its token and
/// joined on stop, so no polling task outlives its enabling condition.
pub struct PollerController {
    detection: Option<LoopHandle>,
    frames: Option<LoopHandle>,
    frame_tx: watch::Sender<Option<String>>,
}

impl PollerController {
    pub fn new() -> Self {
        let (frame_tx, _) = watch::channel(None);
        Self {
            detection: None,
            frames: None,
            frame_tx,
        }
    }

    pub fn detection_active(&self) -> bool {
        self.detection.is_some()
    }

    /// Receiver for the most recent camera frame (base64 data URL).
    pub fn latest_frame(&self) -> watch::Receiver<Option<String>> {
        self.frame_tx.subscribe()
    }

    pub fn start_detection(
        &mut self,
        client: DetectionClient,
        engine: Arc<Mutex<FocusEngine>>,
    ) -> Result<()> {
        if self.detection.is_some() {
            bail!("detection polling already active");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(detection_loop(client, engine, cancel_token.clone()));
        self.detection = Some(LoopHandle {
            handle,
            cancel_token,
        });
        Ok(())
    }

    pub async fn stop_detection(&mut self) -> Result<()> {
        stop_loop(self.detection.take(), "detection loop").await
    }

    pub fn start_frames(&mut self, client: DetectionClient) -> Result<()> {
        if self.frames.is_some() {
            bail!("frame polling already active");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(frame_loop(
            client,
            self.frame_tx.clone(),
            cancel_token.clone(),
        ));
        self.frames = Some(LoopHandle {
            handle,
            cancel_token,
        });
        Ok(())
    }

    pub async fn stop_frames(&mut self) -> Result<()> {
        stop_loop(self.frames.take(), "frame loop").await
    }
}

impl Default for PollerController {
    fn default() -> Self {
        Self::new()
    }
}

async fn stop_loop(slot: Option<LoopHandle>, what: &str) -> Result<()> {
    let Some(LoopHandle {
        handle,
        cancel_token,
    }) = slot
    else {
        return Ok(());
    };

    cancel_token.cancel();
    handle
        .await
        .with_context(|| format!("{what} task failed to join"))
}
