use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// One reading from the face/blink detection backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionState {
    pub face_detected: bool,
    pub blink_count: u32,
}

/// A single camera frame, base64-encoded by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct FrameUpdate {
    pub frame: String,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// HTTP client for the detection backend.
#[derive(Clone)]
pub struct DetectionClient {
    http: reqwest::Client,
    base_url: String,
}

impl DetectionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn detection_state(&self) -> Result<DetectionState> {
        let url = format!("{}/detection_state", self.base_url);
        self.http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to fetch {url}"))?
            .error_for_status()
            .context("detection backend returned an error status")?
            .json()
            .await
            .context("failed to decode detection state")
    }

    pub async fn frame(&self) -> Result<FrameUpdate> {
        let url = format!("{}/frame", self.base_url);
        self.http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to fetch {url}"))?
            .error_for_status()
            .context("detection backend returned an error status")?
            .json()
            .await
            .context("failed to decode frame payload")
    }

    /// URL of the legacy MJPEG stream, for embedding directly in a view.
    pub fn video_feed_url(&self) -> String {
        format!("{}/video_feed", self.base_url)
    }
}
