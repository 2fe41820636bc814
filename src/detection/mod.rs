pub mod client;
pub mod controller;
pub mod poller;

pub use client::{DetectionClient, DetectionState, FrameUpdate, DEFAULT_BASE_URL};
pub use controller::PollerController;
