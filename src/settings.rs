use std::sync::RwLock;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::store::{keys, Store};
use crate::timer::TimerPreset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    Auto,
}

/// User preferences. Unknown or missing fields fall back to defaults so
/// settings written by older versions keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    // Camera & monitoring
    pub camera_enabled: bool,
    pub face_detection_sensitivity: Sensitivity,
    pub show_focus_graph: bool,

    // Timer preferences
    pub timer_preset: TimerPreset,
    pub custom_work_minutes: u32,
    pub custom_break_minutes: u32,
    pub auto_start_breaks: bool,
    pub auto_start_next_session: bool,

    // Notifications
    pub notifications_enabled: bool,
    pub sound_enabled: bool,
    pub desktop_notifications: bool,

    // UI & privacy
    pub theme: Theme,
    pub privacy_notice_accepted: bool,
    pub save_session_history: bool,
    pub show_achievements: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera_enabled: true,
            face_detection_sensitivity: Sensitivity::Medium,
            show_focus_graph: true,
            timer_preset: TimerPreset::Pomodoro,
            custom_work_minutes: 30,
            custom_break_minutes: 5,
            auto_start_breaks: true,
            auto_start_next_session: false,
            notifications_enabled: true,
            sound_enabled: true,
            desktop_notifications: false,
            theme: Theme::Light,
            privacy_notice_accepted: false,
            save_session_history: true,
            show_achievements: true,
        }
    }
}

/// Preferences store: an in-memory copy over the key-value store, written
/// through on every update.
pub struct SettingsStore {
    store: Store,
    data: RwLock<Settings>,
}

impl SettingsStore {
    pub async fn load(store: Store) -> Result<Self> {
        let data = store.get_or(keys::SETTINGS, Settings::default()).await?;
        Ok(Self {
            store,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> Settings {
        self.data.read().unwrap().clone()
    }

    /// Apply a mutation and persist the result.
    pub async fn update(&self, apply: impl FnOnce(&mut Settings)) -> Result<Settings> {
        let mut updated = self.get();
        apply(&mut updated);
        self.store.set(keys::SETTINGS, &updated).await?;
        *self.data.write().unwrap() = updated.clone();
        Ok(updated)
    }

    pub async fn reset(&self) -> Result<Settings> {
        self.update(|settings| *settings = Settings::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("store.sqlite3")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn defaults_when_nothing_persisted() {
        let (_dir, store) = temp_store();
        let settings = SettingsStore::load(store).await.unwrap();
        assert_eq!(settings.get(), Settings::default());
    }

    #[tokio::test]
    async fn updates_persist_across_reload() {
        let (_dir, store) = temp_store();
        {
            let settings = SettingsStore::load(store.clone()).await.unwrap();
            settings
                .update(|s| {
                    s.camera_enabled = false;
                    s.timer_preset = TimerPreset::Deepwork;
                })
                .await
                .unwrap();
        }

        let reloaded = SettingsStore::load(store).await.unwrap();
        let current = reloaded.get();
        assert!(!current.camera_enabled);
        assert_eq!(current.timer_preset, TimerPreset::Deepwork);
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let (_dir, store) = temp_store();
        let settings = SettingsStore::load(store).await.unwrap();
        settings.update(|s| s.sound_enabled = false).await.unwrap();
        settings.reset().await.unwrap();
        assert_eq!(settings.get(), Settings::default());
    }
}
