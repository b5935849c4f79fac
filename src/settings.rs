use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};
use tokio::sync::watch;

use crate::background::relay::DEFAULT_MODEL;

/// User preference flags. Field names match the persisted keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub open_screenshot: bool,
    pub open_ocr_text: bool,
    pub stealth_mode: bool,
    pub selected_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            open_screenshot: false,
            open_ocr_text: false,
            stealth_mode: false,
            selected_model: DEFAULT_MODEL.into(),
        }
    }
}

pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<Settings>,
    notify: watch::Sender<Settings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            Settings::default()
        };

        Ok(Self::build(Some(path), data))
    }

    /// A store that never touches the disk.
    pub fn in_memory(data: Settings) -> Self {
        Self::build(None, data)
    }

    fn build(path: Option<PathBuf>, data: Settings) -> Self {
        let (notify, _) = watch::channel(data.clone());
        Self {
            path,
            data: RwLock::new(data),
            notify,
        }
    }

    pub fn snapshot(&self) -> Settings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Applies `change`, persists the result and notifies subscribers.
    pub fn update(&self, change: impl FnOnce(&mut Settings)) -> Result<Settings> {
        let updated = {
            let mut guard = self
                .data
                .write()
                .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
            change(&mut guard);
            self.persist(&guard)?;
            guard.clone()
        };

        self.notify.send_replace(updated.clone());
        Ok(updated)
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.notify.subscribe()
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}

impl SettingsStore {
    /// Re-reads the file after an external edit and notifies subscribers.
    pub fn reload(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let contents = fs::read_to_string(path)?;
        let data: Settings = serde_json::from_str(&contents)?;
        {
            let mut guard = self
                .data
                .write()
                .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
            *guard = data.clone();
        }
        self.notify.send_replace(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.snapshot();

        assert!(!settings.open_screenshot);
        assert!(!settings.open_ocr_text);
        assert!(!settings.stealth_mode);
        assert_eq!(settings.selected_model, DEFAULT_MODEL);
    }

    #[test]
    fn partial_file_fills_missing_keys_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"stealthMode": true}"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().snapshot();
        assert!(settings.stealth_mode);
        assert_eq!(settings.selected_model, DEFAULT_MODEL);
    }

    #[test]
    fn update_persists_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        store
            .update(|s| {
                s.open_ocr_text = true;
                s.selected_model = "gpt-4o-mini".into();
            })
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["openOcrText"], true);
        assert_eq!(raw["selectedModel"], "gpt-4o-mini");

        let reopened = SettingsStore::new(path).unwrap();
        assert!(reopened.snapshot().open_ocr_text);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.snapshot(), Settings::default());
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let store = SettingsStore::in_memory(Settings::default());
        let mut rx = store.subscribe();

        store.update(|s| s.stealth_mode = true).unwrap();

        rx.changed().await.unwrap();
        assert!(rx.borrow().stealth_mode);
    }

    #[tokio::test]
    async fn reload_picks_up_external_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        let mut rx = store.subscribe();

        fs::write(&path, r#"{"openScreenshot": true, "selectedModel": "o1"}"#).unwrap();
        store.reload().unwrap();

        rx.changed().await.unwrap();
        let seen = rx.borrow().clone();
        assert!(seen.open_screenshot);
        assert_eq!(seen.selected_model, "o1");
        assert_eq!(store.snapshot(), seen);
    }
}
