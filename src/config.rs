use std::{env, path::PathBuf, time::Duration};

use crate::content::ocr::LanguagePair;

pub const DEFAULT_RELAY_URL: &str = "http://localhost:9005";
const STEALTH_DISPLAY_MS: u64 = 3_000;
const STEALTH_FADE_MS: u64 = 300;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the relay; requests go to `<base>/chat`.
    pub relay_url: String,
    pub ocr_languages: LanguagePair,
    pub settings_path: PathBuf,
    pub device_pixel_ratio: f64,
    pub render: RenderTiming,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderTiming {
    pub stealth_display: Duration,
    pub stealth_fade: Duration,
}

impl Default for RenderTiming {
    fn default() -> Self {
        Self {
            stealth_display: Duration::from_millis(STEALTH_DISPLAY_MS),
            stealth_fade: Duration::from_millis(STEALTH_FADE_MS),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.into(),
            ocr_languages: LanguagePair::default(),
            settings_path: PathBuf::from("snapask-settings.json"),
            device_pixel_ratio: 1.0,
            render: RenderTiming::default(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `SNAPASK_RELAY_URL`, `SNAPASK_OCR_LANGS` and
    /// `SNAPASK_SETTINGS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("SNAPASK_RELAY_URL") {
            if !url.trim().is_empty() {
                config.relay_url = url.trim().to_string();
            }
        }
        if let Some(langs) = env::var("SNAPASK_OCR_LANGS")
            .ok()
            .and_then(|raw| LanguagePair::parse(&raw))
        {
            config.ocr_languages = langs;
        }
        if let Ok(path) = env::var("SNAPASK_SETTINGS") {
            if !path.is_empty() {
                config.settings_path = PathBuf::from(path);
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_local_relay() {
        let config = AppConfig::default();
        assert_eq!(config.relay_url, "http://localhost:9005");
        assert_eq!(config.ocr_languages.to_string(), "eng+pol");
        assert_eq!(config.render.stealth_display, Duration::from_secs(3));
        assert_eq!(config.render.stealth_fade, Duration::from_millis(300));
    }

    #[test]
    fn environment_overrides_defaults() {
        env::set_var("SNAPASK_RELAY_URL", "  http://relay.internal:8080 ");
        env::set_var("SNAPASK_OCR_LANGS", "deu+fra");
        env::set_var("SNAPASK_SETTINGS", "/tmp/snapask-test-settings.json");
        let config = AppConfig::from_env();

        assert_eq!(config.relay_url, "http://relay.internal:8080");
        assert_eq!(config.ocr_languages.to_string(), "deu+fra");
        assert_eq!(
            config.settings_path,
            PathBuf::from("/tmp/snapask-test-settings.json")
        );

        env::set_var("SNAPASK_RELAY_URL", "   ");
        env::set_var("SNAPASK_OCR_LANGS", "eng");
        env::set_var("SNAPASK_SETTINGS", "");
        let config = AppConfig::from_env();

        assert_eq!(config.relay_url, DEFAULT_RELAY_URL);
        assert_eq!(config.ocr_languages, LanguagePair::default());
        assert_eq!(config.settings_path, AppConfig::default().settings_path);

        for key in ["SNAPASK_RELAY_URL", "SNAPASK_OCR_LANGS", "SNAPASK_SETTINGS"] {
            env::remove_var(key);
        }
    }
}
