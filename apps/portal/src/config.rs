use std::{fs, path::Path};

use serde::Deserialize;

pub const SETTINGS_FILE: &str = "portal.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    log_filter: Option<String>,
}

/// Loads settings along with any warnings about ignored input. Logging is
/// configured from these settings, so the caller reports the warnings once
/// the subscriber is installed.
pub fn load_settings() -> (Settings, Vec<String>) {
    let mut settings = Settings::default();
    let warnings = apply_file(&mut settings, Path::new(SETTINGS_FILE))
        .into_iter()
        .collect();
    apply_env(&mut settings, |key| std::env::var(key).ok());
    (settings, warnings)
}

fn apply_file(settings: &mut Settings, path: &Path) -> Option<String> {
    let Ok(raw) = fs::read_to_string(path) else {
        return None;
    };
    match toml::from_str::<FileSettings>(&raw) {
        Ok(file_cfg) => {
            if let Some(v) = file_cfg.server_url {
                settings.server_url = v;
            }
            if let Some(v) = file_cfg.log_filter {
                settings.log_filter = v;
            }
            None
        }
        Err(err) => Some(format!("ignoring malformed {}: {err}", path.display())),
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("PORTAL_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = var("RUST_LOG") {
        settings.log_filter = v;
    }
    if let Some(v) = var("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}
