use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::batcher::BatchLimits;
use crate::painter::DEFAULT_SPACING;
use crate::service::{DEFAULT_ENDPOINT, MicrosoftTranslator};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
const API_KEY_ENV: &str = "MST_API_KEY";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: String,
    pub key: Option<String>,
    pub region: Option<String>,
    pub timeout: Duration,
    pub batch: BatchLimits,
    pub spacing: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            key: None,
            region: None,
            timeout: Duration::from_secs(30),
            batch: BatchLimits::default(),
            spacing: DEFAULT_SPACING,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    service: Option<ServiceSettings>,
    batch: Option<BatchSettings>,
    paint: Option<PaintSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceSettings {
    endpoint: Option<String>,
    key: Option<String>,
    region: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BatchSettings {
    max_characters: Option<usize>,
    max_items: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct PaintSettings {
    spacing: Option<f64>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    let mut settings = load_settings_from(&ordered_paths)?;
    if settings.key.is_none() {
        settings.key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());
    }
    Ok(settings)
}

/// Merges the given files in order over the defaults; missing files are
/// skipped.
pub fn load_settings_from(paths: &[PathBuf]) -> Result<Settings> {
    let mut settings = Settings::default();
    for path in paths {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }
    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(service) = incoming.service {
            if let Some(endpoint) = service.endpoint
                && !endpoint.trim().is_empty()
            {
                self.endpoint = endpoint;
            }
            if let Some(key) = service.key
                && !key.trim().is_empty()
            {
                self.key = Some(key);
            }
            if let Some(region) = service.region
                && !region.trim().is_empty()
            {
                self.region = Some(region);
            }
            if let Some(secs) = service.timeout_secs
                && secs > 0
            {
                self.timeout = Duration::from_secs(secs);
            }
        }
        if let Some(batch) = incoming.batch {
            if let Some(max) = batch.max_characters
                && max > 0
            {
                self.batch.max_characters = max;
            }
            if let Some(max) = batch.max_items
                && max > 0
            {
                self.batch.max_items = max;
            }
        }
        if let Some(paint) = incoming.paint
            && let Some(spacing) = paint.spacing
            && spacing > 0.0
        {
            self.spacing = spacing;
        }
    }

    pub fn translator(&self) -> MicrosoftTranslator {
        MicrosoftTranslator::new(self.key.clone().unwrap_or_default())
            .with_region(self.region.clone())
            .with_endpoint(self.endpoint.clone())
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

/// `~/.exonym`, where user settings and last-used options live.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".exonym"))
        }
    })
}
