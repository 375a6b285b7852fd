use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const OPTIONS_FILE: &str = "options.json";

/// How translated text lands in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Duplicate,
    Replace,
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "duplicate" => Ok(Action::Duplicate),
            "replace" => Ok(Action::Replace),
            other => Err(anyhow!(
                "unknown action '{}' (expected duplicate or replace)",
                other
            )),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Duplicate => f.write_str("duplicate"),
            Action::Replace => f.write_str("replace"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateOptions {
    pub languages: Vec<String>,
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub translate_locked: bool,
}

/// Last-used options, kept as JSON next to the user settings.
#[derive(Debug, Clone)]
pub struct OptionsStore {
    path: PathBuf,
}

impl OptionsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(OPTIONS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<TranslateOptions>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read options: {}", self.path.display()))?;
        let options = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse options: {}", self.path.display()))?;
        Ok(Some(options))
    }

    pub fn save(&self, options: &TranslateOptions) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create options directory: {}", parent.display())
            })?;
        }
        let raw = serde_json::to_string_pretty(options)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write options: {}", self.path.display()))
    }
}

const QUICK_PREFIX: &str = "quick-translate-";

/// Commands a menu entry or the UI can issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit,
    QuickTranslate(String),
    QuickTranslateLast,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        if value == "submit" {
            return Ok(Command::Submit);
        }
        match value.strip_prefix(QUICK_PREFIX) {
            Some("last") => Ok(Command::QuickTranslateLast),
            Some(language) if !language.is_empty() => {
                Ok(Command::QuickTranslate(language.to_string()))
            }
            _ => Err(anyhow!("unknown command '{}'", value)),
        }
    }
}

impl Command {
    /// Options for a quick translation: one target (or the last-used ones
    /// for `quick-translate-last`) plus the last-used action and lock
    /// setting. `Submit` uses the provided options as-is.
    pub fn resolve_options(
        &self,
        submitted: &TranslateOptions,
        last_used: Option<&TranslateOptions>,
    ) -> TranslateOptions {
        let language = match self {
            Command::Submit => return submitted.clone(),
            Command::QuickTranslate(language) => Some(language.clone()),
            Command::QuickTranslateLast => None,
        };
        let mut options = TranslateOptions {
            languages: language.into_iter().collect(),
            action: Action::Duplicate,
            translate_locked: false,
        };
        if let Some(last) = last_used {
            options.action = last.action;
            options.translate_locked = last.translate_locked;
            if options.languages.is_empty() {
                options.languages = last.languages.clone();
            }
        }
        options
    }

    /// Only explicit submissions update the stored options.
    pub fn saves_options(&self) -> bool {
        matches!(self, Command::Submit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!("submit".parse::<Command>().expect("submit"), Command::Submit);
        assert_eq!(
            "quick-translate-zh-Hant".parse::<Command>().expect("quick"),
            Command::QuickTranslate("zh-Hant".to_string())
        );
        assert_eq!(
            "quick-translate-last".parse::<Command>().expect("last"),
            Command::QuickTranslateLast
        );
        assert!("quick-translate-".parse::<Command>().is_err());
        assert!("translate".parse::<Command>().is_err());
    }

    #[test]
    fn quick_translate_reuses_last_action() {
        let last = TranslateOptions {
            languages: vec!["fr".to_string(), "de".to_string()],
            action: Action::Replace,
            translate_locked: true,
        };
        let quick = Command::QuickTranslate("ar".to_string())
            .resolve_options(&TranslateOptions::default(), Some(&last));
        assert_eq!(quick.languages, vec!["ar".to_string()]);
        assert_eq!(quick.action, Action::Replace);
        assert!(quick.translate_locked);

        let again =
            Command::QuickTranslateLast.resolve_options(&TranslateOptions::default(), Some(&last));
        assert_eq!(again.languages, last.languages);
    }

    #[test]
    fn quick_translate_defaults_without_history() {
        let quick = Command::QuickTranslate("de".to_string())
            .resolve_options(&TranslateOptions::default(), None);
        assert_eq!(quick.action, Action::Duplicate);
        assert!(!quick.translate_locked);
    }

    #[test]
    fn options_persist_as_camel_case_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = OptionsStore::in_dir(&dir.path().join("nested"));
        assert!(store.load().expect("load").is_none());

        let options = TranslateOptions {
            languages: vec!["es".to_string()],
            action: Action::Replace,
            translate_locked: true,
        };
        store.save(&options).expect("save");
        let raw = fs::read_to_string(store.path()).expect("read");
        assert!(raw.contains("\"translateLocked\": true"));
        assert!(raw.contains("\"action\": \"replace\""));
        assert_eq!(store.load().expect("load"), Some(options));
    }
}
