use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontRef {
    pub family: String,
    pub style: String,
}

impl FontRef {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageGroup {
    Core,
    Additional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub id: String,
    pub name: String,
    pub group: LanguageGroup,
    pub direction: Direction,
    #[serde(default)]
    pub font: Option<FontRef>,
}

/// Static table of the languages offered for translation. Core languages are
/// listed first in pickers; order within a group follows the embedded table.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    entries: Vec<LanguageEntry>,
    index: HashMap<String, usize>,
}

impl LanguageRegistry {
    pub fn load() -> Result<Self> {
        let raw = include_str!("languages.json");
        let parsed: LanguageData =
            serde_json::from_str(raw).with_context(|| "failed to parse language table")?;
        Ok(Self::from_entries(parsed.languages))
    }

    pub fn from_entries(entries: Vec<LanguageEntry>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (normalize_code(&entry.id), position))
            .collect();
        Self { entries, index }
    }

    pub fn get(&self, id: &str) -> Option<&LanguageEntry> {
        self.index
            .get(&normalize_code(id))
            .and_then(|position| self.entries.get(*position))
    }

    pub fn is_valid_code(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn display_name(&self, id: &str) -> String {
        self.get(id)
            .map(|entry| entry.name.clone())
            .unwrap_or_else(|| id.trim().to_string())
    }

    pub fn font_for(&self, id: &str) -> Option<&FontRef> {
        self.get(id).and_then(|entry| entry.font.as_ref())
    }

    pub fn direction(&self, id: &str) -> Direction {
        self.get(id)
            .map(|entry| entry.direction)
            .unwrap_or(Direction::Ltr)
    }

    /// Unique fonts required by the given languages, in request order.
    pub fn fonts_for(&self, ids: &[String]) -> Vec<FontRef> {
        let mut fonts: Vec<FontRef> = Vec::new();
        for id in ids {
            if let Some(font) = self.font_for(id)
                && !fonts.contains(font)
            {
                fonts.push(font.clone());
            }
        }
        fonts
    }

    pub fn in_group(&self, group: LanguageGroup) -> impl Iterator<Item = &LanguageEntry> {
        self.entries.iter().filter(move |entry| entry.group == group)
    }

    /// Core group first, then the additional languages.
    pub fn ordered(&self) -> Vec<&LanguageEntry> {
        self.in_group(LanguageGroup::Core)
            .chain(self.in_group(LanguageGroup::Additional))
            .collect()
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

#[derive(Debug, Deserialize)]
struct LanguageData {
    languages: Vec<LanguageEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_case_insensitive() {
        let registry = LanguageRegistry::load().expect("registry");
        let entry = registry.get("ZH-hans").expect("simplified chinese");
        assert_eq!(entry.id, "zh-Hans");
        assert_eq!(registry.display_name("de"), "German");
        assert_eq!(registry.display_name("xx"), "xx");
    }

    #[test]
    fn arabic_is_rtl_with_font() {
        let registry = LanguageRegistry::load().expect("registry");
        assert_eq!(registry.direction("ar"), Direction::Rtl);
        assert_eq!(registry.direction("es"), Direction::Ltr);
        assert_eq!(
            registry.font_for("ar"),
            Some(&FontRef::new("Geeza Pro", "Regular"))
        );
        assert!(registry.font_for("es").is_none());
    }

    #[test]
    fn fonts_for_deduplicates_shared_fonts() {
        let registry = LanguageRegistry::load().expect("registry");
        let fonts = registry.fonts_for(&[
            "ja".to_string(),
            "zh-Hans".to_string(),
            "es".to_string(),
        ]);
        assert_eq!(fonts, vec![FontRef::new("Hiragino Kaku Gothic Pro", "W3")]);
    }

    #[test]
    fn ordered_lists_core_languages_first() {
        let registry = LanguageRegistry::load().expect("registry");
        let ordered = registry.ordered();
        let first_additional = ordered
            .iter()
            .position(|entry| entry.group == LanguageGroup::Additional)
            .expect("additional group");
        assert!(
            ordered[..first_additional]
                .iter()
                .all(|entry| entry.group == LanguageGroup::Core)
        );
        assert!(
            ordered[first_additional..]
                .iter()
                .all(|entry| entry.group == LanguageGroup::Additional)
        );
    }
}
