use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One rendering of a concept in a single language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub text: String,
    pub id: String,
}

/// The same concept rendered in many languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DictionaryGroup {
    pub entries: Vec<DictionaryEntry>,
}

impl DictionaryGroup {
    pub fn translation(&self, language: &str) -> Option<&DictionaryEntry> {
        self.entries.iter().find(|entry| entry.id == language)
    }
}

/// A match of an element's text against a dictionary group. `source` is the
/// language of the tuple whose text matched.
#[derive(Debug, Clone, Copy)]
pub struct DictionaryMatch<'a> {
    pub group: &'a DictionaryGroup,
    pub source: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct CustomDictionary {
    groups: Vec<DictionaryGroup>,
}

impl CustomDictionary {
    pub fn load() -> Result<Self> {
        let raw = include_str!("dictionary/custom_translations.json");
        Self::from_json(raw).with_context(|| "failed to parse custom dictionary")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: DictionaryFile = serde_json::from_str(raw)?;
        Ok(Self {
            groups: parsed.groups,
        })
    }

    pub fn from_groups(groups: Vec<DictionaryGroup>) -> Self {
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// First group holding a tuple whose text equals `text` exactly.
    pub fn lookup(&self, text: &str) -> Option<DictionaryMatch<'_>> {
        self.groups.iter().find_map(|group| {
            group
                .entries
                .iter()
                .find(|entry| entry.text == text)
                .map(|entry| DictionaryMatch {
                    group,
                    source: entry.id.as_str(),
                })
        })
    }
}

#[derive(Debug, Deserialize)]
struct DictionaryFile {
    groups: Vec<DictionaryGroup>,
}
