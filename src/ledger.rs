use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::document::{Document, NodeId};

pub const ORIGINAL_TEXT_KEY: &str = "exonym.original-text-001";
pub const TRANSLATIONS_KEY: &str = "exonym.translations-001";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalText {
    pub text: String,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub to: String,
    pub text: String,
    #[serde(default)]
    pub painted: bool,
}

/// A freshly resolved translation, before it lands in a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub text: String,
    pub to: String,
}

/// Per-element record of the source text and every translation resolved for
/// it. `translations` is `None` until the element has been reconciled once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    pub original_text: Option<OriginalText>,
    pub translations: Option<Vec<LedgerEntry>>,
}

impl Ledger {
    pub fn is_reconciled(&self) -> bool {
        self.translations.is_some()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        self.translations.as_deref().unwrap_or(&[])
    }

    pub fn entry(&self, language: &str) -> Option<&LedgerEntry> {
        self.entries().iter().find(|entry| entry.to == language)
    }

    /// True when the recorded original text still matches the live text.
    pub fn is_current(&self, live_text: &str) -> bool {
        self.original_text
            .as_ref()
            .map(|original| original.text == live_text)
            .unwrap_or(false)
    }

    /// Drops every entry when the live text no longer matches the recorded
    /// original. Returns whether a reset happened.
    pub fn invalidate_if_changed(&mut self, live_text: &str, detected: &str) -> bool {
        if self.is_current(live_text) {
            return false;
        }
        self.original_text = Some(OriginalText {
            text: live_text.to_string(),
            from: detected.to_string(),
        });
        self.translations = Some(Vec::new());
        true
    }

    /// Inserts or refreshes the entry for `translation.to`; the entry is
    /// always left unpainted.
    pub fn upsert(&mut self, translation: &Translation) {
        self.upsert_entry(LedgerEntry {
            to: translation.to.clone(),
            text: translation.text.clone(),
            painted: false,
        });
    }

    pub fn upsert_entry(&mut self, entry: LedgerEntry) {
        let entries = self.translations.get_or_insert_with(Vec::new);
        match entries.iter_mut().find(|existing| existing.to == entry.to) {
            Some(existing) => {
                existing.text = entry.text;
                existing.painted = entry.painted;
            }
            None => entries.push(entry),
        }
    }

    /// Folds a batch of resolved translations into the ledger: reset on edit,
    /// upsert each language, then record the live text as the new original.
    pub fn merge(&mut self, live_text: &str, detected: &str, translations: &[Translation]) {
        self.invalidate_if_changed(live_text, detected);
        for translation in translations {
            self.upsert(translation);
        }
        self.original_text = Some(OriginalText {
            text: live_text.to_string(),
            from: detected.to_string(),
        });
    }

    /// Flags an existing entry for repaint. Returns false when the language
    /// has no entry.
    pub fn mark_unpainted(&mut self, language: &str) -> bool {
        self.set_painted(language, false)
    }

    pub fn mark_painted(&mut self, language: &str) -> bool {
        self.set_painted(language, true)
    }

    fn set_painted(&mut self, language: &str, painted: bool) -> bool {
        let Some(entries) = self.translations.as_mut() else {
            return false;
        };
        match entries.iter_mut().find(|entry| entry.to == language) {
            Some(entry) => {
                entry.painted = painted;
                true
            }
            None => false,
        }
    }

    pub fn unpainted(&self) -> Vec<LedgerEntry> {
        self.entries()
            .iter()
            .filter(|entry| !entry.painted)
            .cloned()
            .collect()
    }
}

/// Typed access to the ledger stored in an element's plugin data.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerStore;

impl LedgerStore {
    pub fn new() -> Self {
        Self
    }

    pub fn read<D: Document>(&self, document: &D, id: &NodeId) -> Result<Ledger> {
        let original_text = read_key(document, id, ORIGINAL_TEXT_KEY)?;
        let translations = read_key(document, id, TRANSLATIONS_KEY)?;
        Ok(Ledger {
            original_text,
            translations,
        })
    }

    pub fn write<D: Document>(&self, document: &mut D, id: &NodeId, ledger: &Ledger) -> Result<()> {
        if let Some(original) = &ledger.original_text {
            write_key(document, id, ORIGINAL_TEXT_KEY, original)?;
        }
        let entries = ledger.translations.as_deref().unwrap_or(&[]);
        write_key(document, id, TRANSLATIONS_KEY, entries)
    }
}

fn read_key<D: Document, T: DeserializeOwned>(
    document: &D,
    id: &NodeId,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = document.plugin_data(id, key) else {
        return Ok(None);
    };
    if raw.trim().is_empty() || raw.trim() == "null" {
        return Ok(None);
    }
    let value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {} on node {}", key, id))?;
    Ok(Some(value))
}

fn write_key<D: Document, T: Serialize + ?Sized>(
    document: &mut D,
    id: &NodeId,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    document
        .set_plugin_data(id, key, raw)
        .with_context(|| format!("failed to write {} on node {}", key, id))
}
