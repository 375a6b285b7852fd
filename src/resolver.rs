use anyhow::Result;
use tracing::debug;

use crate::dictionary::CustomDictionary;
use crate::document::{Document, NodeId};
use crate::ledger::{LedgerStore, Translation};

/// An element that still needs remote translation, with the languages that
/// could not be satisfied locally (in request order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingElement {
    pub id: NodeId,
    pub languages: Vec<String>,
}

/// Satisfies what it can without the remote service and returns the rest.
///
/// The dictionary pass is all-or-nothing per element: staged dictionary
/// translations are committed only when every target language was found.
/// The cached-ledger pass works per language: any target that already has an
/// entry for unchanged text is flagged for repaint and dropped from the
/// element's pending list.
pub fn resolve_local<D: Document>(
    document: &mut D,
    store: &LedgerStore,
    dictionary: &CustomDictionary,
    elements: &[NodeId],
    targets: &[String],
) -> Result<Vec<PendingElement>> {
    let mut remaining = Vec::new();
    for id in elements {
        if resolve_from_dictionary(document, store, dictionary, id, targets)? {
            debug!("node {} translated from the custom dictionary", id);
            continue;
        }
        remaining.push(id.clone());
    }

    let mut pending = Vec::new();
    for id in remaining {
        let languages = resolve_from_ledger(document, store, &id, targets)?;
        if languages.is_empty() {
            debug!("node {} translated from cached ledger", id);
            continue;
        }
        pending.push(PendingElement { id, languages });
    }
    Ok(pending)
}

fn resolve_from_dictionary<D: Document>(
    document: &mut D,
    store: &LedgerStore,
    dictionary: &CustomDictionary,
    id: &NodeId,
    targets: &[String],
) -> Result<bool> {
    let Some(text) = document.text(id) else {
        return Ok(false);
    };
    let Some(found) = dictionary.lookup(&text) else {
        return Ok(false);
    };

    let staged: Vec<Translation> = targets
        .iter()
        .filter_map(|language| {
            found.group.translation(language).map(|entry| Translation {
                text: entry.text.clone(),
                to: entry.id.clone(),
            })
        })
        .collect();
    if staged.len() < targets.len() {
        debug!(
            "custom dictionary covers {}/{} languages for node {}; deferring",
            staged.len(),
            targets.len(),
            id
        );
        return Ok(false);
    }

    let mut ledger = store.read(document, id)?;
    ledger.merge(&text, found.source, &staged);
    store.write(document, id, &ledger)?;
    Ok(true)
}

fn resolve_from_ledger<D: Document>(
    document: &mut D,
    store: &LedgerStore,
    id: &NodeId,
    targets: &[String],
) -> Result<Vec<String>> {
    let Some(text) = document.text(id) else {
        return Ok(targets.to_vec());
    };
    let mut ledger = store.read(document, id)?;
    if !ledger.is_current(&text) {
        return Ok(targets.to_vec());
    }

    let mut missing = Vec::new();
    let mut touched = false;
    for language in targets {
        if ledger.mark_unpainted(language) {
            touched = true;
        } else {
            missing.push(language.clone());
        }
    }
    if touched {
        store.write(document, id, &ledger)?;
    }
    Ok(missing)
}
