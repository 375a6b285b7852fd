use anyhow::Result;
use tracing::{debug, warn};

use crate::document::{Document, NodeId, Position};
use crate::error::TranslateError;
use crate::languages::{Direction, LanguageRegistry};
use crate::ledger::{Ledger, LedgerEntry, LedgerStore, OriginalText};
use crate::options::Action;
use crate::rtl;

pub const DEFAULT_SPACING: f64 = 24.0;

/// What a single paint call changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaintReport {
    /// Languages applied, in ledger order.
    pub painted: Vec<String>,
    /// Copies created in duplicate mode.
    pub duplicates: Vec<NodeId>,
}

/// Totals for a paint pass over several elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaintSummary {
    pub painted: usize,
    pub failed: Vec<NodeId>,
}

/// Applies unpainted ledger entries to the document.
#[derive(Debug, Clone)]
pub struct Painter {
    registry: LanguageRegistry,
    store: LedgerStore,
    spacing: f64,
}

impl Painter {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self {
            registry,
            store: LedgerStore::new(),
            spacing: DEFAULT_SPACING,
        }
    }

    pub fn with_spacing(mut self, spacing: f64) -> Self {
        if spacing > 0.0 {
            self.spacing = spacing;
        }
        self
    }

    /// Paints every unpainted entry of `id`'s ledger and persists the ledger,
    /// including the progress made before a failure.
    pub fn paint<D: Document>(
        &self,
        document: &mut D,
        id: &NodeId,
        action: Action,
    ) -> Result<PaintReport, TranslateError> {
        let mut ledger = self.store.read(document, id)?;
        if !ledger.is_reconciled() {
            return Err(TranslateError::MissingLedger(id.clone()));
        }
        let pending = ledger.unpainted();
        if pending.is_empty() {
            debug!("node {} has nothing left to paint", id);
            return Ok(PaintReport::default());
        }

        let mut report = PaintReport::default();
        let result = match action {
            Action::Replace => self.replace(document, id, &mut ledger, &pending, &mut report),
            Action::Duplicate => self.duplicate(document, id, &mut ledger, &pending, &mut report),
        };
        self.store.write(document, id, &ledger)?;
        result?;
        debug!("painted {:?} on node {} ({})", report.painted, id, action);
        Ok(report)
    }

    /// Paints each element in turn. A failing element is logged and skipped.
    pub fn paint_all<D: Document>(
        &self,
        document: &mut D,
        ids: &[NodeId],
        action: Action,
    ) -> PaintSummary {
        let mut summary = PaintSummary::default();
        for id in ids {
            match self.paint(document, id, action) {
                Ok(report) => summary.painted += report.painted.len(),
                Err(error) => {
                    warn!("skipping node {}: {}", id, error);
                    summary.failed.push(id.clone());
                }
            }
        }
        summary
    }

    fn replace<D: Document>(
        &self,
        document: &mut D,
        id: &NodeId,
        ledger: &mut Ledger,
        pending: &[LedgerEntry],
        report: &mut PaintReport,
    ) -> Result<()> {
        for entry in pending {
            let current = document.text(id).unwrap_or_default();
            if let Some(original) = ledger.original_text.clone()
                && original.text == current
            {
                fold_original(ledger, original);
            }

            let displayed = self.apply_text(document, id, entry)?;
            document.set_name(id, &entry.text)?;
            ledger.mark_painted(&entry.to);
            ledger.original_text = Some(OriginalText {
                text: displayed,
                from: entry.to.clone(),
            });
            report.painted.push(entry.to.clone());
        }
        Ok(())
    }

    fn duplicate<D: Document>(
        &self,
        document: &mut D,
        id: &NodeId,
        ledger: &mut Ledger,
        pending: &[LedgerEntry],
        report: &mut PaintReport,
    ) -> Result<()> {
        let buffer = self.spacing.min(document.height(id) / 1.5);
        let origin = document.position(id).unwrap_or_default();
        let parent = document.parent(id);
        let mut offset = 0.0;

        for entry in pending {
            offset += buffer;
            let copy = document.clone_node(id)?;
            document.set_locked(&copy, false)?;
            document.set_position(
                &copy,
                Position {
                    x: origin.x + offset,
                    y: origin.y + offset,
                },
            )?;
            let displayed = self.apply_text(document, &copy, entry)?;
            document.set_name(&copy, &format!("[{}] {}", entry.to, entry.text))?;
            if let Some(parent) = &parent {
                document.append_child(parent, &copy)?;
            }
            // The copy starts its own ledger with the translation as its source.
            let copy_ledger = Ledger {
                original_text: Some(OriginalText {
                    text: displayed,
                    from: entry.to.clone(),
                }),
                translations: Some(vec![LedgerEntry {
                    painted: true,
                    ..entry.clone()
                }]),
            };
            self.store.write(document, &copy, &copy_ledger)?;
            ledger.mark_painted(&entry.to);
            report.painted.push(entry.to.clone());
            report.duplicates.push(copy);
        }
        Ok(())
    }

    /// Sets the entry's text on `target` with the language's font and
    /// direction applied; returns the text as displayed.
    fn apply_text<D: Document>(
        &self,
        document: &mut D,
        target: &NodeId,
        entry: &LedgerEntry,
    ) -> Result<String> {
        if let Some(font) = self.registry.font_for(&entry.to) {
            document.set_font(target, font)?;
        }
        let displayed = match self.registry.direction(&entry.to) {
            Direction::Rtl => rtl::reverse_for_display(&entry.text),
            Direction::Ltr => entry.text.clone(),
        };
        document.set_text(target, &displayed)?;
        Ok(displayed)
    }
}

/// Keeps the text about to be overwritten retrievable as a painted entry for
/// its own language. An existing entry keeps its text, since the displayed
/// text of a right-to-left language is already reordered.
fn fold_original(ledger: &mut Ledger, original: OriginalText) {
    if ledger.mark_painted(&original.from) {
        return;
    }
    ledger.upsert_entry(LedgerEntry {
        to: original.from,
        text: original.text,
        painted: true,
    });
}
