use anyhow::Result;
use tracing::{debug, info};

use crate::batcher::{self, BatchLimits};
use crate::dictionary::CustomDictionary;
use crate::document::{Document, NodeId};
use crate::error::TranslateError;
use crate::ledger::LedgerStore;
use crate::outcome::Outcome;
use crate::resolver::{self, PendingElement};
use crate::service::{ServiceResult, TranslationService};

/// Reconciles the translation ledgers of a set of elements: local
/// resolution first, then remote batches for whatever is left, then a
/// single commit once every batch has returned.
#[derive(Debug, Clone)]
pub struct Translator<S: TranslationService> {
    service: S,
    dictionary: CustomDictionary,
    store: LedgerStore,
    limits: BatchLimits,
}

/// Pending elements that share the same missing languages.
#[derive(Debug)]
struct LanguageGroup {
    languages: Vec<String>,
    elements: Vec<NodeId>,
}

impl<S: TranslationService> Translator<S> {
    pub fn new(service: S, dictionary: CustomDictionary) -> Self {
        Self {
            service,
            dictionary,
            store: LedgerStore::new(),
            limits: BatchLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: BatchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn translate<D: Document>(
        &self,
        document: &mut D,
        elements: &[NodeId],
        targets: &[String],
    ) -> Outcome {
        match self.reconcile(document, elements, targets).await {
            Ok(outcome) => outcome,
            Err(error) => Outcome::from(error),
        }
    }

    async fn reconcile<D: Document>(
        &self,
        document: &mut D,
        elements: &[NodeId],
        targets: &[String],
    ) -> Result<Outcome, TranslateError> {
        let pending =
            resolver::resolve_local(document, &self.store, &self.dictionary, elements, targets)?;
        if pending.is_empty() {
            return Ok(Outcome::success("Text was translated (locally)"));
        }
        debug!(
            "{} of {} element(s) need remote translation",
            pending.len(),
            elements.len()
        );

        let mut resolved: Vec<(NodeId, String, ServiceResult)> = Vec::new();
        for group in group_by_languages(pending) {
            let texts: Vec<String> = group
                .elements
                .iter()
                .map(|id| document.text(id).unwrap_or_default())
                .collect();
            let results =
                batcher::translate_remote(&self.service, &texts, &group.languages, self.limits)
                    .await
                    .map_err(|error| TranslateError::RemoteServiceUnavailable(error.to_string()))?;
            resolved.extend(
                group
                    .elements
                    .into_iter()
                    .zip(texts)
                    .zip(results)
                    .map(|((id, text), result)| (id, text, result)),
            );
        }

        for (id, text, result) in &resolved {
            let mut ledger = self.store.read(document, id)?;
            ledger.merge(text, result.detected(), &result.translations);
            self.store.write(document, id, &ledger)?;
        }
        info!("committed remote translations for {} element(s)", resolved.len());
        Ok(Outcome::success("Text was translated"))
    }
}

fn group_by_languages(pending: Vec<PendingElement>) -> Vec<LanguageGroup> {
    let mut groups: Vec<LanguageGroup> = Vec::new();
    for element in pending {
        match groups
            .iter_mut()
            .find(|group| group.languages == element.languages)
        {
            Some(group) => group.elements.push(element.id),
            None => groups.push(LanguageGroup {
                languages: element.languages,
                elements: vec![element.id],
            }),
        }
    }
    groups
}
