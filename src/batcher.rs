use anyhow::{Result, anyhow};
use std::ops::Range;
use tracing::{debug, info};

use crate::service::{ServiceResult, SourceText, TranslationRequest, TranslationService};

pub const DEFAULT_MAX_CHARACTERS: usize = 5000;
pub const DEFAULT_MAX_ITEMS: usize = 99;

/// Per-request ceilings imposed by the translation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_characters: usize,
    pub max_items: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_characters: DEFAULT_MAX_CHARACTERS,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

/// Packs `texts` into consecutive index ranges. A new range starts whenever
/// the next text would push the current one past either limit; a text that
/// is larger than the character limit on its own travels alone.
pub fn plan_batches<S: AsRef<str>>(texts: &[S], limits: BatchLimits) -> Vec<Range<usize>> {
    let max_items = limits.max_items.max(1);
    let mut batches = Vec::new();
    let mut start = 0;
    let mut characters = 0;

    for (index, text) in texts.iter().enumerate() {
        let length = text.as_ref().chars().count();
        let items = index - start;
        if items > 0 && (items + 1 > max_items || characters + length > limits.max_characters) {
            batches.push(start..index);
            start = index;
            characters = 0;
        }
        characters += length;
    }
    if start < texts.len() {
        batches.push(start..texts.len());
    }
    batches
}

/// Sends `texts` to `service` in sequential batches and concatenates the
/// responses so that result `i` belongs to text `i`. Any failed or
/// mis-sized batch fails the whole call.
pub async fn translate_remote<S: TranslationService>(
    service: &S,
    texts: &[String],
    targets: &[String],
    limits: BatchLimits,
) -> Result<Vec<ServiceResult>> {
    let batches = plan_batches(texts, limits);
    let total = batches.len();
    let mut results = Vec::with_capacity(texts.len());

    for (number, range) in batches.into_iter().enumerate() {
        let request = TranslationRequest {
            texts: texts[range.clone()]
                .iter()
                .map(|text| SourceText { text: text.clone() })
                .collect(),
            to: targets.to_vec(),
        };
        debug!(
            "dispatching batch {}/{}: {} items, {} chars",
            number + 1,
            total,
            request.texts.len(),
            request.character_count()
        );
        let expected = request.texts.len();
        let response = service.translate(request).await?;
        if response.len() != expected {
            return Err(anyhow!(
                "batch {}/{} returned {} results for {} texts",
                number + 1,
                total,
                response.len(),
                expected
            ));
        }
        results.extend(response);
    }

    info!(
        "received {} translations in {} batch(es) for {:?}",
        results.len(),
        total,
        targets
    );
    Ok(results)
}
