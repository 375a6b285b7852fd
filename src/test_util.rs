use anyhow::{Result, anyhow};
use std::sync::{Arc, Mutex};

use crate::document::{MemoryDocument, NodeId, NodeKind, SceneNode};
use crate::languages::FontRef;
use crate::ledger::Translation;
use crate::service::{
    DetectedLanguage, ServiceFuture, ServiceResult, TranslationRequest, TranslationService,
};

type Render = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// Fake translation service that renders each translation with a closure
/// and records every request it receives.
#[derive(Clone)]
pub(crate) struct RecordingService {
    render: Render,
    detected: String,
    fail_after: Option<usize>,
    truncate: bool,
    calls: Arc<Mutex<Vec<TranslationRequest>>>,
}

impl RecordingService {
    pub(crate) fn new<F>(render: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        Self {
            render: Arc::new(render),
            detected: "en".to_string(),
            fail_after: None,
            truncate: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Prefixes every text with its target language, e.g. `es:Hello`.
    pub(crate) fn prefixing() -> Self {
        Self::new(|text, to| format!("{}:{}", to, text))
    }

    pub(crate) fn detecting(mut self, language: &str) -> Self {
        self.detected = language.to_string();
        self
    }

    /// Succeeds for the first `calls` requests, then reports no data.
    pub(crate) fn failing_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    /// Drops the last result of every response.
    pub(crate) fn truncating(mut self) -> Self {
        self.truncate = true;
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    pub(crate) fn calls(&self) -> Vec<TranslationRequest> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn respond(&self, request: TranslationRequest) -> Result<Vec<ServiceResult>> {
        let previous = {
            let mut calls = self.calls.lock().expect("calls lock");
            calls.push(request.clone());
            calls.len() - 1
        };
        if let Some(limit) = self.fail_after
            && previous >= limit
        {
            return Err(anyhow!("translation service unavailable"));
        }
        let mut results: Vec<ServiceResult> = request
            .texts
            .iter()
            .map(|source| ServiceResult {
                detected_language: Some(DetectedLanguage {
                    language: self.detected.clone(),
                    score: Some(1.0),
                }),
                translations: request
                    .to
                    .iter()
                    .map(|to| Translation {
                        text: (self.render)(&source.text, to),
                        to: to.clone(),
                    })
                    .collect(),
            })
            .collect();
        if self.truncate {
            results.pop();
        }
        Ok(results)
    }
}

impl TranslationService for RecordingService {
    fn translate(&self, request: TranslationRequest) -> ServiceFuture {
        let result = self.respond(request);
        Box::pin(async move { result })
    }
}

pub(crate) fn inter() -> FontRef {
    FontRef::new("Inter", "Regular")
}

/// A frame holding one text node per entry of `texts`, selected.
pub(crate) fn scene_with_texts(texts: &[&str]) -> (MemoryDocument, Vec<NodeId>) {
    let mut document = MemoryDocument::new();
    let frame = document
        .insert(None, SceneNode::new("frame", NodeKind::Frame))
        .expect("frame");
    let ids = texts
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let mut node = SceneNode::text_node(format!("text-{}", index), *text, inter());
            node.y = index as f64 * 40.0;
            document.insert(Some(&frame), node).expect("text node")
        })
        .collect();
    document.select(vec![frame]);
    (document, ids)
}

pub(crate) fn langs(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
