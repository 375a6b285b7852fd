use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use exonym_translator::dictionary::CustomDictionary;
use exonym_translator::languages::{FontRef, LanguageRegistry};
use exonym_translator::ledger::{OriginalText, Translation};
use exonym_translator::service::relay;
use exonym_translator::service::{
    Cancellation, DetectedLanguage, ServiceFuture, ServiceResult, TranslationRequest,
};
use exonym_translator::{
    Action, App, Document, LedgerStore, MemoryDocument, NodeId, Painter, TranslateOptions,
    TranslationService, Translator,
};

const SCENE: &str = r#"{
    "selection": ["card"],
    "nodes": [
        {"id": "card", "kind": "frame", "children": ["title", "body", "draft"]},
        {"id": "title", "kind": "text", "parent": "card", "name": "Share", "text": "Share",
         "fonts": [{"family": "Inter", "style": "Regular"}], "height": 24.0},
        {"id": "body", "kind": "text", "parent": "card", "name": "Good morning",
         "text": "Good morning", "fonts": [{"family": "Inter", "style": "Regular"}],
         "y": 40.0, "height": 24.0},
        {"id": "draft", "kind": "text", "parent": "card", "name": "Draft", "text": "Draft",
         "fonts": [{"family": "Inter", "style": "Regular"}], "y": 80.0, "height": 24.0,
         "locked": true}
    ]
}"#;

/// Tags each text with its target language, e.g. `<de> Good morning`.
#[derive(Clone, Default)]
struct TaggingService {
    calls: Arc<AtomicUsize>,
}

impl TranslationService for TaggingService {
    fn translate(&self, request: TranslationRequest) -> ServiceFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let results = request
            .texts
            .iter()
            .map(|source| ServiceResult {
                detected_language: Some(DetectedLanguage {
                    language: "en".to_string(),
                    score: None,
                }),
                translations: request
                    .to
                    .iter()
                    .map(|to| Translation {
                        text: format!("<{}> {}", to, source.text),
                        to: to.clone(),
                    })
                    .collect(),
            })
            .collect();
        Box::pin(async move { Ok(results) })
    }
}

fn app_over_relay(backend: TaggingService) -> App<relay::RelayService> {
    let (service, endpoint) = relay::channel(Duration::from_secs(5), Cancellation::new());
    tokio::spawn(endpoint.serve(backend));
    let registry = LanguageRegistry::load().unwrap();
    App::new(
        Translator::new(service, CustomDictionary::load().unwrap()),
        Painter::new(registry.clone()),
        registry,
    )
}

fn summarize(document: &MemoryDocument) -> String {
    document
        .nodes()
        .iter()
        .filter(|node| node.text.is_some())
        .map(|node| {
            format!(
                "{} | {} | {} | {},{}",
                node.id,
                node.name,
                node.text.as_deref().unwrap_or_default(),
                node.x,
                node.y
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test]
async fn duplicate_run_over_the_relay() {
    let mut document = MemoryDocument::from_json(SCENE).unwrap();
    let backend = TaggingService::default();
    let mut app = app_over_relay(backend.clone());

    let outcome = app
        .run_translate(
            &mut document,
            &TranslateOptions {
                languages: vec!["de".to_string(), "ar".to_string()],
                action: Action::Duplicate,
                translate_locked: false,
            },
            false,
        )
        .await;

    assert!(outcome.is_success(), "{:?}", outcome);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    insta::assert_snapshot!(summarize(&document), @r"
    title | Share | Share | 0,0
    body | Good morning | Good morning | 0,40
    draft | Draft | Draft | 0,80
    title:copy1 | [de] Mitteilen | Mitteilen | 16,16
    title:copy2 | [ar] مشاركة | ةكراشم | 32,32
    body:copy3 | [de] <de> Good morning | <de> Good morning | 16,56
    body:copy4 | [ar] <ar> Good morning | morning Good >ar< | 32,72
    ");

    let ledger = LedgerStore::new()
        .read(&document, &NodeId::from("title"))
        .unwrap();
    assert_eq!(
        ledger.original_text,
        Some(OriginalText {
            text: "Share".to_string(),
            from: "en".to_string(),
        })
    );
    assert!(ledger.unpainted().is_empty());
    assert_eq!(document.children(&NodeId::from("card")).len(), 7);
}

#[tokio::test]
async fn replace_run_is_idempotent() {
    let mut document = MemoryDocument::from_json(SCENE).unwrap();
    document.select(vec![NodeId::from("body")]);
    let backend = TaggingService::default();
    let mut app = app_over_relay(backend.clone());
    let options = TranslateOptions {
        languages: vec!["es".to_string()],
        action: Action::Replace,
        translate_locked: false,
    };

    let first = app.run_translate(&mut document, &options, false).await;
    assert_eq!(first.log.as_deref(), Some("Text was translated"));
    let after_first = summarize(&document);

    let second = app.run_translate(&mut document, &options, false).await;
    assert_eq!(second.log.as_deref(), Some("Text was translated (locally)"));
    assert_eq!(summarize(&document), after_first);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        document.text(&NodeId::from("body")).as_deref(),
        Some("<es> Good morning")
    );
}

#[tokio::test]
async fn edited_text_is_translated_again() {
    let mut document = MemoryDocument::from_json(SCENE).unwrap();
    document.select(vec![NodeId::from("body")]);
    let backend = TaggingService::default();
    let mut app = app_over_relay(backend.clone());
    let options = TranslateOptions {
        languages: vec!["es".to_string()],
        action: Action::Duplicate,
        translate_locked: false,
    };

    app.run_translate(&mut document, &options, false).await;
    document
        .load_font(&FontRef::new("Inter", "Regular"))
        .await
        .unwrap();
    document
        .set_text(&NodeId::from("body"), "Good evening")
        .unwrap();
    app.run_translate(&mut document, &options, false).await;

    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    let ledger = LedgerStore::new()
        .read(&document, &NodeId::from("body"))
        .unwrap();
    assert_eq!(ledger.entries().len(), 1);
    assert_eq!(ledger.entries()[0].text, "<es> Good evening");
}
