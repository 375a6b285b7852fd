use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

use crate::ledger::Translation;

mod microsoft;
pub mod relay;
mod retry;

pub use microsoft::{DEFAULT_ENDPOINT, MicrosoftTranslator};
pub use relay::{Cancellation, RelayEndpoint, RelayRequest, RelayService};

/// Language recorded when the service does not report a detected source.
pub const UNDETERMINED_LANGUAGE: &str = "und";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceText {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub texts: Vec<SourceText>,
    pub to: Vec<String>,
}

impl TranslationRequest {
    pub fn character_count(&self) -> usize {
        self.texts.iter().map(|item| item.text.chars().count()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedLanguage {
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// One element of the service response, index-aligned with the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResult {
    #[serde(default)]
    pub detected_language: Option<DetectedLanguage>,
    #[serde(default)]
    pub translations: Vec<Translation>,
}

impl ServiceResult {
    pub fn detected(&self) -> &str {
        self.detected_language
            .as_ref()
            .map(|detected| detected.language.as_str())
            .filter(|language| !language.trim().is_empty())
            .unwrap_or(UNDETERMINED_LANGUAGE)
    }
}

pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Vec<ServiceResult>>> + Send>>;

/// A remote translator: text array in, index-aligned translation array out.
/// Any error means the request produced no data.
pub trait TranslationService: Clone + Send + Sync {
    fn translate(&self, request: TranslationRequest) -> ServiceFuture;
}
