use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::retry::{
    RATE_LIMIT_BASE_DELAY, RATE_LIMIT_MAX_RETRIES, is_rate_limited, retry_after, wait_with_backoff,
};
use super::{ServiceFuture, ServiceResult, TranslationRequest, TranslationService};

pub const DEFAULT_ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com";
const API_VERSION: &str = "3.0";

/// Client for the Microsoft Translator v3 `translate` endpoint.
#[derive(Debug, Clone)]
pub struct MicrosoftTranslator {
    key: String,
    region: Option<String>,
    endpoint: String,
    client: reqwest::Client,
}

impl MicrosoftTranslator {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            region: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        if !endpoint.trim().is_empty() {
            self.endpoint = endpoint.trim().trim_end_matches('/').to_string();
        }
        self
    }

    fn url(&self) -> String {
        format!("{}/translate", self.endpoint)
    }
}

impl TranslationService for MicrosoftTranslator {
    fn translate(&self, request: TranslationRequest) -> ServiceFuture {
        let translator = self.clone();
        Box::pin(async move { call_translate(translator, request).await })
    }
}

async fn call_translate(
    translator: MicrosoftTranslator,
    request: TranslationRequest,
) -> Result<Vec<ServiceResult>> {
    if translator.key.trim().is_empty() {
        return Err(anyhow!(
            "no translator API key configured (set MST_API_KEY or [service] key)"
        ));
    }
    if request.texts.is_empty() {
        return Ok(Vec::new());
    }

    let body = request
        .texts
        .iter()
        .map(|item| json!({"Text": item.text}))
        .collect::<Vec<_>>();
    let mut query = vec![("api-version", API_VERSION.to_string())];
    query.extend(request.to.iter().map(|language| ("to", language.clone())));

    let url = translator.url();
    debug!(
        "sending {} texts ({} chars) to {}",
        request.texts.len(),
        request.character_count(),
        url
    );

    let mut attempt = 0usize;
    let mut delay = RATE_LIMIT_BASE_DELAY;
    loop {
        attempt += 1;
        let mut builder = translator
            .client
            .post(&url)
            .query(&query)
            .header("Ocp-Apim-Subscription-Key", translator.key.as_str())
            .json(&body);
        if let Some(region) = &translator.region {
            builder = builder.header("Ocp-Apim-Subscription-Region", region.as_str());
        }
        let response = builder.send().await?;

        let status = response.status();
        let retry_after = retry_after(response.headers());
        let text = response.text().await.unwrap_or_default();
        if status.is_success() {
            return parse_translate_response(&text, request.texts.len());
        }
        if is_rate_limited(status, &text) && attempt < RATE_LIMIT_MAX_RETRIES {
            delay = wait_with_backoff(attempt, delay, retry_after).await;
            continue;
        }
        return Err(anyhow!(
            "translator API error ({}): {}",
            status,
            extract_translator_error(&text).unwrap_or(text)
        ));
    }
}

fn parse_translate_response(text: &str, expected: usize) -> Result<Vec<ServiceResult>> {
    let results: Vec<ServiceResult> =
        serde_json::from_str(text).with_context(|| "failed to parse translator response JSON")?;
    if results.len() != expected {
        return Err(anyhow!(
            "translator returned {} results for {} texts",
            results.len(),
            expected
        ));
    }
    Ok(results)
}

fn extract_translator_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<TranslatorError>,
    }

    #[derive(Deserialize)]
    struct TranslatorError {
        code: Option<i64>,
        message: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    let message = error
        .message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| "unknown error".to_string());
    Some(match error.code {
        Some(code) => format!("{} | code: {}", message, code),
        None => message,
    })
}
