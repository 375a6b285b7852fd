use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};

pub mod app;
pub mod batcher;
pub mod dictionary;
pub mod document;
pub mod error;
pub mod languages;
pub mod ledger;
pub mod logging;
pub mod messenger;
pub mod options;
pub mod outcome;
pub mod painter;
pub mod resolver;
pub mod rtl;
pub mod scanner;
pub mod service;
pub mod settings;
#[cfg(test)]
mod test_util;
pub mod translator;

pub use app::App;
pub use document::{Document, MemoryDocument, NodeId};
pub use error::TranslateError;
pub use ledger::{Ledger, LedgerEntry, LedgerStore};
pub use options::{Action, Command, TranslateOptions};
pub use outcome::{Outcome, Status};
pub use painter::Painter;
pub use service::{MicrosoftTranslator, TranslationService};
pub use translator::Translator;

#[derive(Debug, Clone)]
pub struct Config {
    pub scene: Option<String>,
    pub output: Option<String>,
    pub command: String,
    pub languages: Vec<String>,
    pub action: String,
    pub translate_locked: bool,
    pub key: Option<String>,
    pub settings_path: Option<String>,
    pub show_languages: bool,
}

pub async fn run(config: Config) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(key) = config.key.filter(|key| !key.trim().is_empty()) {
        settings.key = Some(key);
    }
    let registry = languages::LanguageRegistry::load()?;

    if config.show_languages {
        return Ok(format_languages(&registry));
    }

    let scene_path = config
        .scene
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("--scene is required"))?;
    let mut document = MemoryDocument::load(&scene_path)?;
    let command: Command = config.command.parse()?;
    let submitted = TranslateOptions {
        languages: config.languages,
        action: config.action.parse()?,
        translate_locked: config.translate_locked,
    };

    // The network side runs behind the relay, as it would in the host's UI.
    let (relay, endpoint) =
        service::relay::channel(settings.timeout, service::Cancellation::new());
    let network = tokio::spawn(endpoint.serve(settings.translator()));

    let dictionary = dictionary::CustomDictionary::load()?;
    let translator = Translator::new(relay, dictionary).with_limits(settings.batch);
    let painter = Painter::new(registry.clone()).with_spacing(settings.spacing);
    let mut app = App::new(translator, painter, registry);
    if let Some(home) = settings::home_dir() {
        app = app.with_options_store(options::OptionsStore::in_dir(&home));
    }

    let outcome = app.dispatch(&mut document, &command, &submitted).await;
    let toasts = app.messenger().toasts().to_vec();
    drop(app);
    network.abort();

    if !outcome.is_success() {
        let message = outcome
            .toast
            .or(outcome.log)
            .unwrap_or_else(|| "translation failed".to_string());
        return Err(anyhow!(message));
    }

    let output_path = config.output.map(PathBuf::from).unwrap_or(scene_path);
    document
        .save(&output_path)
        .with_context(|| "failed to save translated scene")?;
    Ok(format_outcome(&outcome, &toasts, &output_path))
}

fn format_languages(registry: &languages::LanguageRegistry) -> String {
    registry
        .ordered()
        .into_iter()
        .map(|entry| format!("{}\t{}", entry.id, entry.name))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_outcome(outcome: &Outcome, toasts: &[String], output: &Path) -> String {
    let mut lines = Vec::new();
    if let Some(log) = &outcome.log {
        lines.push(log.clone());
    }
    lines.extend(toasts.iter().cloned());
    lines.push(format!("scene: {}", output.display()));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_listing_is_tab_separated() {
        let registry = languages::LanguageRegistry::load().expect("registry");
        let listing = format_languages(&registry);
        assert!(listing.lines().any(|line| line == "ar\tArabic"));
        assert!(listing.lines().all(|line| line.contains('\t')));
    }

    #[test]
    fn outcome_summary_lists_toasts_and_output() {
        let summary = format_outcome(
            &Outcome::success("Text was translated"),
            &["Heads up".to_string()],
            Path::new("scene.json"),
        );
        assert_eq!(summary, "Text was translated\nHeads up\nscene: scene.json");
    }
}
