use tracing::{info, warn};

use crate::document::{Document, NodeId};
use crate::error::TranslateError;
use crate::languages::{FontRef, LanguageRegistry};
use crate::messenger::Messenger;
use crate::options::{Command, OptionsStore, TranslateOptions};
use crate::outcome::Outcome;
use crate::painter::{PaintSummary, Painter};
use crate::scanner;
use crate::service::TranslationService;
use crate::translator::Translator;

/// Entry point for user commands: scan, refuse early when needed, load
/// typefaces, reconcile, then paint.
pub struct App<S: TranslationService> {
    translator: Translator<S>,
    painter: Painter,
    registry: LanguageRegistry,
    options: Option<OptionsStore>,
    messenger: Messenger,
}

impl<S: TranslationService> App<S> {
    pub fn new(translator: Translator<S>, painter: Painter, registry: LanguageRegistry) -> Self {
        Self {
            translator,
            painter,
            registry,
            options: None,
            messenger: Messenger::new(),
        }
    }

    pub fn with_options_store(mut self, store: OptionsStore) -> Self {
        self.options = Some(store);
        self
    }

    pub fn messenger(&self) -> &Messenger {
        &self.messenger
    }

    pub fn translator(&self) -> &Translator<S> {
        &self.translator
    }

    pub async fn dispatch<D: Document>(
        &mut self,
        document: &mut D,
        command: &Command,
        submitted: &TranslateOptions,
    ) -> Outcome {
        let last_used = self.last_used_options();
        let options = command.resolve_options(submitted, last_used.as_ref());
        info!(
            "running {:?} with {:?} ({})",
            command, options.languages, options.action
        );
        self.run_translate(document, &options, command.saves_options())
            .await
    }

    pub async fn run_translate<D: Document>(
        &mut self,
        document: &mut D,
        options: &TranslateOptions,
        save_prefs: bool,
    ) -> Outcome {
        match self.try_run(document, options, save_prefs).await {
            Ok(outcome) => outcome,
            Err(error) => {
                let outcome = Outcome::from(error);
                self.messenger.handle_outcome(&outcome);
                outcome
            }
        }
    }

    async fn try_run<D: Document>(
        &mut self,
        document: &mut D,
        options: &TranslateOptions,
        save_prefs: bool,
    ) -> Result<Outcome, TranslateError> {
        let languages = self.validate_languages(&options.languages)?;
        if save_prefs {
            self.save_options(options);
        }

        let selection = document.selection();
        let elements = scanner::scan(document, &selection, options.translate_locked);
        if elements.is_empty() {
            return Err(TranslateError::NoEligibleElements {
                include_locked: options.translate_locked,
            });
        }
        let missing = elements
            .iter()
            .filter(|id| document.has_missing_font(id))
            .count();
        if missing > 0 {
            return Err(TranslateError::MissingFont {
                count: missing,
                total: elements.len(),
            });
        }

        for font in self.typefaces(document, &elements, &languages) {
            document.load_font(&font).await?;
        }

        let outcome = self
            .translator
            .translate(document, &elements, &languages)
            .await;
        self.messenger.handle_outcome(&outcome);
        if !outcome.is_success() {
            return Ok(outcome);
        }

        let PaintSummary { painted, failed } =
            self.painter.paint_all(document, &elements, options.action);
        info!(
            "painted {} translation(s) across {} element(s); {} skipped",
            painted,
            elements.len() - failed.len(),
            failed.len()
        );
        Ok(outcome)
    }

    /// Canonical ids for the requested languages.
    fn validate_languages(&self, requested: &[String]) -> Result<Vec<String>, TranslateError> {
        if requested.is_empty() {
            return Err(TranslateError::NoTargetLanguages);
        }
        let mut languages: Vec<String> = Vec::new();
        for code in requested {
            let entry = self
                .registry
                .get(code)
                .ok_or_else(|| TranslateError::UnknownLanguage(code.clone()))?;
            if !languages.contains(&entry.id) {
                languages.push(entry.id.clone());
            }
        }
        Ok(languages)
    }

    /// Typefaces used by the elements plus those the target languages need.
    fn typefaces<D: Document>(
        &self,
        document: &D,
        elements: &[NodeId],
        languages: &[String],
    ) -> Vec<FontRef> {
        let mut fonts: Vec<FontRef> = Vec::new();
        let used = elements.iter().flat_map(|id| document.fonts(id));
        for font in used.chain(self.registry.fonts_for(languages)) {
            if !fonts.contains(&font) {
                fonts.push(font);
            }
        }
        fonts
    }

    fn last_used_options(&self) -> Option<TranslateOptions> {
        let store = self.options.as_ref()?;
        match store.load() {
            Ok(options) => options,
            Err(error) => {
                warn!("ignoring saved options: {:#}", error);
                None
            }
        }
    }

    fn save_options(&self, options: &TranslateOptions) {
        let Some(store) = &self.options else {
            return;
        };
        if let Err(error) = store.save(options) {
            warn!("failed to save options: {:#}", error);
        }
    }
}
