use thiserror::Error;

use crate::document::NodeId;

/// Failures the translation core distinguishes when deciding what the user
/// sees versus what only goes to the log.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Paint was attempted on an element that was never reconciled.
    #[error("node {0} is missing translations")]
    MissingLedger(NodeId),
    /// The remote service returned no usable data.
    #[error("translations could not be completed: {0}")]
    RemoteServiceUnavailable(String),
    #[error("no text nodes were selected/found")]
    NoEligibleElements { include_locked: bool },
    #[error("{count} of {total} text node(s) contained missing fonts")]
    MissingFont { count: usize, total: usize },
    #[error("no target languages were selected")]
    NoTargetLanguages,
    #[error("unknown language code: {0}")]
    UnknownLanguage(String),
    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

impl TranslateError {
    /// User-facing text, when the error warrants one.
    pub fn toast(&self) -> Option<String> {
        match self {
            TranslateError::MissingLedger(_) | TranslateError::Host(_) => None,
            TranslateError::RemoteServiceUnavailable(_) => {
                Some("Unfortunately, text could not be translated".to_string())
            }
            TranslateError::NoEligibleElements { include_locked } => Some(if *include_locked {
                "You need to select at least one text layer".to_string()
            } else {
                "You need to select at least one unlocked text layer".to_string()
            }),
            TranslateError::MissingFont { total, .. } => Some(if *total > 1 {
                "One or more selected text layers contain missing fonts".to_string()
            } else {
                "This text layer contains a missing font".to_string()
            }),
            TranslateError::NoTargetLanguages => {
                Some("You need to select at least one language".to_string())
            }
            TranslateError::UnknownLanguage(code) => {
                Some(format!("'{}' is not a supported language", code))
            }
        }
    }
}
