use serde::Serialize;

use crate::error::TranslateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Result of a user-level operation. Callers branch on `status`; `log` is
/// for the log, `toast` is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toast: Option<String>,
}

impl Outcome {
    pub fn success(log: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            log: Some(log.into()),
            toast: None,
        }
    }

    pub fn error(log: impl Into<String>, toast: Option<String>) -> Self {
        Self {
            status: Status::Error,
            log: Some(log.into()),
            toast,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

impl From<TranslateError> for Outcome {
    fn from(error: TranslateError) -> Self {
        let toast = error.toast();
        Outcome::error(error.to_string(), toast)
    }
}
