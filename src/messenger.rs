use tracing::{info, warn};

use crate::outcome::{Outcome, Status};

/// Routes outcomes to the log and collects the toasts a host would display.
#[derive(Debug, Default)]
pub struct Messenger {
    toasts: Vec<String>,
}

impl Messenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self, message: &str) {
        info!("{}", message);
    }

    pub fn toast(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("toast: {}", message);
        self.toasts.push(message);
    }

    pub fn handle_outcome(&mut self, outcome: &Outcome) {
        if let Some(log) = &outcome.log {
            match outcome.status {
                Status::Success => info!("{}", log),
                Status::Error => warn!("{}", log),
            }
        }
        if let Some(toast) = &outcome.toast {
            self.toast(toast.clone());
        }
    }

    pub fn toasts(&self) -> &[String] {
        &self.toasts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_toasts_are_collected() {
        let mut messenger = Messenger::new();
        messenger.handle_outcome(&Outcome::success("Text was translated"));
        messenger.handle_outcome(&Outcome::error(
            "Translations could not be completed",
            Some("Unfortunately, text could not be translated".to_string()),
        ));
        assert_eq!(
            messenger.toasts(),
            ["Unfortunately, text could not be translated".to_string()]
        );
    }
}
