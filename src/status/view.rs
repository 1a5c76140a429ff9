//! Display model for the status panel.

use super::ValidationStatus;
use std::fmt;

/// Flattened, printable form of a [`ValidationStatus`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatusView {
    /// Short title, e.g. `Access granted`.
    pub headline: &'static str,
    /// Matched user name, `Unknown` when absent.
    pub user: String,
    /// Match confidence of a granted result.
    pub confidence: Option<f64>,
    /// Whether liveness passed.
    pub liveness: bool,
    /// Passages recorded for the user.
    pub passage_count: Option<u32>,
    /// Secondary line.
    pub message: Option<String>,
}

impl StatusView {
    /// Flattens a status for display.
    pub fn from_status(status: &ValidationStatus) -> Self {
        let mut view = Self {
            headline: "",
            user: "Unknown".to_string(),
            confidence: None,
            liveness: false,
            passage_count: None,
            message: None,
        };

        match status {
            ValidationStatus::Waiting { message } => {
                view.headline = "Waiting";
                view.message = message.clone();
            }
            ValidationStatus::Processing => view.headline = "Processing...",
            ValidationStatus::Success(result) => {
                view.headline = "Access granted";
                if let Some(name) = &result.user_name {
                    view.user = name.clone();
                }
                view.confidence = Some(result.confidence);
                view.liveness = result.liveness_passed;
                view.passage_count = result.passage_count;
                view.message = result.message.clone();
            }
            ValidationStatus::Error(message) => {
                view.headline = "Access denied";
                view.message = Some(message.clone());
            }
        }
        view
    }

    /// Confidence as a percentage with one decimal, `0%` when absent.
    pub fn confidence_label(&self) -> String {
        match self.confidence {
            Some(c) if c > 0.0 => format!("{:.1}%", c * 100.0),
            _ => "0%".to_string(),
        }
    }

    /// `approved` or `under analysis`.
    pub fn liveness_label(&self) -> &'static str {
        if self.liveness {
            "approved"
        } else {
            "under analysis"
        }
    }
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] user={} confidence={} liveness={}",
            self.headline,
            self.user,
            self.confidence_label(),
            self.liveness_label()
        )?;
        if let Some(count) = self.passage_count {
            write!(f, " passages={}", count)?;
        }
        if let Some(message) = &self.message {
            write!(f, " - {}", message)?;
        }
        Ok(())
    }
}
