//! Error classification shared by the oracle and tool layers.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Broad error category for routing caller-side recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Protocol,
    Configuration,
    Tool,
    Budget,
    Canceled,
}

/// Suggested recovery action for a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    CheckCredentials,
    CheckConfiguration,
    IncreaseTimeout,
    IncreaseIterationBudget,
    RephraseQuery,
    None,
}

impl ErrorCategory {
    /// Map a category onto the action a caller should consider.
    pub fn recovery_suggestion(self) -> RecoverySuggestion {
        match self {
            Self::Authentication => RecoverySuggestion::CheckCredentials,
            Self::RateLimit | Self::Network | Self::Server => RecoverySuggestion::RetryWithBackoff,
            Self::Timeout => RecoverySuggestion::IncreaseTimeout,
            Self::Configuration => RecoverySuggestion::CheckConfiguration,
            Self::Budget => RecoverySuggestion::IncreaseIterationBudget,
            Self::Api | Self::Protocol | Self::Tool => RecoverySuggestion::RephraseQuery,
            Self::Canceled => RecoverySuggestion::None,
        }
    }
}
