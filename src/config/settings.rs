//! Process-level configuration.

use crate::vcs::domain::ActorId;

/// Token pricing in dollars per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    /// Price per million input tokens.
    pub input_per_mtok: f64,
    /// Price per million output tokens.
    pub output_per_mtok: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            input_per_mtok: 5.0,
            output_per_mtok: 25.0,
        }
    }
}

/// Static process configuration read at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application secret used to sign task tokens.
    pub app_secret: String,
    /// Validity window of a task token in minutes.
    pub token_budget_minutes: i64,
    /// GitLab account id of the bot, used to ignore its own notes.
    pub bot_account_id: Option<ActorId>,
    /// Token pricing used for cost accounting.
    pub pricing: Pricing,
    /// Commit status context name shown in the GitLab UI.
    pub commit_status_name: String,
}

impl AppConfig {
    /// Default task token validity window.
    pub const DEFAULT_TOKEN_BUDGET_MINUTES: i64 = 60;

    /// Creates a configuration with defaults for everything except the
    /// signing secret.
    #[must_use]
    pub fn new(app_secret: impl Into<String>) -> Self {
        Self {
            app_secret: app_secret.into(),
            token_budget_minutes: Self::DEFAULT_TOKEN_BUDGET_MINUTES,
            bot_account_id: None,
            pricing: Pricing::default(),
            commit_status_name: "vunnix-code-review".to_owned(),
        }
    }

    /// Sets the token validity window.
    #[must_use]
    pub const fn with_token_budget_minutes(mut self, minutes: i64) -> Self {
        self.token_budget_minutes = minutes;
        self
    }

    /// Sets the bot account id filtered out of note events.
    #[must_use]
    pub const fn with_bot_account(mut self, bot_account_id: ActorId) -> Self {
        self.bot_account_id = Some(bot_account_id);
        self
    }

    /// Sets the token pricing.
    #[must_use]
    pub const fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }
}
