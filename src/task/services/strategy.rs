//! Review strategy selection from changed file paths.

use crate::task::domain::ReviewStrategy;

/// Substrings that mark a path as security-sensitive wherever they appear.
const SECURITY_SUBSTRINGS: [&str; 6] = [
    ".env",
    "/auth/",
    "/middleware/",
    "password",
    "secret",
    "token",
];

/// Path prefixes and file names that mark a path as security-sensitive.
const SECURITY_FILES: [&str; 4] = [
    "config/auth.",
    "config/session.",
    "dockerfile",
    "docker-compose",
];

/// Extensions treated as frontend code.
const FRONTEND_EXTENSIONS: [&str; 9] = [
    "vue", "tsx", "ts", "jsx", "js", "css", "scss", "sass", "less",
];

/// Extensions treated as backend code.
const BACKEND_EXTENSIONS: [&str; 1] = ["php"];

/// Path fragment marking database migrations (backend evidence).
const MIGRATION_FRAGMENT: &str = "database/migrations/";

/// Classifies a merge request's changed files into a review strategy.
///
/// Security-sensitive paths take precedence over everything else; an empty
/// or unrecognized change set falls back to the backend review.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyResolver;

impl StrategyResolver {
    /// Creates a resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolves the review strategy for a set of changed file paths.
    #[must_use]
    pub fn resolve(&self, file_paths: &[String]) -> ReviewStrategy {
        if file_paths.is_empty() {
            return ReviewStrategy::BackendReview;
        }

        if file_paths.iter().any(|path| is_security_sensitive(path)) {
            return ReviewStrategy::SecurityAudit;
        }

        let mut has_frontend = false;
        let mut has_backend = false;
        for path in file_paths {
            let ext = extension(path);
            if FRONTEND_EXTENSIONS.contains(&ext.as_str()) {
                has_frontend = true;
            }
            if BACKEND_EXTENSIONS.contains(&ext.as_str()) || is_migration(path) {
                has_backend = true;
            }
            if has_frontend && has_backend {
                return ReviewStrategy::MixedReview;
            }
        }

        if has_frontend {
            return ReviewStrategy::FrontendReview;
        }
        ReviewStrategy::BackendReview
    }
}

fn extension(path: &str) -> String {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

fn is_migration(path: &str) -> bool {
    path.to_ascii_lowercase().contains(MIGRATION_FRAGMENT)
}

fn is_security_sensitive(path: &str) -> bool {
    let lowered = path.to_ascii_lowercase();
    if SECURITY_SUBSTRINGS
        .iter()
        .any(|fragment| lowered.contains(fragment))
    {
        return true;
    }
    let file_name = std::path::Path::new(&lowered)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    SECURITY_FILES
        .iter()
        .any(|fragment| lowered.contains(fragment) || file_name.starts_with(fragment))
}
