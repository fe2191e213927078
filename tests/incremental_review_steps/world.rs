//! Shared world state for incremental review BDD scenarios.

use axum::http::StatusCode;
use rstest::fixture;
use serde_json::Value;

use crate::test_helpers::TestApp;

/// Scenario world: the wired application plus the artifacts each step
/// hands to the next.
pub struct ReviewWorld {
    pub app: TestApp,
    pub mr_iid: u64,
    pub task_id: Option<u64>,
    pub bearer: Option<String>,
    pub last_submission: Option<Value>,
    pub last_status: Option<StatusCode>,
    pub threads_before_re_review: usize,
}

impl ReviewWorld {
    /// Creates a world over a freshly wired application.
    #[must_use]
    pub fn new() -> Self {
        Self {
            app: TestApp::new(),
            mr_iid: 10,
            task_id: None,
            bearer: None,
            last_submission: None,
            last_status: None,
            threads_before_re_review: 0,
        }
    }
}

impl Default for ReviewWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ReviewWorld {
    ReviewWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
