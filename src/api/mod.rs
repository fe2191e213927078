//! HTTP boundary: the webhook endpoint and the runner result endpoint.
//!
//! Handlers translate between HTTP and the intake services; every business
//! decision lives below this layer. Error responses follow the taxonomy:
//! 400 malformed request, 401 bad credentials, 404 unknown task, 409 state
//! conflict, 422 per-field validation failures — and permission denials
//! are deliberately a 200 with a flag so webhook responses never leak
//! whether a secret was valid.

mod error;
mod result;
mod router;
mod state;
mod webhook;

pub use error::ApiError;
pub use router::router;
pub use state::AppState;
