//! Typed webhook event envelope.
//!
//! The raw GitLab payload is a loosely-shaped JSON document; parsing maps
//! it onto one enum variant per event kind, each carrying only the fields
//! intake actually consumes. Everything downstream of parsing works with
//! these types, never with raw JSON.

mod event;
mod routed;

pub use event::{EventKind, IssueAction, MergeRequestAction, WebhookEnvelope, WebhookEvent};
pub use routed::RoutedEvent;
