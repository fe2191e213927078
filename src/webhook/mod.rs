//! Webhook intake for Vunnix.
//!
//! Turns untrusted GitLab webhook deliveries into at most one dispatched
//! task each: payloads are parsed into a typed event envelope, classified
//! into intents, gated on the actor's permissions, deduplicated by delivery
//! uuid, and finally handed to task dispatch. The module follows hexagonal
//! architecture:
//!
//! - The typed event envelope in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Classification, dedup, and intake orchestration in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
