//! Unit tests for result reconciliation.

mod format_tests;
mod poster_tests;
mod support;
