//! External web lookup used as the last resort when no internal substitute
//! exists.
//!
//! The crate exposes a provider-agnostic [`providers::SearchProvider`] trait,
//! a Brave Search REST implementation, and the [`models`] shared with callers.
//! Callers are expected to treat every provider failure as "no results";
//! the errors exist so they can be logged with context.

pub mod models;
pub mod providers;
pub mod relevance;
