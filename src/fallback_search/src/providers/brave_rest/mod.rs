//! Brave Search web API provider.

pub mod params;
pub mod provider;
pub mod response;

pub use provider::BraveProvider;
