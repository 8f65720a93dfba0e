//! Engine settings: TOML file plus environment overrides.
//!
//! ```toml
//! primary_location = "principal"
//! max_results = 5
//!
//! [fallback]
//! provider = "brave"     # or "disabled"
//! timeout_ms = 10000
//! max_snippets = 8
//!
//! [banding]
//! roll_length_m = 20
//!
//! [import]
//! unknown_reference = "error"   # or "drop"
//! ```
//!
//! Every field has a default, so an empty file is valid. After parsing,
//! `SUBSTITUTION_PRIMARY_LOCATION` and `SUBSTITUTION_FALLBACK_TIMEOUT_MS`
//! override the file.

use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use shared_utils::env::{get_env_var_opt, parse_env_var};

use crate::{dataset::UnknownReferencePolicy, model::LocationId};

/// Overrides `primary_location`.
pub const PRIMARY_LOCATION_VAR: &str = "SUBSTITUTION_PRIMARY_LOCATION";
/// Overrides `fallback.timeout_ms`.
pub const FALLBACK_TIMEOUT_VAR: &str = "SUBSTITUTION_FALLBACK_TIMEOUT_MS";

/// Which web search backs the fallback gateway (serde snake_case).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    /// Brave Search REST API; needs `BRAVE_API_KEY`.
    Brave,
    /// No external lookup; fallback always ends in "no alternative".
    #[default]
    Disabled,
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    /// Location used when a query names none.
    pub primary_location: LocationId,
    /// Cap on internal candidates per result.
    pub max_results: usize,
    /// External lookup.
    pub fallback: FallbackSettings,
    /// Edge banding.
    pub banding: BandingSettings,
    /// Import behaviour.
    pub import: ImportSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            primary_location: LocationId::new("principal"),
            max_results: 5,
            fallback: FallbackSettings::default(),
            banding: BandingSettings::default(),
            import: ImportSettings::default(),
        }
    }
}

/// `[fallback]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FallbackSettings {
    /// Backend selection.
    pub provider: ProviderId,
    /// Upper bound on one lookup, in milliseconds.
    pub timeout_ms: u64,
    /// Snippets kept from one lookup.
    pub max_snippets: usize,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            provider: ProviderId::default(),
            timeout_ms: 10_000,
            max_snippets: 8,
        }
    }
}

impl FallbackSettings {
    /// `timeout_ms` as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// `[banding]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BandingSettings {
    /// Default roll length in metres for items with no override.
    pub roll_length_m: u32,
}

impl Default for BandingSettings {
    fn default() -> Self {
        Self { roll_length_m: 20 }
    }
}

/// `[import]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ImportSettings {
    /// Policy for records that reference unknown codes.
    pub unknown_reference: UnknownReferencePolicy,
}

impl Settings {
    /// Applies environment overrides on top of the parsed values.
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Some(loc) = get_env_var_opt(PRIMARY_LOCATION_VAR) {
            self.primary_location = LocationId::new(loc);
        }
        if let Some(ms) = parse_env_var::<u64>(FALLBACK_TIMEOUT_VAR)? {
            self.fallback.timeout_ms = ms;
        }
        Ok(())
    }

    /// Rejects values the engine cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.primary_location.is_empty() {
            bail!("primary_location cannot be empty");
        }
        if self.max_results == 0 {
            bail!("max_results must be at least 1");
        }
        if self.fallback.timeout_ms == 0 {
            bail!("fallback.timeout_ms must be at least 1");
        }
        if self.fallback.max_snippets == 0 {
            bail!("fallback.max_snippets must be at least 1");
        }
        if self.banding.roll_length_m == 0 {
            bail!("banding.roll_length_m must be at least 1");
        }
        Ok(())
    }
}

/// Parse settings from a TOML string, apply env overrides, and validate.
pub fn load_settings_str(toml_str: &str) -> anyhow::Result<Settings> {
    let settings: Settings = toml::from_str(toml_str).context("failed to parse settings TOML")?;
    finish(settings)
}

/// Defaults plus environment overrides, validated. Used when no settings
/// file is given.
pub fn load_settings_env() -> anyhow::Result<Settings> {
    finish(Settings::default())
}

fn finish(mut settings: Settings) -> anyhow::Result<Settings> {
    settings
        .apply_env_overrides()
        .context("invalid settings override in environment")?;
    settings.validate()?;
    Ok(settings)
}

/// Read a settings TOML file from disk; see [`load_settings_str`].
pub fn load_settings_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<Settings> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read settings file {}", path.as_ref().display()))?;
    load_settings_str(&text)
}
