//! Environment variable access with structured errors.
//!
//! Secrets (API keys) and deployment overrides (primary location, fallback
//! timeout) come from the process environment. These helpers turn the
//! stringly `std::env` surface into typed results.

use std::str::FromStr;

use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// An environment variable is set but its value could not be parsed.
#[derive(Debug, Error)]
#[error("Invalid value for environment variable {name}: {value:?} ({reason})")]
pub struct InvalidEnvVarError {
    /// Variable name.
    pub name: String,
    /// Raw value as found in the environment.
    pub value: String,
    /// Parser message.
    pub reason: String,
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// Empty values count as missing.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    get_env_var_opt(name).ok_or_else(|| MissingEnvVarError(name.to_string()))
}

/// Reads an optional environment variable. Unset and blank values yield `None`.
pub fn get_env_var_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads and parses an optional environment variable.
///
/// Returns `Ok(None)` when the variable is unset, and an error when it is set
/// to something `T` cannot parse.
pub fn parse_env_var<T>(name: &str) -> Result<Option<T>, InvalidEnvVarError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_var_opt(name) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| InvalidEnvVarError {
            name: name.to_string(),
            value: raw,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // SAFETY (for the unsafe env calls below): tests touching the environment
    // are serialized, so no other thread reads it concurrently.

    #[test]
    #[serial]
    fn missing_var_is_reported_by_name() {
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_MISSING") };
        let err = get_env_var("SHARED_UTILS_TEST_MISSING").unwrap_err();
        assert_eq!(err.0, "SHARED_UTILS_TEST_MISSING");
    }

    #[test]
    #[serial]
    fn blank_value_counts_as_missing() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_BLANK", "   ") };
        assert!(get_env_var_opt("SHARED_UTILS_TEST_BLANK").is_none());
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_BLANK") };
    }

    #[test]
    #[serial]
    fn parses_numbers_and_rejects_garbage() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_NUM", " 2500 ") };
        assert_eq!(parse_env_var::<u64>("SHARED_UTILS_TEST_NUM").unwrap(), Some(2500));

        unsafe { std::env::set_var("SHARED_UTILS_TEST_NUM", "soon") };
        let err = parse_env_var::<u64>("SHARED_UTILS_TEST_NUM").unwrap_err();
        assert_eq!(err.value, "soon");

        unsafe { std::env::remove_var("SHARED_UTILS_TEST_NUM") };
        assert_eq!(parse_env_var::<u64>("SHARED_UTILS_TEST_NUM").unwrap(), None);
    }
}
