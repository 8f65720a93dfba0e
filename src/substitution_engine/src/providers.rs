//! Provider registry that maps the configured [`ProviderId`] to a concrete search provider.
use fallback_search::providers::{
    DisabledProvider, ProviderInitError, SearchProvider, brave_rest::BraveProvider,
};

use crate::settings::ProviderId;

/// Build and return a boxed search provider corresponding to the supplied ProviderId.
pub fn build_provider(
    id: ProviderId,
) -> Result<Box<dyn SearchProvider + Send + Sync>, ProviderInitError> {
    match id {
        ProviderId::Brave => {
            let p = BraveProvider::new()?;
            Ok(Box::new(p))
        }
        ProviderId::Disabled => Ok(Box::new(DisabledProvider)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_needs_no_environment() {
        let p = build_provider(ProviderId::Disabled).unwrap();
        assert_eq!(p.name(), "disabled");
    }
}
