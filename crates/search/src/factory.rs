//! Web search provider factory.

use crate::client::WebSearch;
use crate::providers::{tavily, TavilyClient};
use greenguide_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create a web search client based on the provider name.
pub fn create_search(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn WebSearch>> {
    match provider.to_lowercase().as_str() {
        "tavily" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("Tavily provider requires API key".to_string())
            })?;
            let base_url = endpoint.unwrap_or(tavily::DEFAULT_ENDPOINT);
            Ok(Arc::new(TavilyClient::new(base_url, api_key, timeout)?))
        }
        _ => Err(AppError::Config(format!(
            "Unknown search provider: {}",
            provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tavily() {
        let search = create_search("tavily", None, Some("tvly-test"), Duration::from_secs(5)).unwrap();
        assert_eq!(search.provider_name(), "tavily");
    }

    #[test]
    fn test_tavily_requires_key() {
        assert!(matches!(
            create_search("tavily", None, None, Duration::from_secs(5)),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_provider() {
        assert!(create_search("bing", None, Some("k"), Duration::from_secs(5)).is_err());
    }
}
