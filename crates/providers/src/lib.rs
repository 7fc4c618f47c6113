//! LLM provider implementations for lorekeep.
//!
//! All providers implement the `lorekeep_core::Provider` trait. `build`
//! selects the provider from configuration; an unsupported provider name is
//! fatal, since no answer can be produced without a working completion
//! boundary.

pub mod openai;

pub use openai::OpenAiProvider;

use lorekeep_config::AppConfig;
use lorekeep_core::Provider;
use lorekeep_core::error::ProviderError;
use std::sync::Arc;

/// Build the configured provider.
pub fn build(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    match config.model.provider.as_str() {
        "openai" => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                ProviderError::AuthenticationFailed(
                    "No API key configured (set LOREKEEP_API_KEY or OPENAI_API_KEY)".into(),
                )
            })?;
            Ok(Arc::new(OpenAiProvider::openai(api_key)))
        }
        other => Err(ProviderError::NotConfigured(format!(
            "LLM provider {other} is not supported"
        ))),
    }
}
