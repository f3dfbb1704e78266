// ABOUTME: Factory for hosted-model clients, resolving a provider name and optional model from the environment.
// ABOUTME: Both supported providers speak the OpenAI Chat Completions format through one adapter.

pub mod openai;
pub mod sse;

use std::env;
use std::sync::Arc;

use crate::runtime::ModelClient;
use openai::OpenAICompatClient;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";

/// Names accepted by `create_model_client`.
pub const SUPPORTED_PROVIDERS: [&str; 2] = ["gemini", "openai"];

/// Create a model client for the given provider name.
///
/// The model is resolved from:
/// 1. The explicit `model` parameter (if Some)
/// 2. A provider-specific environment variable (e.g. GEMINI_MODEL)
/// 3. A default for that provider
///
/// A missing or empty API key is an error; callers treat it as fatal at startup.
pub fn create_model_client(
    provider: &str,
    model: Option<&str>,
) -> Result<Arc<dyn ModelClient>, anyhow::Error> {
    let (key_var, base_var, model_var, default_base, default_model) = match provider {
        "gemini" => (
            "GEMINI_API_KEY",
            "GEMINI_BASE_URL",
            "GEMINI_MODEL",
            GEMINI_BASE_URL,
            GEMINI_DEFAULT_MODEL,
        ),
        "openai" => (
            "OPENAI_API_KEY",
            "OPENAI_BASE_URL",
            "OPENAI_MODEL",
            OPENAI_BASE_URL,
            OPENAI_DEFAULT_MODEL,
        ),
        unknown => return Err(anyhow::anyhow!("unsupported LLM provider: {}", unknown)),
    };

    let api_key = non_empty_var(key_var)
        .ok_or_else(|| anyhow::anyhow!("{} environment variable not set", key_var))?;
    let base_url = non_empty_var(base_var).unwrap_or_else(|| default_base.to_string());
    let resolved_model = model
        .map(String::from)
        .or_else(|| non_empty_var(model_var))
        .unwrap_or_else(|| default_model.to_string());

    tracing::debug!(provider, model = %resolved_model, base_url = %base_url, "model client configured");

    Ok(Arc::new(OpenAICompatClient::new(
        provider,
        api_key,
        base_url,
        resolved_model,
    )))
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serialize all tests that read/write env vars to prevent race conditions.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Uses match instead of unwrap_err() because Arc<dyn ModelClient> doesn't impl Debug.
    fn expect_err(result: Result<Arc<dyn ModelClient>, anyhow::Error>) -> String {
        match result {
            Err(e) => e.to_string(),
            Ok(client) => panic!("expected error, got Ok with model: {}", client.model_name()),
        }
    }

    fn expect_ok(result: Result<Arc<dyn ModelClient>, anyhow::Error>) -> Arc<dyn ModelClient> {
        match result {
            Ok(client) => client,
            Err(e) => panic!("expected Ok, got Err: {}", e),
        }
    }

    #[test]
    fn unknown_provider_returns_error() {
        let err = expect_err(create_model_client("unknown", None));
        assert!(
            err.contains("unsupported LLM provider"),
            "expected 'unsupported LLM provider' in error, got: {}",
            err
        );
    }

    #[test]
    fn gemini_missing_api_key_returns_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe { env::remove_var("GEMINI_API_KEY") };
        let err = expect_err(create_model_client("gemini", None));
        assert!(
            err.contains("GEMINI_API_KEY"),
            "expected mention of GEMINI_API_KEY in error, got: {}",
            err
        );
    }

    #[test]
    fn gemini_empty_api_key_counts_as_missing() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe { env::set_var("GEMINI_API_KEY", "   ") };
        let result = create_model_client("gemini", None);
        unsafe { env::remove_var("GEMINI_API_KEY") };
        assert!(expect_err(result).contains("GEMINI_API_KEY"));
    }

    #[test]
    fn openai_missing_api_key_returns_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe { env::remove_var("OPENAI_API_KEY") };
        let err = expect_err(create_model_client("openai", None));
        assert!(
            err.contains("OPENAI_API_KEY"),
            "expected mention of OPENAI_API_KEY in error, got: {}",
            err
        );
    }

    #[test]
    fn gemini_success_returns_default_model() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe {
            env::set_var("GEMINI_API_KEY", "test-key-123");
            env::remove_var("GEMINI_MODEL");
        }

        let result = create_model_client("gemini", None);

        unsafe { env::remove_var("GEMINI_API_KEY") };

        let client = expect_ok(result);
        assert_eq!(client.provider_name(), "gemini");
        assert_eq!(client.model_name(), GEMINI_DEFAULT_MODEL);
    }

    #[test]
    fn model_env_var_overrides_default() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-key-789");
            env::set_var("OPENAI_MODEL", "gpt-4o-mini");
        }

        let result = create_model_client("openai", None);

        unsafe {
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("OPENAI_MODEL");
        }

        assert_eq!(expect_ok(result).model_name(), "gpt-4o-mini");
    }

    #[test]
    fn explicit_model_param_overrides_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe {
            env::set_var("GEMINI_API_KEY", "test-key-456");
            env::set_var("GEMINI_MODEL", "gemini-1.5-pro");
        }

        let result = create_model_client("gemini", Some("gemini-2.5-flash"));

        unsafe {
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("GEMINI_MODEL");
        }

        assert_eq!(
            expect_ok(result).model_name(),
            "gemini-2.5-flash",
            "explicit model param should override env and default"
        );
    }
}
