//! Flags shared by every command-line tool.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use crate::gemini::{GeminiClient, GeminiConfig, DEFAULT_ENDPOINT};
use crate::retry::{CancelToken, RetryPolicy};

#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// API key (falls back to GOOGLE_API_KEY)
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Retries after the first attempt on transient failures
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    /// First backoff delay, doubled for each further retry
    #[arg(long, default_value_t = 2000)]
    pub retry_base_ms: u64,

    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,

    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,

    /// Override the model used for suggestions and search
    #[arg(long)]
    pub text_model: Option<String>,

    /// Override the model used for structured generation
    #[arg(long)]
    pub pro_model: Option<String>,
}

impl ApiArgs {
    pub fn to_config(&self) -> GeminiConfig {
        let mut config = GeminiConfig::new(self.api_key.clone())
            .with_endpoint(self.endpoint.clone())
            .with_retry(RetryPolicy::new(
                self.max_retries,
                Duration::from_millis(self.retry_base_ms),
            ));
        config.timeout = Duration::from_secs(self.timeout_secs);
        if let Some(model) = &self.text_model {
            config.models.text = model.clone();
        }
        if let Some(model) = &self.pro_model {
            config.models.pro = model.clone();
        }
        config
    }

    pub fn client(&self) -> Result<GeminiClient> {
        GeminiClient::new(self.to_config()).context("failed to build HTTP client")
    }

    /// Set up the file logger for `run_name` under `--log-dir`.
    pub fn init_logging(&self, run_name: &str) -> Result<PathBuf> {
        crate::logging::init(&self.log_dir, run_name)
    }
}

/// Token cancelled on the first Ctrl-C.
pub fn ctrl_c_token() -> CancelToken {
    let token = CancelToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, canceling pending retries");
            eprintln!("canceling...");
            trigger.cancel();
        }
    });
    token
}
