//! Navigator and window services the page controller relies on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Service workers are not supported on this platform")]
    Unsupported,

    #[error("Registration of {script} rejected: {reason}")]
    Rejected { script: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareData {
    pub title: String,
    pub text: String,
    pub url: String,
}

#[async_trait]
pub trait Platform: Send + Sync {
    /// `navigator.onLine`
    fn is_online(&self) -> bool;

    fn supports_service_worker(&self) -> bool;

    /// Register the worker script; returns the registration scope.
    async fn register_service_worker(&self, script_url: &str) -> Result<String, RegistrationError>;

    fn supports_share(&self) -> bool;

    async fn share(&self, data: &ShareData) -> anyhow::Result<()>;

    async fn write_clipboard(&self, text: &str) -> anyhow::Result<()>;
}

/// The user's answer to an install prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserChoice {
    Accepted,
    Dismissed,
}

/// Deferred install prompt captured from `beforeinstallprompt`.
#[async_trait]
pub trait InstallPrompt: Send + Sync {
    /// Show the prompt and wait for the user's choice.
    async fn prompt(&self) -> anyhow::Result<UserChoice>;
}
