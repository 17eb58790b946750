//! Secret resolution contract.
//!
//! Mapping records never carry credentials, only the name of a secret. Resolution goes
//! through a `SecretStore`; the Key Vault implementation lives in the lookup crate.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::SecretError;

/// A resolved secret. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        SecretValue(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(<redacted>)")
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        SecretValue(value)
    }
}

/// Key/value secret lookup.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Resolve a secret by name
    async fn get_secret(&self, name: &str) -> Result<SecretValue, SecretError>;

    /// Short name used in logs
    fn store_name(&self) -> &'static str;
}

/// In-memory secret store.
///
/// Counts lookups so callers can verify that no secret was read.
#[derive(Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, String>,
    lookups: AtomicUsize,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }

    /// Number of `get_secret` calls served so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_secret(&self, name: &str) -> Result<SecretValue, SecretError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.secrets
            .get(name)
            .map(|value| SecretValue::new(value.clone()))
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }

    fn store_name(&self) -> &'static str {
        "static"
    }
}

/// Reads secrets from environment variables.
///
/// `mttServicePrincipal--clientId` is looked up as `SECRET_MTTSERVICEPRINCIPAL__CLIENTID`:
/// prefix, uppercased, every non-alphanumeric character replaced by `_`.
#[derive(Debug, Clone)]
pub struct EnvSecretStore {
    prefix: String,
}

impl EnvSecretStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn variable_name(&self, secret_name: &str) -> String {
        let normalized: String = secret_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{}", self.prefix, normalized)
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new("SECRET_")
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, name: &str) -> Result<SecretValue, SecretError> {
        let variable = self.variable_name(name);
        match std::env::var(&variable) {
            Ok(value) if !value.is_empty() => Ok(SecretValue::new(value)),
            _ => Err(SecretError::NotFound(name.to_string())),
        }
    }

    fn store_name(&self) -> &'static str {
        "env"
    }
}
