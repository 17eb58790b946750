//! Azure Key Vault secret store.
//!
//! Authenticates with a service principal (client credentials flow) and reads secrets
//! through the Key Vault REST API. The access token is cached until shortly before it
//! expires; secret values are never cached.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tenant_storage_core::{SecretError, SecretStore, SecretValue};
use tokio::sync::RwLock;
use url::Url;

const KEY_VAULT_API_VERSION: &str = "7.4";
const KEY_VAULT_SCOPE: &str = "https://vault.azure.net/.default";
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct SecretBundle {
    value: String,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct KeyVaultSecretStore {
    client: Client,
    vault_url: Url,
    token_url: Url,
    client_id: String,
    client_secret: SecretValue,
    token: RwLock<Option<CachedToken>>,
}

impl KeyVaultSecretStore {
    pub fn new(
        vault_url: Url,
        authority_host: Url,
        tenant_id: &str,
        client_id: String,
        client_secret: SecretValue,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let token_url = authority_host
            .join(&format!(
                "{}/oauth2/v2.0/token",
                urlencoding::encode(tenant_id)
            ))
            .context("Invalid authority host or tenant id")?;

        Ok(Self {
            client,
            vault_url,
            token_url,
            client_id,
            client_secret,
            token: RwLock::new(None),
        })
    }

    async fn access_token(&self, secret_name: &str) -> Result<String, SecretError> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if Instant::now() + TOKEN_REFRESH_MARGIN < token.expires_at {
                    return Ok(token.value.clone());
                }
            }
        }

        let mut cached = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_REFRESH_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose()),
            ("scope", KEY_VAULT_SCOPE),
        ];

        let response = self
            .client
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| SecretError::Unavailable {
                name: secret_name.to_string(),
                reason: format!("token request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = %status, "Key Vault token request rejected");
            let reason = format!("token endpoint returned {}", status);
            return Err(if status.is_client_error() {
                SecretError::Denied {
                    name: secret_name.to_string(),
                    reason,
                }
            } else {
                SecretError::Unavailable {
                    name: secret_name.to_string(),
                    reason,
                }
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| SecretError::Unavailable {
            name: secret_name.to_string(),
            reason: format!("invalid token response: {}", e),
        })?;

        let value = token.access_token;
        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });

        tracing::debug!(expires_in = token.expires_in, "Key Vault access token refreshed");

        Ok(value)
    }

    fn secret_url(&self, name: &str) -> Result<Url, SecretError> {
        let mut url = self
            .vault_url
            .join(&format!("secrets/{}", urlencoding::encode(name)))
            .map_err(|_| SecretError::NotFound(name.to_string()))?;
        url.query_pairs_mut()
            .append_pair("api-version", KEY_VAULT_API_VERSION);
        Ok(url)
    }
}

#[async_trait]
impl SecretStore for KeyVaultSecretStore {
    #[tracing::instrument(skip(self), fields(vault = %self.vault_url))]
    async fn get_secret(&self, name: &str) -> Result<SecretValue, SecretError> {
        let url = self.secret_url(name)?;
        let token = self.access_token(name).await?;
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SecretError::Unavailable {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(SecretError::NotFound(name.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SecretError::Denied {
                name: name.to_string(),
                reason: format!("key vault returned {}", response.status()),
            }),
            status if !status.is_success() => Err(SecretError::Unavailable {
                name: name.to_string(),
                reason: format!("key vault returned {}", status),
            }),
            _ => {
                let bundle: SecretBundle =
                    response.json().await.map_err(|e| SecretError::Unavailable {
                        name: name.to_string(),
                        reason: format!("invalid secret response: {}", e),
                    })?;

                tracing::debug!(
                    secret = %name,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Secret resolved from Key Vault"
                );

                Ok(SecretValue::new(bundle.value))
            }
        }
    }

    fn store_name(&self) -> &'static str {
        "keyvault"
    }
}
