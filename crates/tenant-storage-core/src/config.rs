//! Configuration module
//!
//! Configuration is built in two phases. `BaseConfig` is read from the environment
//! (`.env`, then `.env.{ENVIRONMENT}` as an override). `Config::resolve` then derives the
//! values that depend on other settings, such as the Key Vault endpoint from the vault
//! name, and freezes the result. There is no global config; callers pass `Config` around.

use std::env;
use std::time::Duration;

use url::Url;

use crate::models::MAX_SIGNED_URL_TTL;
use crate::secrets::SecretValue;

const MAPPING_REQUEST_TIMEOUT_SECS: u64 = 30;
const SIGNED_URL_TTL_SECS: u64 = 3600;
const SECRET_ENV_PREFIX: &str = "SECRET_";
const AZURE_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const CROSS_TENANT_CLIENT_ID_SECRET: &str = "mttServicePrincipal--clientId";
const CROSS_TENANT_CLIENT_SECRET_SECRET: &str = "mttServicePrincipal--clientSecret";

/// Raw settings, as read from the environment.
#[derive(Clone, Debug, Default)]
pub struct BaseConfig {
    pub environment: String,
    pub mapping_api_url: Option<String>,
    pub mapping_timeout_secs: u64,
    pub signed_url_ttl_secs: u64,
    pub secret_store: Option<String>,
    pub secret_env_prefix: String,
    pub key_vault_name: Option<String>,
    pub secret_store_url: Option<String>,
    pub azure_tenant_id: Option<String>,
    pub azure_client_id: Option<String>,
    pub azure_client_secret: Option<String>,
    pub azure_authority_host: String,
    pub cross_tenant_client_id_secret: String,
    pub cross_tenant_client_secret_secret: String,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub azure_storage_endpoint: Option<String>, // Custom blob endpoint (Azurite)
}

impl BaseConfig {
    /// Load `.env` and the per-environment override file, then read the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        if let Ok(environment) = env::var("ENVIRONMENT") {
            dotenvy::from_filename_override(format!(".env.{}", environment)).ok();
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let parse_u64 = |key: &str, default: u64| -> Result<u64, anyhow::Error> {
            match get(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
                None => Ok(default),
            }
        };

        Ok(BaseConfig {
            environment: get("ENVIRONMENT")
                .or_else(|| get("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
            mapping_api_url: get("STORAGE_MAPPING_API_URL"),
            mapping_timeout_secs: parse_u64(
                "MAPPING_REQUEST_TIMEOUT_SECS",
                MAPPING_REQUEST_TIMEOUT_SECS,
            )?,
            signed_url_ttl_secs: parse_u64("SIGNED_URL_TTL_SECS", SIGNED_URL_TTL_SECS)?,
            secret_store: get("SECRET_STORE"),
            secret_env_prefix: get("SECRET_ENV_PREFIX")
                .unwrap_or_else(|| SECRET_ENV_PREFIX.to_string()),
            key_vault_name: get("KEY_VAULT_NAME"),
            secret_store_url: get("SECRET_STORE_URL"),
            azure_tenant_id: get("AZURE_TENANT_ID"),
            azure_client_id: get("AZURE_CLIENT_ID"),
            azure_client_secret: get("AZURE_CLIENT_SECRET"),
            azure_authority_host: get("AZURE_AUTHORITY_HOST")
                .unwrap_or_else(|| AZURE_AUTHORITY_HOST.to_string()),
            cross_tenant_client_id_secret: get("CROSS_TENANT_CLIENT_ID_SECRET")
                .unwrap_or_else(|| CROSS_TENANT_CLIENT_ID_SECRET.to_string()),
            cross_tenant_client_secret_secret: get("CROSS_TENANT_CLIENT_SECRET_SECRET")
                .unwrap_or_else(|| CROSS_TENANT_CLIENT_SECRET_SECRET.to_string()),
            s3_endpoint: get("S3_ENDPOINT"),
            azure_storage_endpoint: get("AZURE_STORAGE_ENDPOINT"),
        })
    }
}

/// Where secrets referenced by mappings are read from.
#[derive(Clone, Debug)]
pub enum SecretStoreConfig {
    /// Environment variables with a name prefix
    Env { prefix: String },
    /// Azure Key Vault, authenticated with a service principal
    KeyVault {
        vault_url: Url,
        authority_host: Url,
        tenant_id: String,
        client_id: String,
        client_secret: SecretValue,
    },
}

/// Mapping service connection settings.
#[derive(Clone, Debug)]
pub struct MappingServiceConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

/// Names of the secrets holding the cross-tenant service principal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrossTenantSecretNames {
    pub client_id: String,
    pub client_secret: String,
}

impl Default for CrossTenantSecretNames {
    fn default() -> Self {
        Self {
            client_id: CROSS_TENANT_CLIENT_ID_SECRET.to_string(),
            client_secret: CROSS_TENANT_CLIENT_SECRET_SECRET.to_string(),
        }
    }
}

/// Optional backend endpoint overrides, for S3-compatible stores and emulators.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointOverrides {
    pub s3: Option<String>,
    pub azure_blob: Option<String>,
}

/// Frozen application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub mapping: MappingServiceConfig,
    pub secret_store: SecretStoreConfig,
    pub cross_tenant_secrets: CrossTenantSecretNames,
    pub endpoints: EndpointOverrides,
    pub default_signed_url_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::resolve(BaseConfig::from_env()?)
    }

    /// Second phase: derive dependent settings and validate.
    pub fn resolve(base: BaseConfig) -> Result<Self, anyhow::Error> {
        let mapping_api_url = base
            .mapping_api_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("STORAGE_MAPPING_API_URL must be set"))?;
        let mapping_base_url = parse_base_url(mapping_api_url)
            .map_err(|e| anyhow::anyhow!("STORAGE_MAPPING_API_URL is invalid: {}", e))?;

        if base.mapping_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "MAPPING_REQUEST_TIMEOUT_SECS must be greater than zero"
            ));
        }
        if base.signed_url_ttl_secs == 0 || base.signed_url_ttl_secs > MAX_SIGNED_URL_TTL.as_secs()
        {
            return Err(anyhow::anyhow!(
                "SIGNED_URL_TTL_SECS must be between 1 and {}",
                MAX_SIGNED_URL_TTL.as_secs()
            ));
        }

        let secret_store = resolve_secret_store(&base)?;

        Ok(Config {
            environment: base.environment,
            mapping: MappingServiceConfig {
                base_url: mapping_base_url,
                timeout: Duration::from_secs(base.mapping_timeout_secs),
            },
            secret_store,
            cross_tenant_secrets: CrossTenantSecretNames {
                client_id: base.cross_tenant_client_id_secret,
                client_secret: base.cross_tenant_client_secret_secret,
            },
            endpoints: EndpointOverrides {
                s3: base.s3_endpoint,
                azure_blob: base.azure_storage_endpoint,
            },
            default_signed_url_ttl: Duration::from_secs(base.signed_url_ttl_secs),
        })
    }
}

fn resolve_secret_store(base: &BaseConfig) -> Result<SecretStoreConfig, anyhow::Error> {
    let kind = match base.secret_store.as_deref().map(str::to_lowercase) {
        Some(kind) => kind,
        None if base.key_vault_name.is_some() || base.secret_store_url.is_some() => {
            "keyvault".to_string()
        }
        None => "env".to_string(),
    };

    match kind.as_str() {
        "env" => Ok(SecretStoreConfig::Env {
            prefix: base.secret_env_prefix.clone(),
        }),
        "keyvault" | "key_vault" | "azure_key_vault" => {
            // SECRET_STORE_URL wins over the name-derived endpoint
            let vault_url = match (&base.secret_store_url, &base.key_vault_name) {
                (Some(url), _) => parse_base_url(url)
                    .map_err(|e| anyhow::anyhow!("SECRET_STORE_URL is invalid: {}", e))?,
                (None, Some(name)) => parse_base_url(&format!("https://{}.vault.azure.net/", name))
                    .map_err(|e| anyhow::anyhow!("KEY_VAULT_NAME is invalid: {}", e))?,
                (None, None) => {
                    return Err(anyhow::anyhow!(
                        "KEY_VAULT_NAME or SECRET_STORE_URL must be set for the keyvault secret store"
                    ))
                }
            };
            let authority_host = parse_base_url(&base.azure_authority_host)
                .map_err(|e| anyhow::anyhow!("AZURE_AUTHORITY_HOST is invalid: {}", e))?;

            Ok(SecretStoreConfig::KeyVault {
                vault_url,
                authority_host,
                tenant_id: base.azure_tenant_id.clone().ok_or_else(|| {
                    anyhow::anyhow!("AZURE_TENANT_ID must be set for the keyvault secret store")
                })?,
                client_id: base.azure_client_id.clone().ok_or_else(|| {
                    anyhow::anyhow!("AZURE_CLIENT_ID must be set for the keyvault secret store")
                })?,
                client_secret: base
                    .azure_client_secret
                    .clone()
                    .map(SecretValue::from)
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "AZURE_CLIENT_SECRET must be set for the keyvault secret store"
                        )
                    })?,
            })
        }
        other => Err(anyhow::anyhow!("Invalid SECRET_STORE: {}", other)),
    }
}

/// Parse a base URL, forcing a trailing slash so `Url::join` appends instead of replacing.
fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("{}/", trimmed))
    }
}
