//! Connection strategies.
//!
//! A strategy is the fully resolved recipe for reaching one backend: which
//! credential kind, which account, and the secret material itself. Strategies are
//! produced by the resolver and consumed exactly once when the session is built.

use tenant_storage_core::{S3Region, SecretValue};
use url::Url;

use crate::session::StrategyKind;

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// How an Azure OAuth session obtains its token.
#[derive(Debug, Clone)]
pub enum DelegatedIdentity {
    /// Whatever identity the host environment provides (managed identity,
    /// workload identity or `AZURE_*` variables).
    Ambient,
    /// Service principal registered in another directory.
    CrossTenant {
        tenant_id: String,
        client_id: String,
        client_secret: SecretValue,
    },
}

#[derive(Debug, Clone)]
pub enum ConnectionStrategy {
    AzureConnectionString(AzureConnectionString),
    AzureSasUri(AzureSasUri),
    AzureSharedKey {
        account: String,
        key: SecretValue,
    },
    AzureOAuth {
        account: String,
        identity: DelegatedIdentity,
    },
    S3AccessKey {
        access_key_id: String,
        secret_access_key: SecretValue,
        region: S3Region,
    },
}

impl ConnectionStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            ConnectionStrategy::AzureConnectionString(cs) => StrategyKind::AzureConnectionString {
                has_account_key: cs.has_account_key(),
            },
            ConnectionStrategy::AzureSasUri(_) => StrategyKind::AzureSasUri,
            ConnectionStrategy::AzureSharedKey { .. } => StrategyKind::AzureSharedKey,
            ConnectionStrategy::AzureOAuth { identity, .. } => StrategyKind::AzureOAuth {
                cross_tenant: matches!(identity, DelegatedIdentity::CrossTenant { .. }),
            },
            ConnectionStrategy::S3AccessKey { .. } => StrategyKind::S3AccessKey,
        }
    }
}

/// Credential carried by a connection string.
#[derive(Debug, Clone)]
pub enum ConnectionStringCredential {
    AccountKey(SecretValue),
    SharedAccessSignature(SecretValue),
    /// `UseDevelopmentStorage=true`; the emulator's well-known key is supplied by the client.
    DevelopmentStorage,
}

/// Parsed `Key=Value;Key=Value` Azure storage connection string.
#[derive(Debug, Clone)]
pub struct AzureConnectionString {
    pub account_name: Option<String>,
    pub credential: ConnectionStringCredential,
    pub blob_endpoint: Option<String>,
}

impl AzureConnectionString {
    /// Parse a connection string. Errors never include the input, which holds a credential.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut account_name = None;
        let mut account_key = None;
        let mut sas = None;
        let mut blob_endpoint = None;
        let mut endpoint_suffix = None;
        let mut protocol = None;
        let mut development = false;

        for part in raw.trim().split(';').filter(|p| !p.trim().is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| "connection string segment is not Key=Value".to_string())?;
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "accountname" => account_name = Some(value.to_string()),
                "accountkey" => account_key = Some(value.to_string()),
                "sharedaccesssignature" => sas = Some(value.trim_start_matches('?').to_string()),
                "blobendpoint" => blob_endpoint = Some(value.trim_end_matches('/').to_string()),
                "endpointsuffix" => endpoint_suffix = Some(value.to_string()),
                "defaultendpointsprotocol" => protocol = Some(value.to_ascii_lowercase()),
                "usedevelopmentstorage" => development = value.eq_ignore_ascii_case("true"),
                // QueueEndpoint, TableEndpoint, FileEndpoint and friends
                _ => {}
            }
        }

        if development {
            return Ok(Self {
                account_name: None,
                credential: ConnectionStringCredential::DevelopmentStorage,
                blob_endpoint,
            });
        }

        let credential = match (account_key, sas) {
            (Some(key), _) if !key.is_empty() => {
                ConnectionStringCredential::AccountKey(SecretValue::new(key))
            }
            (_, Some(sas)) if !sas.is_empty() => {
                ConnectionStringCredential::SharedAccessSignature(SecretValue::new(sas))
            }
            _ => {
                return Err(
                    "connection string has neither AccountKey nor SharedAccessSignature"
                        .to_string(),
                )
            }
        };

        let account_name = account_name.filter(|a| !a.is_empty());
        if account_name.is_none() && blob_endpoint.is_none() {
            return Err("connection string has neither AccountName nor BlobEndpoint".to_string());
        }
        if matches!(credential, ConnectionStringCredential::AccountKey(_)) && account_name.is_none()
        {
            return Err("AccountKey requires AccountName".to_string());
        }

        let blob_endpoint = blob_endpoint.or_else(|| {
            let suffix = endpoint_suffix.as_deref().unwrap_or(DEFAULT_ENDPOINT_SUFFIX);
            let protocol = protocol.as_deref().unwrap_or("https");
            if suffix == DEFAULT_ENDPOINT_SUFFIX && protocol == "https" {
                None
            } else {
                account_name
                    .as_ref()
                    .map(|account| format!("{}://{}.blob.{}", protocol, account, suffix))
            }
        });

        Ok(Self {
            account_name,
            credential,
            blob_endpoint,
        })
    }

    pub fn has_account_key(&self) -> bool {
        matches!(
            self.credential,
            ConnectionStringCredential::AccountKey(_)
                | ConnectionStringCredential::DevelopmentStorage
        )
    }

    /// Account name, falling back to the first label of the blob endpoint host.
    pub fn account(&self) -> Option<String> {
        self.account_name.clone().or_else(|| {
            self.blob_endpoint
                .as_deref()
                .and_then(|e| Url::parse(e).ok())
                .and_then(|u| account_from_host(&u))
        })
    }
}

/// A SAS URI pointing at an account or a container.
#[derive(Debug, Clone)]
pub struct AzureSasUri {
    pub account: String,
    /// `scheme://host[:port]` without path or query
    pub endpoint: String,
    /// Container named in the URI path, if any
    pub container: Option<String>,
    query: Vec<(String, String)>,
}

impl AzureSasUri {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let url = Url::parse(raw.trim()).map_err(|_| "SAS URI is not a valid URL".to_string())?;
        let host = url
            .host_str()
            .ok_or_else(|| "SAS URI has no host".to_string())?;

        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if !query.iter().any(|(k, _)| k == "sig") {
            return Err("SAS URI carries no signature".to_string());
        }

        let mut segments = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect::<Vec<_>>())
            .unwrap_or_default();

        // Emulator style: http://127.0.0.1:10000/{account}/{container}
        let path_style = host.parse::<std::net::IpAddr>().is_ok() || host == "localhost";
        let (account, endpoint) = if path_style {
            if segments.is_empty() {
                return Err("SAS URI has no account segment".to_string());
            }
            let account = segments.remove(0).to_string();
            let endpoint = format!("{}/{}", origin(&url, host), account);
            (account, endpoint)
        } else {
            let account =
                account_from_host(&url).ok_or_else(|| "SAS URI host has no account".to_string())?;
            (account, origin(&url, host))
        };

        Ok(Self {
            account,
            endpoint,
            container: segments.first().map(|s| s.to_string()),
            query,
        })
    }

    /// Query pairs, signature included
    pub fn sas_pairs(&self) -> Vec<(String, String)> {
        self.query.clone()
    }
}

fn origin(url: &Url, host: &str) -> String {
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    }
}

fn account_from_host(url: &Url) -> Option<String> {
    url.host_str()
        .and_then(|h| h.split('.').next())
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_account_key_connection_string() {
        let cs = AzureConnectionString::parse(
            "DefaultEndpointsProtocol=https;AccountName=acct1;AccountKey=a2V5==;EndpointSuffix=core.windows.net",
        )
        .unwrap();

        assert_eq!(cs.account().as_deref(), Some("acct1"));
        assert!(cs.has_account_key());
        assert!(cs.blob_endpoint.is_none());
        match cs.credential {
            ConnectionStringCredential::AccountKey(ref key) => assert_eq!(key.expose(), "a2V5=="),
            ref other => panic!("unexpected credential {:?}", other),
        }
    }

    #[test]
    fn parses_sas_connection_string() {
        let cs = AzureConnectionString::parse(
            "BlobEndpoint=https://acct2.blob.core.windows.net/;SharedAccessSignature=?sv=2022-11-02&sig=abc",
        )
        .unwrap();

        assert!(!cs.has_account_key());
        assert_eq!(cs.account().as_deref(), Some("acct2"));
        assert_eq!(
            cs.blob_endpoint.as_deref(),
            Some("https://acct2.blob.core.windows.net")
        );
    }

    #[test]
    fn sovereign_suffix_builds_endpoint() {
        let cs = AzureConnectionString::parse(
            "AccountName=acct3;AccountKey=a2V5;EndpointSuffix=core.chinacloudapi.cn",
        )
        .unwrap();
        assert_eq!(
            cs.blob_endpoint.as_deref(),
            Some("https://acct3.blob.core.chinacloudapi.cn")
        );
    }

    #[test]
    fn development_storage() {
        let cs = AzureConnectionString::parse("UseDevelopmentStorage=true").unwrap();
        assert!(matches!(
            cs.credential,
            ConnectionStringCredential::DevelopmentStorage
        ));
        assert!(cs.has_account_key());
    }

    #[test]
    fn rejects_connection_string_without_credential() {
        let err = AzureConnectionString::parse("AccountName=acct1").unwrap_err();
        assert!(err.contains("AccountKey"));

        let err = AzureConnectionString::parse("not a connection string").unwrap_err();
        assert!(!err.contains("not a connection string"));
    }

    #[test]
    fn parses_container_sas_uri() {
        let sas = AzureSasUri::parse(
            "https://acct1.blob.core.windows.net/c1?sv=2022-11-02&sp=rw&sr=c&sig=abc%3D",
        )
        .unwrap();

        assert_eq!(sas.account, "acct1");
        assert_eq!(sas.endpoint, "https://acct1.blob.core.windows.net");
        assert_eq!(sas.container.as_deref(), Some("c1"));
        assert!(sas
            .sas_pairs()
            .iter()
            .any(|(k, v)| k == "sig" && v == "abc="));
    }

    #[test]
    fn parses_emulator_sas_uri() {
        let sas =
            AzureSasUri::parse("http://127.0.0.1:10000/devstoreaccount1/c1?sv=1&sig=x").unwrap();
        assert_eq!(sas.account, "devstoreaccount1");
        assert_eq!(sas.endpoint, "http://127.0.0.1:10000/devstoreaccount1");
        assert_eq!(sas.container.as_deref(), Some("c1"));
    }

    #[test]
    fn rejects_unsigned_sas_uri() {
        assert!(AzureSasUri::parse("https://acct1.blob.core.windows.net/c1?sv=1").is_err());
        assert!(AzureSasUri::parse("::not a url::").is_err());
    }

    #[test]
    fn strategy_kinds() {
        let strategy = ConnectionStrategy::AzureOAuth {
            account: "acct1".into(),
            identity: DelegatedIdentity::CrossTenant {
                tenant_id: "dir-2".into(),
                client_id: "app".into(),
                client_secret: SecretValue::new("s"),
            },
        };
        assert_eq!(
            strategy.kind(),
            StrategyKind::AzureOAuth { cross_tenant: true }
        );
        assert!(!strategy.kind().can_sign());

        let strategy = ConnectionStrategy::S3AccessKey {
            access_key_id: "AKID".into(),
            secret_access_key: SecretValue::new("s"),
            region: "us-east-1".parse().unwrap(),
        };
        assert!(strategy.kind().can_sign());
    }
}
