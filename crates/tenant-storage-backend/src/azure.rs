use std::sync::Arc;

use object_store::azure::{MicrosoftAzure, MicrosoftAzureBuilder};
use url::Url;

use crate::retry_disabled;
use crate::session::StorageSession;
use crate::strategy::{
    AzureConnectionString, ConnectionStrategy, ConnectionStringCredential, DelegatedIdentity,
};

/// Build an Azure Blob session for `container`. No network call is made.
pub(crate) fn connect(
    strategy: &ConnectionStrategy,
    container: &str,
    storage_identifier: &str,
    endpoint_override: Option<&str>,
) -> Result<StorageSession, String> {
    let kind = strategy.kind();

    let (builder, endpoint) = match strategy {
        ConnectionStrategy::AzureConnectionString(cs) => connection_string_builder(cs)?,
        ConnectionStrategy::AzureSasUri(sas) => (
            MicrosoftAzureBuilder::new()
                .with_account(sas.account.clone())
                .with_sas_authorization(sas.sas_pairs()),
            Some(sas.endpoint.clone()),
        ),
        ConnectionStrategy::AzureSharedKey { account, key } => (
            MicrosoftAzureBuilder::new()
                .with_account(account.clone())
                .with_access_key(key.expose()),
            endpoint_override.map(|e| account_endpoint(e, account)),
        ),
        ConnectionStrategy::AzureOAuth { account, identity } => {
            let builder = match identity {
                // Picks up managed identity, workload identity or AZURE_* variables
                DelegatedIdentity::Ambient => MicrosoftAzureBuilder::from_env(),
                DelegatedIdentity::CrossTenant {
                    tenant_id,
                    client_id,
                    client_secret,
                } => MicrosoftAzureBuilder::new().with_client_secret_authorization(
                    client_id.clone(),
                    client_secret.expose(),
                    tenant_id.clone(),
                ),
            };
            (
                builder.with_account(account.clone()),
                endpoint_override.map(|e| account_endpoint(e, account)),
            )
        }
        ConnectionStrategy::S3AccessKey { .. } => {
            return Err("S3 strategy passed to the Azure connector".to_string())
        }
    };

    let mut builder = builder
        .with_container_name(container)
        .with_retry(retry_disabled());

    if let Some(endpoint) = endpoint {
        let allow_http = endpoint.starts_with("http://");
        builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
    }

    let store: MicrosoftAzure = builder.build().map_err(|e| e.to_string())?;

    Ok(StorageSession::azure(
        kind,
        container.to_string(),
        storage_identifier.to_string(),
        Arc::new(store),
    ))
}

fn connection_string_builder(
    cs: &AzureConnectionString,
) -> Result<(MicrosoftAzureBuilder, Option<String>), String> {
    let builder = match &cs.credential {
        ConnectionStringCredential::DevelopmentStorage => {
            MicrosoftAzureBuilder::new().with_use_emulator(true)
        }
        ConnectionStringCredential::AccountKey(key) => {
            let account = cs
                .account()
                .ok_or_else(|| "connection string has no account name".to_string())?;
            MicrosoftAzureBuilder::new()
                .with_account(account)
                .with_access_key(key.expose())
        }
        ConnectionStringCredential::SharedAccessSignature(sas) => {
            let account = cs
                .account()
                .ok_or_else(|| "connection string has no account name".to_string())?;
            let pairs: Vec<(String, String)> =
                url::form_urlencoded::parse(sas.expose().as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
            MicrosoftAzureBuilder::new()
                .with_account(account)
                .with_sas_authorization(pairs)
        }
    };

    Ok((builder, cs.blob_endpoint.clone()))
}

/// Endpoint for `account` under a configured override.
///
/// Emulators address accounts by path (`http://127.0.0.1:10000/{account}`); anything
/// else is taken as the account endpoint itself.
fn account_endpoint(endpoint: &str, account: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    let path_style = Url::parse(endpoint)
        .ok()
        .and_then(|u| {
            u.host_str()
                .map(|h| h == "localhost" || h.parse::<std::net::IpAddr>().is_ok())
        })
        .unwrap_or(false);

    if path_style {
        format!("{}/{}", endpoint, account)
    } else {
        endpoint.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenant_storage_core::SecretValue;

    #[test]
    fn emulator_override_appends_account() {
        assert_eq!(
            account_endpoint("http://127.0.0.1:10000/", "devstoreaccount1"),
            "http://127.0.0.1:10000/devstoreaccount1"
        );
        assert_eq!(
            account_endpoint("https://acct1.blob.core.usgovcloudapi.net", "acct1"),
            "https://acct1.blob.core.usgovcloudapi.net"
        );
    }

    #[test]
    fn rejects_s3_strategy() {
        let strategy = ConnectionStrategy::S3AccessKey {
            access_key_id: "AKID".into(),
            secret_access_key: SecretValue::new("s"),
            region: "us-east-1".parse().unwrap(),
        };
        assert!(connect(&strategy, "c1", "AKID", None).is_err());
    }
}
