use std::sync::Arc;

use tenant_storage_core::{Config, SecretStore};

use crate::resolver::{ConnectionResolver, ResolverOptions};

/// Create the default resolver from configuration
pub fn create_resolver(config: &Config, secrets: Arc<dyn SecretStore>) -> ConnectionResolver {
    let options = ResolverOptions {
        cross_tenant_secrets: config.cross_tenant_secrets.clone(),
        endpoints: config.endpoints.clone(),
    };

    tracing::debug!(
        secret_store = secrets.store_name(),
        s3_endpoint = ?options.endpoints.s3,
        azure_endpoint = ?options.endpoints.azure_blob,
        "Creating connection resolver"
    );

    ConnectionResolver::new(secrets, options)
}
