use serde::{Deserialize, Serialize};

use crate::storage_types::{BackendKind, ConnectionKind};

/// Tenant to storage mapping, as returned by the mapping service.
///
/// The record is read-only for the adapter. Field names on the wire follow the mapping
/// service (camelCase, `cx` prefix for the customer tenant id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantStorageMapping {
    #[serde(rename = "cxTenantId", alias = "tenantId")]
    pub tenant_id: String,

    #[serde(rename = "storageType", alias = "backendKind")]
    pub backend_kind: BackendKind,

    /// Only meaningful for Azure mappings
    #[serde(
        rename = "connectionType",
        alias = "connectionKind",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub connection_kind: Option<ConnectionKind>,

    /// Storage account name (Azure) or access key id (S3)
    #[serde(default)]
    pub storage_identifier: String,

    /// Name of the secret holding the credential for this mapping
    #[serde(
        rename = "storageAccessKeySecretRef",
        alias = "secretRef",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub secret_ref: Option<String>,

    /// Blob container (Azure) or bucket (S3)
    #[serde(alias = "bucketName", default)]
    pub container_name: String,

    #[serde(
        rename = "storageRegion",
        alias = "region",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub region: Option<String>,

    #[serde(rename = "isAzureCrossTenant", alias = "crossTenant", default)]
    pub cross_tenant: bool,

    #[serde(
        rename = "azureCrossTenantId",
        alias = "crossTenantId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cross_tenant_id: Option<String>,
}

impl TenantStorageMapping {
    /// Cross-tenant id, treating an empty string as absent.
    pub fn cross_tenant_id(&self) -> Option<&str> {
        self.cross_tenant_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Secret reference, treating an empty string as absent.
    pub fn secret_ref(&self) -> Option<&str> {
        self.secret_ref
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn region(&self) -> Option<&str> {
        self.region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_mapping_service_payload() {
        let json = r#"{
            "cxTenantId": "t1",
            "storageType": "AzStorage",
            "connectionType": "AzStorageSharedKey",
            "storageIdentifier": "acct1",
            "storageAccessKeySecretRef": "acct1-key",
            "containerName": "c1",
            "isAzureCrossTenant": false,
            "azureCrossTenantId": null
        }"#;

        let mapping: TenantStorageMapping = serde_json::from_str(json).unwrap();
        assert_eq!(mapping.tenant_id, "t1");
        assert_eq!(mapping.backend_kind, BackendKind::AzureBlob);
        assert_eq!(mapping.connection_kind, Some(ConnectionKind::SharedKey));
        assert_eq!(mapping.secret_ref(), Some("acct1-key"));
        assert_eq!(mapping.container_name, "c1");
        assert!(!mapping.cross_tenant);
        assert_eq!(mapping.cross_tenant_id(), None);
    }

    #[test]
    fn deserializes_s3_mapping_without_connection_type() {
        let json = r#"{
            "tenantId": "t2",
            "storageType": 1,
            "storageIdentifier": "AKIDEXAMPLE",
            "secretRef": "t2-secret",
            "bucketName": "b1",
            "region": "us-east-1"
        }"#;

        let mapping: TenantStorageMapping = serde_json::from_str(json).unwrap();
        assert_eq!(mapping.backend_kind, BackendKind::AmazonS3);
        assert_eq!(mapping.connection_kind, None);
        assert_eq!(mapping.container_name, "b1");
        assert_eq!(mapping.region(), Some("us-east-1"));
    }

    #[test]
    fn empty_optional_fields_are_absent() {
        let json = r#"{
            "cxTenantId": "t3",
            "storageType": "AzStorage",
            "connectionType": "AzOauth",
            "containerName": "c3",
            "isAzureCrossTenant": true,
            "azureCrossTenantId": "  ",
            "storageRegion": ""
        }"#;

        let mapping: TenantStorageMapping = serde_json::from_str(json).unwrap();
        assert!(mapping.cross_tenant);
        assert_eq!(mapping.cross_tenant_id(), None);
        assert_eq!(mapping.region(), None);
        assert_eq!(mapping.secret_ref(), None);
    }
}
