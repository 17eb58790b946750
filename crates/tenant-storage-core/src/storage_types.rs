use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Raw enum value as sent by the mapping service.
///
/// Older deployments serialize enums by index, newer ones by name; both are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawKind {
    Name(String),
    Index(u64),
}

/// Storage backend family a tenant is mapped to.
///
/// Values the adapter does not know are kept as `Unknown` so resolution can reject them
/// with the offending value instead of failing at deserialization time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawKind", into = "String")]
pub enum BackendKind {
    AzureBlob,
    AmazonS3,
    Unknown(String),
}

impl BackendKind {
    pub fn as_str(&self) -> &str {
        match self {
            BackendKind::AzureBlob => "azure_blob",
            BackendKind::AmazonS3 => "amazon_s3",
            BackendKind::Unknown(raw) => raw.as_str(),
        }
    }
}

impl From<RawKind> for BackendKind {
    fn from(raw: RawKind) -> Self {
        match raw {
            RawKind::Index(0) => BackendKind::AzureBlob,
            RawKind::Index(1) => BackendKind::AmazonS3,
            RawKind::Index(other) => BackendKind::Unknown(other.to_string()),
            RawKind::Name(name) => name.parse().unwrap_or(BackendKind::Unknown(name)),
        }
    }
}

impl From<BackendKind> for String {
    fn from(kind: BackendKind) -> Self {
        kind.as_str().to_string()
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "azstorage" | "azurestorageaccount" | "azure" | "azure_blob" | "azureblob" => {
                Ok(BackendKind::AzureBlob)
            }
            "awss3" | "amazons3" | "s3" | "amazon_s3" => Ok(BackendKind::AmazonS3),
            _ => Err(format!("Invalid backend kind: {}", s)),
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Authentication mode for an Azure Blob Storage mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawKind", into = "String")]
pub enum ConnectionKind {
    /// Secret holds a full storage connection string
    ConnectionString,
    /// Secret holds a pre-authorized (SAS) URI
    SasUri,
    /// Secret holds the storage account key
    SharedKey,
    /// Delegated identity, optionally cross-tenant
    OAuth,
    Unknown(String),
}

impl ConnectionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ConnectionKind::ConnectionString => "connection_string",
            ConnectionKind::SasUri => "sas_uri",
            ConnectionKind::SharedKey => "shared_key",
            ConnectionKind::OAuth => "oauth",
            ConnectionKind::Unknown(raw) => raw.as_str(),
        }
    }
}

impl From<RawKind> for ConnectionKind {
    fn from(raw: RawKind) -> Self {
        match raw {
            RawKind::Index(0) => ConnectionKind::ConnectionString,
            RawKind::Index(1) => ConnectionKind::SasUri,
            RawKind::Index(2) => ConnectionKind::SharedKey,
            RawKind::Index(3) => ConnectionKind::OAuth,
            RawKind::Index(other) => ConnectionKind::Unknown(other.to_string()),
            RawKind::Name(name) => name.parse().unwrap_or(ConnectionKind::Unknown(name)),
        }
    }
}

impl From<ConnectionKind> for String {
    fn from(kind: ConnectionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl FromStr for ConnectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "azconnectionstring" | "connectionstring" | "connection_string" => {
                Ok(ConnectionKind::ConnectionString)
            }
            "azsasuri" | "sasuri" | "sas_uri" => Ok(ConnectionKind::SasUri),
            "azstoragesharedkey" | "sharedkey" | "shared_key" | "accesskey" => {
                Ok(ConnectionKind::SharedKey)
            }
            "azoauth" | "oauth" => Ok(ConnectionKind::OAuth),
            _ => Err(format!("Invalid connection kind: {}", s)),
        }
    }
}

impl Display for ConnectionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Public AWS regions accepted for S3 mappings.
pub const KNOWN_S3_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "af-south-1",
    "ap-east-1",
    "ap-south-1",
    "ap-south-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ca-central-1",
    "ca-west-1",
    "eu-central-1",
    "eu-central-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-south-1",
    "eu-south-2",
    "eu-north-1",
    "il-central-1",
    "me-south-1",
    "me-central-1",
    "sa-east-1",
    "us-gov-east-1",
    "us-gov-west-1",
    "cn-north-1",
    "cn-northwest-1",
];

/// A validated S3 region identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Region(String);

impl S3Region {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for S3Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if KNOWN_S3_REGIONS.contains(&normalized.as_str()) {
            Ok(S3Region(normalized))
        } else {
            Err(format!("Unknown S3 region: {}", s))
        }
    }
}

impl Display for S3Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_accepts_names_and_indices() {
        let by_name: BackendKind = serde_json::from_str("\"AzStorage\"").unwrap();
        assert_eq!(by_name, BackendKind::AzureBlob);

        let legacy: BackendKind = serde_json::from_str("\"AmazonS3\"").unwrap();
        assert_eq!(legacy, BackendKind::AmazonS3);

        let by_index: BackendKind = serde_json::from_str("1").unwrap();
        assert_eq!(by_index, BackendKind::AmazonS3);
    }

    #[test]
    fn unknown_backend_kind_is_preserved() {
        let kind: BackendKind = serde_json::from_str("\"GoogleCloud\"").unwrap();
        assert_eq!(kind, BackendKind::Unknown("GoogleCloud".to_string()));

        let kind: BackendKind = serde_json::from_str("7").unwrap();
        assert_eq!(kind, BackendKind::Unknown("7".to_string()));
    }

    #[test]
    fn connection_kind_accepts_legacy_spellings() {
        let cases = [
            ("\"AzConnectionString\"", ConnectionKind::ConnectionString),
            ("\"AzSasUri\"", ConnectionKind::SasUri),
            ("\"AzStorageSharedKey\"", ConnectionKind::SharedKey),
            ("\"AzOauth\"", ConnectionKind::OAuth),
            ("3", ConnectionKind::OAuth),
        ];
        for (json, expected) in cases {
            let kind: ConnectionKind = serde_json::from_str(json).unwrap();
            assert_eq!(kind, expected, "input {}", json);
        }
    }

    #[test]
    fn kinds_serialize_as_canonical_names() {
        assert_eq!(
            serde_json::to_string(&BackendKind::AmazonS3).unwrap(),
            "\"amazon_s3\""
        );
        assert_eq!(
            serde_json::to_string(&ConnectionKind::SharedKey).unwrap(),
            "\"shared_key\""
        );
    }

    #[test]
    fn s3_region_validation() {
        assert_eq!("us-east-1".parse::<S3Region>().unwrap().as_str(), "us-east-1");
        assert_eq!("EU-WEST-1".parse::<S3Region>().unwrap().as_str(), "eu-west-1");
        assert!("mars-north-1".parse::<S3Region>().is_err());
    }
}
