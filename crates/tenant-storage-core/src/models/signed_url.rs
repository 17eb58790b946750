use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SignError;

/// Default lifetime of a signed URL when the caller does not pick one.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(60 * 60);

/// Upper bound accepted for signed URL lifetimes (SigV4 maximum).
pub const MAX_SIGNED_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// What the holder of a signed URL is allowed to do with the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignedUrlAction {
    Upload,
    Download,
}

impl FromStr for SignedUrlAction {
    type Err = SignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upload" | "put" | "write" => Ok(SignedUrlAction::Upload),
            "download" | "get" | "read" => Ok(SignedUrlAction::Download),
            _ => Err(SignError::UnsupportedAction(s.to_string())),
        }
    }
}

impl Display for SignedUrlAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SignedUrlAction::Upload => write!(f, "upload"),
            SignedUrlAction::Download => write!(f, "download"),
        }
    }
}

/// Request for a pre-authorized URL to a single object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrlRequest {
    pub object_key: String,
    pub action: SignedUrlAction,
    pub ttl: Duration,
}

impl SignedUrlRequest {
    pub fn new(object_key: impl Into<String>, action: SignedUrlAction) -> Self {
        Self {
            object_key: object_key.into(),
            action,
            ttl: DEFAULT_SIGNED_URL_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// A time-bounded URL granting one action on one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUrl {
    pub url: Url,
    pub method: String,
    pub action: SignedUrlAction,
    pub object_key: String,
    pub expires_at: DateTime<Utc>,
    /// Headers the backend requires on the signed request
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_headers: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions() {
        assert_eq!(
            "Upload".parse::<SignedUrlAction>().unwrap(),
            SignedUrlAction::Upload
        );
        assert_eq!(
            "get".parse::<SignedUrlAction>().unwrap(),
            SignedUrlAction::Download
        );
    }

    #[test]
    fn rejects_unknown_action() {
        let err = "delete".parse::<SignedUrlAction>().unwrap_err();
        assert!(matches!(err, SignError::UnsupportedAction(ref a) if a == "delete"));
    }

    #[test]
    fn request_defaults_to_one_hour() {
        let request = SignedUrlRequest::new("img.jpg", SignedUrlAction::Download);
        assert_eq!(request.ttl, Duration::from_secs(3600));

        let request = request.with_ttl(Duration::from_secs(60));
        assert_eq!(request.ttl, Duration::from_secs(60));
    }
}
