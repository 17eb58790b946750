//! Object key validation shared by signing and transfers.
//!
//! Keys are relative to the session's container or bucket. A single leading or trailing
//! `/` is ignored; empty segments and `.`/`..` segments are rejected.

use object_store::path::Path;

/// Parse an object key into a store path.
pub fn object_path(key: &str) -> Result<Path, String> {
    if key.trim().is_empty() {
        return Err("object key is empty".to_string());
    }

    let path = Path::parse(key).map_err(|e| format!("{}: {}", key, e))?;
    if path.as_ref().is_empty() {
        return Err(format!("{}: object key has no segments", key));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_nested_keys() {
        assert_eq!(object_path("img.jpg").unwrap().as_ref(), "img.jpg");
        assert_eq!(
            object_path("/uploads/2024/img.jpg").unwrap().as_ref(),
            "uploads/2024/img.jpg"
        );
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(object_path("").is_err());
        assert!(object_path("   ").is_err());
        assert!(object_path("/").is_err());
        assert!(object_path("a//b").is_err());
        assert!(object_path("../etc/passwd").is_err());
    }
}
