//! File-backed token registry
//!
//! Tokens are never stored in clear text. The registry file holds SHA-256
//! digests:
//!
//! ```json
//! [
//!   { "token_sha256": "9f86d0…", "store_id": "1AbC…", "role": "admin", "active": true }
//! ]
//! ```

use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{AuthVerdict, Authenticator, Role};
use crate::types::{GatehouseError, Result};

/// One registry file entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub token_sha256: String,
    pub store_id: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Hex SHA-256 of a token
pub fn digest_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// In-memory view of the token file, keyed by digest
#[derive(Debug, Default)]
pub struct TokenRegistry {
    entries: DashMap<String, TokenEntry>,
}

impl TokenRegistry {
    pub fn new(entries: Vec<TokenEntry>) -> Self {
        let registry = Self::default();
        for entry in entries {
            registry
                .entries
                .insert(entry.token_sha256.to_ascii_lowercase(), entry);
        }
        registry
    }

    /// Load a registry file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GatehouseError::Config(format!("cannot read tokens file {}: {}", path.display(), e))
        })?;
        let entries: Vec<TokenEntry> = serde_json::from_str(&raw).map_err(|e| {
            GatehouseError::Config(format!("invalid tokens file {}: {}", path.display(), e))
        })?;

        let registry = Self::new(entries);
        info!(path = %path.display(), tokens = registry.len(), "Token registry loaded");
        Ok(registry)
    }

    /// Registry holding a single clear-text admin token. Dev mode only.
    pub fn dev(token: &str, store_id: &str) -> Self {
        Self::new(vec![TokenEntry {
            token_sha256: digest_token(token),
            store_id: store_id.to_string(),
            role: Role::Admin,
            active: true,
        }])
    }

    /// Register or replace a clear-text token.
    pub fn insert(&self, token: &str, store_id: &str, role: Role) {
        self.entries.insert(
            digest_token(token),
            TokenEntry {
                token_sha256: digest_token(token),
                store_id: store_id.to_string(),
                role,
                active: true,
            },
        );
    }

    /// Deactivate a token. Returns `false` when unknown.
    pub fn revoke(&self, token: &str) -> bool {
        match self.entries.get_mut(&digest_token(token)) {
            Some(mut entry) => {
                entry.active = false;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check(&self, token: &str) -> AuthVerdict {
        let token = token.trim();
        if token.is_empty() {
            return AuthVerdict::denied("missing token");
        }

        let Some(entry) = self.entries.get(&digest_token(token)) else {
            debug!("Unknown token presented");
            return AuthVerdict::denied("invalid token");
        };
        if !entry.active {
            return AuthVerdict::denied("token revoked");
        }
        if entry.store_id.trim().is_empty() {
            return AuthVerdict::denied("token has no store");
        }
        AuthVerdict::granted(entry.store_id.clone(), entry.role)
    }
}

#[async_trait]
impl Authenticator for TokenRegistry {
    async fn verify(&self, token: &str) -> AuthVerdict {
        self.check(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_hex_sha256() {
        assert_eq!(
            digest_token("test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[tokio::test]
    async fn test_verify_known_token() {
        let registry = TokenRegistry::new(vec![TokenEntry {
            token_sha256: digest_token("secret"),
            store_id: "sheet-1".into(),
            role: Role::Operator,
            active: true,
        }]);

        let verdict = registry.verify("secret").await;
        assert!(verdict.valid);
        assert_eq!(verdict.store_id, "sheet-1");
        assert!(!verdict.is_admin());

        // surrounding whitespace is ignored
        assert!(registry.verify("  secret ").await.valid);
    }

    #[tokio::test]
    async fn test_verify_rejects_unknown_empty_and_revoked() {
        let registry = TokenRegistry::dev("dev-token", "dev");
        assert!(registry.verify("dev-token").await.is_admin());

        assert_eq!(registry.verify("").await.message, "missing token");
        assert_eq!(registry.verify("other").await.message, "invalid token");

        assert!(registry.revoke("dev-token"));
        assert!(!registry.revoke("other"));
        let verdict = registry.verify("dev-token").await;
        assert!(!verdict.valid);
        assert_eq!(verdict.message, "token revoked");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("gatehouse-tokens-{}.json", std::process::id()));
        let body = serde_json::json!([
            { "token_sha256": digest_token("a"), "store_id": "s1", "role": "admin" },
            { "token_sha256": digest_token("b").to_uppercase(), "store_id": "s2", "active": false }
        ]);
        std::fs::write(&path, body.to_string()).unwrap();

        let registry = TokenRegistry::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(registry.len(), 2);
        let a = registry.check("a");
        assert!(a.is_admin());
        assert_eq!(a.store_id, "s1");
        assert_eq!(registry.check("b").message, "token revoked");
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = TokenRegistry::load("/nonexistent/gatehouse/tokens.json").unwrap_err();
        assert!(matches!(err, GatehouseError::Config(_)));
    }
}
