//! Request authentication
//!
//! Every request carries a token. The token is verified once, before any
//! cache work, and resolves to the store id the caller may touch plus the
//! caller's role.

pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use registry::{digest_token, TokenEntry, TokenRegistry};

/// Caller role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Claims and updates accounts
    #[default]
    Operator,
    /// Operator rights plus cache administration
    Admin,
}

/// Result of a token check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthVerdict {
    pub valid: bool,
    pub store_id: String,
    pub role: Role,
    pub message: String,
}

impl AuthVerdict {
    pub fn granted(store_id: impl Into<String>, role: Role) -> Self {
        Self {
            valid: true,
            store_id: store_id.into(),
            role,
            message: "ok".to_string(),
        }
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            store_id: String::new(),
            role: Role::Operator,
            message: message.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.valid && self.role == Role::Admin
    }
}

/// Token verification seam.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn verify(&self, token: &str) -> AuthVerdict;
}
