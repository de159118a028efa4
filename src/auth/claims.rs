/// JWT Claims structure
///
/// Represents the payload of a JWT token containing user information
/// and standard JWT claims (RFC 7519).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of the two token kinds a JWT is. Each kind has its own signing secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT Claims shared by access and refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Typed copy of the subject
    pub user_id: Uuid,
    /// User email
    pub email: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp)
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Token id, unique per minted token
    pub jti: Uuid,
}

impl Claims {
    /// Create new claims valid from now for `ttl_seconds`
    ///
    /// A negative TTL yields claims that are already expired.
    pub fn new(
        user_id: Uuid,
        email: String,
        token_type: TokenType,
        ttl_seconds: i64,
        issuer: String,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            user_id,
            email,
            token_type,
            iat: now,
            nbf: now,
            exp: now + ttl_seconds,
            iss: issuer,
            jti: Uuid::new_v4(),
        }
    }
}
