/// JWT Token Generation and Validation
///
/// `TokenService` mints access/refresh token pairs, validates presented
/// tokens and trades a refresh token for a fresh access token. Tokens are
/// stateless: validity depends only on the signature and the time claims.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::claims::{Claims, TokenType};
use crate::configuration::JwtSettings;
use crate::error::ConfigError;
use crate::store::Credential;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Token has expired")]
    Expired,
    #[error("Token is not yet valid")]
    NotYetValid,
    #[error("Malformed token")]
    Malformed,
    #[error("Invalid token claims")]
    InvalidClaims,
    #[error("Wrong token type")]
    WrongTokenType,
    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            // An algorithm outside the HMAC family is treated as a bad
            // signature, never as a reason to try another key type.
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            ErrorKind::InvalidIssuer | ErrorKind::InvalidSubject | ErrorKind::InvalidAudience => {
                TokenError::InvalidClaims
            }
            _ => TokenError::Malformed,
        }
    }
}

/// Freshly minted access + refresh tokens
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// A newly minted access token and its lifetime in seconds
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: i64,
}

/// Claims that passed signature, time-window and issuer checks.
///
/// Only `TokenService::validate` constructs this.
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    claims: Claims,
}

impl ValidatedToken {
    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}

#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[derive(Clone)]
pub struct TokenService {
    access: KeyPair,
    refresh: KeyPair,
    access_ttl: i64,
    refresh_ttl: i64,
    issuer: String,
    validation: Validation,
}

impl TokenService {
    /// Build the service from settings.
    ///
    /// # Errors
    /// Returns error if a secret is missing or both token kinds share a secret.
    pub fn new(config: &JwtSettings) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "nbf", "iat", "iss", "sub"]);

        Ok(Self {
            access: KeyPair::from_secret(&config.secret),
            refresh: KeyPair::from_secret(&config.refresh_secret),
            access_ttl: config.access_token_expiry,
            refresh_ttl: config.refresh_token_expiry,
            issuer: config.issuer.clone(),
            validation,
        })
    }

    fn keys(&self, token_type: TokenType) -> &KeyPair {
        match token_type {
            TokenType::Access => &self.access,
            TokenType::Refresh => &self.refresh,
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.keys(claims.token_type).encoding,
        )
        .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn mint(&self, user_id: Uuid, email: &str, token_type: TokenType) -> Result<String, TokenError> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims::new(user_id, email.to_string(), token_type, ttl, self.issuer.clone());
        self.sign(&claims)
    }

    /// Mint an access token and a refresh token for the same subject,
    /// each signed with its own secret.
    ///
    /// # Errors
    /// Only fails if the signing backend fails (`TokenError::Signing`).
    pub fn generate_token_pair(&self, credential: &Credential) -> Result<TokenPair, TokenError> {
        let access_token = self.mint(credential.id, &credential.email, TokenType::Access)?;
        let refresh_token = self.mint(credential.id, &credential.email, TokenType::Refresh)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_ttl,
        })
    }

    /// Validate a token against the secret of `expected`.
    ///
    /// Signature, algorithm family, `exp`, `nbf`, issuer and claim shape are
    /// all checked; any failure rejects the token. The `type` claim is not
    /// compared here.
    pub fn validate(&self, token: &str, expected: TokenType) -> Result<ValidatedToken, TokenError> {
        decode::<Claims>(token, &self.keys(expected).decoding, &self.validation)
            .map(|data| ValidatedToken { claims: data.claims })
            .map_err(TokenError::from)
    }

    /// Validate a bearer token presented to a protected route.
    pub fn validate_access(&self, token: &str) -> Result<ValidatedToken, TokenError> {
        let validated = self.validate(token, TokenType::Access)?;
        if validated.claims.token_type != TokenType::Access {
            return Err(TokenError::WrongTokenType);
        }
        Ok(validated)
    }

    /// Recover the subject id from a validated token
    ///
    /// # Errors
    /// `InvalidClaims` if `sub` is not a UUID or disagrees with `user_id`
    pub fn extract_subject(&self, token: &ValidatedToken) -> Result<Uuid, TokenError> {
        let sub = Uuid::parse_str(&token.claims.sub).map_err(|_| TokenError::InvalidClaims)?;
        if sub != token.claims.user_id {
            return Err(TokenError::InvalidClaims);
        }
        Ok(sub)
    }

    /// Mint a new access token from a valid refresh token.
    ///
    /// The refresh token itself is not rotated.
    ///
    /// # Errors
    /// `WrongTokenType` if an access token is presented, otherwise the
    /// validation failure of the refresh token.
    pub fn refresh_access(&self, refresh_token: &str) -> Result<AccessToken, TokenError> {
        let validated = match self.validate(refresh_token, TokenType::Refresh) {
            Ok(validated) => validated,
            Err(TokenError::InvalidSignature)
                if self.validate(refresh_token, TokenType::Access).is_ok() =>
            {
                return Err(TokenError::WrongTokenType);
            }
            Err(e) => return Err(e),
        };

        let claims = validated.claims();
        if claims.token_type != TokenType::Refresh {
            return Err(TokenError::WrongTokenType);
        }

        let token = self.mint(claims.user_id, &claims.email, TokenType::Access)?;
        Ok(AccessToken {
            token,
            expires_in: self.access_ttl,
        })
    }
}
