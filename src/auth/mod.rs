/// Authentication module
///
/// Handles JWT token generation/validation, password hashing,
/// and the credential lifecycle (register, login, refresh, logout).

mod claims;
mod jwt;
mod password;
mod service;

pub use claims::Claims;
pub use claims::TokenType;
pub use jwt::{AccessToken, TokenError, TokenPair, TokenService, ValidatedToken};
pub use password::{hash_password, verify_password};
pub use service::{AuthError, AuthSession, CredentialService, TOKEN_TYPE_BEARER};
