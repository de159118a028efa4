/// Authentication Routes
///
/// Handles user registration, login, token refresh, current user
/// information and logout. All business rules live in `CredentialService`;
/// handlers validate input and shape responses.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthSession, CredentialService};
use crate::error::{AppError, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::store::UserResponse;
use crate::validators::{is_valid_email, is_valid_name, is_valid_password};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Session response for signup, signin and refresh
#[derive(Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub session: AuthSession,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            message: "success",
            session,
        }
    }
}

#[derive(Serialize)]
pub struct MeResponse {
    pub message: &'static str,
    pub user: UserResponse,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub message: &'static str,
    pub data: &'static str,
}

/// POST /api/v1/auth/signup
///
/// # Errors
/// - 422: Validation errors (invalid name/email/password)
/// - 409: Email already registered
/// - 500: Internal server error
pub async fn sign_up(
    form: web::Json<RegisterRequest>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AppError> {
    let name = is_valid_name(&form.name)?;
    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let session = service.register(&name, &email, &form.password).await?;
    Ok(HttpResponse::Ok().json(AuthResponse::from(session)))
}

/// POST /api/v1/auth/signin
///
/// # Errors
/// - 422: Validation error (invalid email format, empty password)
/// - 401: Invalid credentials (email not found or wrong password)
/// - 500: Internal server error
pub async fn sign_in(
    form: web::Json<LoginRequest>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    if form.password.is_empty() {
        return Err(ValidationError::EmptyField("password").into());
    }

    let session = service.login(&email, &form.password).await?;
    Ok(HttpResponse::Ok().json(AuthResponse::from(session)))
}

/// POST /api/v1/auth/refresh-token
///
/// Returns a new access token together with the unchanged refresh token.
///
/// # Errors
/// - 422: Missing refresh token
/// - 401: Invalid, expired or wrong-type refresh token
/// - 404: Token subject no longer exists
pub async fn refresh_token(
    form: web::Json<RefreshRequest>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AppError> {
    let token = form.refresh_token.trim();
    if token.is_empty() {
        return Err(ValidationError::EmptyField("refresh_token").into());
    }

    let session = service.refresh(token).await?;
    Ok(HttpResponse::Ok().json(AuthResponse::from(session)))
}

/// GET /api/v1/auth/me
///
/// **Requires valid JWT access token** in Authorization header.
pub async fn me(
    user: web::ReqData<AuthenticatedUser>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AppError> {
    let user = service.get_by_id(user.id).await?;
    Ok(HttpResponse::Ok().json(MeResponse {
        message: "success",
        user,
    }))
}

/// POST /api/v1/auth/logout
///
/// **Requires valid JWT access token.** Issued tokens are not revoked.
pub async fn logout(
    user: web::ReqData<AuthenticatedUser>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AppError> {
    service.logout(user.id).await?;
    Ok(HttpResponse::Ok().json(LogoutResponse {
        message: "success",
        data: "Successfully logged out",
    }))
}
