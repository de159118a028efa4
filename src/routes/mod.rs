mod auth;
mod health_check;
mod metrics;

pub use auth::{logout, me, refresh_token, sign_in, sign_up};
pub use auth::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest};
pub use health_check::{health_check, status};
pub use metrics::metrics;
