use config::ConfigError as SourceError;

use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// JWT signing settings
///
/// Access and refresh tokens are signed with separate secrets so that
/// leaking one key cannot be used to forge the other kind of token.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub refresh_secret: String,
    pub access_token_expiry: i64,  // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_expiry: i64, // seconds (e.g., 604800 for 7 days)
    pub issuer: String,
}

impl JwtSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        if self.refresh_secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.refresh_secret".to_string()));
        }
        if self.secret == self.refresh_secret {
            return Err(ConfigError::InvalidValue(
                "jwt.secret and jwt.refresh_secret must differ".to_string(),
            ));
        }
        if self.issuer.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.issuer".to_string()));
        }
        Ok(())
    }
}

pub fn get_configuration() -> Result<Settings, SourceError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8080)?
        .set_default("jwt.access_token_expiry", 900)?
        .set_default("jwt.refresh_token_expiry", 604_800)?
        .set_default("jwt.issuer", "pseudo-app")?
        .add_source(config::File::with_name("configuration").required(false))
        // e.g. APP_JWT__SECRET=... overrides jwt.secret
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
