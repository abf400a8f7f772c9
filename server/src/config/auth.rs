use std::fmt;

use super::{optional, required, ConfigError};

/// Deployment environment; decides cookie attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn is_production(self) -> bool {
        matches!(self, AppEnv::Production)
    }
}

/// Settings for one token kind.
#[derive(Clone)]
pub struct TokenConfig {
    pub cookie_name: String,
    pub secret: String,
    pub ttl_seconds: u64,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("cookie_name", &self.cookie_name)
            .field("secret", &"<redacted>")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    pub environment: AppEnv,
    pub access: TokenConfig,
    pub refresh: TokenConfig,
    pub public_key_pem: String,
    pub private_key_pem: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("environment", &self.environment)
            .field("access", &self.access)
            .field("refresh", &self.refresh)
            .finish_non_exhaustive()
    }
}

impl AuthConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match optional(&lookup, "APP_ENV").as_deref() {
            None | Some("development") => AppEnv::Development,
            Some("production") => AppEnv::Production,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "APP_ENV",
                    reason: format!("expected development or production, got {other}"),
                })
            }
        };

        let access = token_config(
            &lookup,
            "ACCESS_TOKEN_NAME",
            "ACCESS_TOKEN_SECRET",
            "ACCESS_TOKEN_EXPIRY",
        )?;
        let refresh = token_config(
            &lookup,
            "REFRESH_TOKEN_NAME",
            "REFRESH_TOKEN_SECRET",
            "REFRESH_TOKEN_EXPIRY",
        )?;

        if access.secret == refresh.secret {
            return Err(ConfigError::Invalid {
                key: "REFRESH_TOKEN_SECRET",
                reason: "must differ from ACCESS_TOKEN_SECRET".to_string(),
            });
        }
        if access.cookie_name == refresh.cookie_name {
            return Err(ConfigError::Invalid {
                key: "REFRESH_TOKEN_NAME",
                reason: "must differ from ACCESS_TOKEN_NAME".to_string(),
            });
        }

        Ok(Self {
            environment,
            access,
            refresh,
            public_key_pem: required(&lookup, "PUBLIC_KEY_FOR_ENCRYPTION")?,
            private_key_pem: required(&lookup, "PRIVATE_KEY_FOR_ENCRYPTION")?,
        })
    }
}

fn token_config<F>(
    lookup: &F,
    name_key: &'static str,
    secret_key: &'static str,
    expiry_key: &'static str,
) -> Result<TokenConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let ttl_seconds = required(lookup, expiry_key)?
        .parse::<u64>()
        .map_err(|e| ConfigError::Invalid {
            key: expiry_key,
            reason: e.to_string(),
        })?;
    if ttl_seconds == 0 {
        return Err(ConfigError::Invalid {
            key: expiry_key,
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(TokenConfig {
        cookie_name: required(lookup, name_key)?,
        secret: required(lookup, secret_key)?,
        ttl_seconds,
    })
}
