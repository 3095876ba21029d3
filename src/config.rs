/*
 * Responsibility
 * - Load auth settings from the environment (JWT_ALGORITHM, JWT_ISSUER, JWT_AUDIENCE, ...)
 * - Validate values (startup fails when something is missing)
 * - Validator / JwtMiddleware assembly lives in services::auth::factory
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Verification key source.
#[derive(Clone)]
pub enum KeySource {
    HmacSecret(String),
    PublicKeyPem(String),
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        match self {
            KeySource::HmacSecret(_) => f.write_str("HmacSecret(..)"),
            KeySource::PublicKeyPem(_) => f.write_str("PublicKeyPem(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub algorithm: String,
    pub issuer: String,
    pub audience: Vec<String>,
    pub key: KeySource,
    pub clock_skew: Duration,

    pub credentials_optional: bool,
    pub validate_on_options: bool,
    pub exclusion_urls: Vec<String>,
    /// Origin used to match full-URL exclusion entries. `None` disables them.
    pub public_base_url: Option<String>,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let algorithm = lookup("JWT_ALGORITHM").ok_or(ConfigError::MissingEnv("JWT_ALGORITHM"))?;
        let issuer = lookup("JWT_ISSUER").ok_or(ConfigError::MissingEnv("JWT_ISSUER"))?;

        // Present-but-empty is a valid (empty) audience set.
        let audience = lookup("JWT_AUDIENCE")
            .map(|v| split_list(&v))
            .ok_or(ConfigError::MissingEnv("JWT_AUDIENCE"))?;

        let key = match (lookup("JWT_HMAC_SECRET"), lookup("JWT_PUBLIC_KEY_PEM")) {
            (Some(secret), None) if !secret.is_empty() => KeySource::HmacSecret(secret),
            (None, Some(pem)) if !pem.is_empty() => KeySource::PublicKeyPem(pem.replace("\\n", "\n")),
            (Some(_), Some(_)) => return Err(ConfigError::InvalidEnv("JWT_HMAC_SECRET")),
            _ => return Err(ConfigError::MissingEnv("JWT_HMAC_SECRET or JWT_PUBLIC_KEY_PEM")),
        };

        let clock_skew = match lookup("JWT_CLOCK_SKEW_SECONDS") {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidEnv("JWT_CLOCK_SKEW_SECONDS"))?,
            ),
            None => Duration::ZERO,
        };

        let credentials_optional =
            parse_bool(lookup("JWT_CREDENTIALS_OPTIONAL"), false, "JWT_CREDENTIALS_OPTIONAL")?;
        let validate_on_options =
            parse_bool(lookup("JWT_VALIDATE_ON_OPTIONS"), true, "JWT_VALIDATE_ON_OPTIONS")?;

        let exclusion_urls = lookup("JWT_EXCLUSION_URLS")
            .map(|v| split_list(&v))
            .unwrap_or_default();
        let public_base_url = lookup("JWT_PUBLIC_BASE_URL").filter(|v| !v.trim().is_empty());

        Ok(Self {
            algorithm,
            issuer,
            audience,
            key,
            clock_skew,
            credentials_optional,
            validate_on_options,
            exclusion_urls,
            public_base_url,
        })
    }
}

/// Listen address for the demo server (`PORT`, default 3000).
pub fn listen_addr() -> Result<SocketAddr, ConfigError> {
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3000);

    SocketAddr::from_str(&format!("0.0.0.0:{}", port)).map_err(|_| ConfigError::InvalidEnv("PORT"))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: Option<String>, default: bool, key: &'static str) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv(key)),
    }
}
