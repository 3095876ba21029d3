/// Factory: build `Validator` / `JwtMiddleware` from `AuthConfig`.
use std::str::FromStr;

use jsonwebtoken::Algorithm;

use crate::config::{AuthConfig, KeySource};
use crate::error::ConfigError;
use crate::middleware::auth::{ExclusionUrls, JwtMiddleware};
use crate::services::auth::{StaticKeyResolver, Validator};

pub fn build_validator(config: &AuthConfig) -> Result<Validator, ConfigError> {
    if config.algorithm.is_empty() {
        return Err(ConfigError::MissingAlgorithm);
    }
    let algorithm = Algorithm::from_str(&config.algorithm)
        .map_err(|_| ConfigError::UnsupportedAlgorithm(config.algorithm.clone()))?;

    let resolver = match &config.key {
        KeySource::HmacSecret(secret) if is_hmac(algorithm) => StaticKeyResolver::from_secret(secret.as_bytes()),
        KeySource::HmacSecret(_) => {
            return Err(ConfigError::KeyAlgorithmMismatch {
                algorithm: config.algorithm.clone(),
                key: "shared secret",
            });
        }
        // from_pem rejects HS* itself.
        KeySource::PublicKeyPem(pem) => StaticKeyResolver::from_pem(algorithm, pem)?,
    };

    Validator::builder()
        .key_resolver(resolver)
        .algorithm(config.algorithm.clone())
        .issuer(config.issuer.clone())
        .audience(config.audience.iter().cloned())
        .clock_skew(config.clock_skew)
        .build()
}

pub fn build_middleware(config: &AuthConfig) -> Result<JwtMiddleware<Validator>, ConfigError> {
    let validator = build_validator(config)?;

    let mut exclusions = ExclusionUrls::new(config.exclusion_urls.iter().cloned());
    if let Some(base) = &config.public_base_url {
        exclusions = exclusions.public_base_url(base.clone());
    }

    Ok(JwtMiddleware::builder(validator)
        .credentials_optional(config.credentials_optional)
        .validate_on_options(config.validate_on_options)
        .exclusions(exclusions)
        .build())
}

fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> AuthConfig {
        AuthConfig {
            algorithm: "HS256".into(),
            issuer: "https://issuer.example".into(),
            audience: vec!["svc-a".into()],
            key: KeySource::HmacSecret("s3cr3t".into()),
            clock_skew: Duration::from_secs(15),
            credentials_optional: true,
            validate_on_options: false,
            exclusion_urls: vec!["/health".into()],
            public_base_url: None,
        }
    }

    #[test]
    fn builds_from_config() {
        let mw = build_middleware(&config()).unwrap();
        assert!(mw.credentials_optional());
        assert!(!mw.validate_on_options());

        let v = build_validator(&config()).unwrap();
        assert_eq!(v.algorithm(), Algorithm::HS256);
        assert_eq!(v.expected_claims().clock_skew, Duration::from_secs(15));
    }

    #[test]
    fn config_errors_abort_construction() {
        let mut cfg = config();
        cfg.issuer.clear();
        assert!(matches!(build_middleware(&cfg), Err(ConfigError::MissingIssuer)));

        let mut cfg = config();
        cfg.algorithm = "ES256".into();
        cfg.key = KeySource::PublicKeyPem("garbage".into());
        assert!(matches!(build_validator(&cfg), Err(ConfigError::InvalidKey { .. })));

        let mut cfg = config();
        cfg.algorithm = "none".into();
        assert!(matches!(build_validator(&cfg), Err(ConfigError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn key_source_must_fit_the_algorithm_family() {
        let mut cfg = config();
        cfg.algorithm = "RS256".into();
        assert!(matches!(
            build_validator(&cfg),
            Err(ConfigError::KeyAlgorithmMismatch { key: "shared secret", .. })
        ));
        assert!(build_middleware(&cfg).is_err());

        let mut cfg = config();
        cfg.key = KeySource::PublicKeyPem("-----BEGIN PUBLIC KEY-----".into());
        assert!(matches!(
            build_validator(&cfg),
            Err(ConfigError::KeyAlgorithmMismatch { key: "public key", .. })
        ));

        let mut cfg = config();
        cfg.algorithm = "HS512".into();
        assert!(build_validator(&cfg).is_ok());
    }
}
