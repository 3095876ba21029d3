/*
 * Responsibility
 * - Error taxonomy for construction (ConfigError) and per-request validation (ValidationError)
 * - AuthError is what the middleware hands to the ErrorHandler
 * - Response bodies live in middleware::auth::error_handler, not here
 */
use std::sync::Arc;

use thiserror::Error;

/// Boxed cause returned by external collaborators (key resolvers, custom claims).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Missing or unusable construction input. Fatal at startup, never per-request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("key resolver is required but was not set")]
    MissingKeyResolver,
    #[error("signature algorithm is required but was empty")]
    MissingAlgorithm,
    #[error("unsupported signature algorithm: {0:?}")]
    UnsupportedAlgorithm(String),
    #[error("issuer is required but was empty")]
    MissingIssuer,
    #[error("audience is required but was not set")]
    MissingAudience,
    #[error("invalid key material for {algorithm}: {source}")]
    InvalidKey {
        algorithm: String,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    #[error("{key} cannot verify {algorithm} signatures")]
    KeyAlgorithmMismatch { algorithm: String, key: &'static str },
    #[error("missing configuration: {0}")]
    MissingEnv(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidEnv(&'static str),
}

/// Structural problems with the compact serialization.
#[derive(Debug, Error)]
pub enum MalformedToken {
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),
    #[error("header is not valid base64url: {0}")]
    HeaderEncoding(#[from] base64::DecodeError),
    #[error("header is not a valid JOSE header: {0}")]
    Header(#[from] serde_json::Error),
    #[error("token encoding rejected by verifier: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

/// The registered-claim constraint that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClaimsError {
    #[error("invalid issuer claim (iss)")]
    InvalidIssuer,
    #[error("invalid audience claim (aud)")]
    InvalidAudience,
    #[error("token is expired (exp)")]
    Expired,
    #[error("token not valid yet (nbf)")]
    NotValidYet,
    #[error("token issued in the future (iat)")]
    IssuedInFuture,
}

/// Per-request validation failure, one variant per pipeline stage.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("could not parse the token: {0}")]
    Parse(#[from] MalformedToken),
    #[error("expected {expected:?} signing algorithm but token specified {found:?}")]
    AlgorithmMismatch { expected: String, found: String },
    #[error("error getting the key from the key resolver: {0}")]
    KeyResolution(#[source] BoxError),
    #[error("signature verification failed: {0}")]
    Signature(#[source] jsonwebtoken::errors::Error),
    #[error("could not decode token claims: {0}")]
    ClaimsDecode(#[source] Arc<serde_json::Error>),
    #[error("expected claims not validated: {0}")]
    Claims(#[from] ClaimsError),
    #[error("custom claims not validated: {0}")]
    CustomClaims(#[source] BoxError),
}

impl ValidationError {
    /// Short stable label for the failing stage (safe to log).
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::AlgorithmMismatch { .. } => "algorithm",
            Self::KeyResolution(_) => "key_resolution",
            Self::Signature(_) => "signature",
            Self::ClaimsDecode(_) => "claims_decode",
            Self::Claims(_) => "claims",
            Self::CustomClaims(_) => "custom_claims",
        }
    }
}

/// Failure reported by the middleware to the configured ErrorHandler.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no token found in request")]
    MissingToken,
    #[error("token is invalid: {0}")]
    InvalidToken(#[from] ValidationError),
}
