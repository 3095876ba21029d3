//! Stateless bearer-JWT authentication for axum services.
//!
//! - [`Validator`] verifies a compact JWT against a pinned algorithm, a
//!   caller-supplied [`KeyResolver`] and the expected issuer / audience / time
//!   window, optionally decoding and validating application [`CustomClaims`].
//! - [`JwtMiddleware`] gates requests: exclusions, OPTIONS bypass, optional
//!   credentials, then validation. On success the [`ValidatedClaims`] are put in
//!   the request extensions and read back in handlers with [`Claims`].
//!
//! ```ignore
//! let validator = Validator::builder()
//!     .key_resolver(StaticKeyResolver::from_secret(b"secret"))
//!     .algorithm("HS256")
//!     .issuer("https://issuer.example")
//!     .audience(["svc-a"])
//!     .clock_skew(Duration::from_secs(30))
//!     .build()?;
//!
//! let gate = Arc::new(JwtMiddleware::builder(validator).exclusion_urls(["/health"]).build());
//! let app = jwt_gate::middleware::auth::apply(routes, gate);
//! ```

pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod services;

pub use config::AuthConfig;
pub use error::{AuthError, BoxError, ClaimsError, ConfigError, MalformedToken, ValidationError};
pub use extractors::Claims;
pub use middleware::auth::{
    AuthHeaderExtractor, DefaultErrorHandler, ErrorHandler, JwtMiddleware, Outcome, TokenExtractor,
};
pub use services::auth::{
    CustomClaims, KeyResolver, RegisteredClaims, StaticKeyResolver, TokenValidator,
    ValidatedClaims, ValidationContext, Validator,
};
