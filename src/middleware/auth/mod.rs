/*
 * Responsibility
 * - Bearer JWT gate (exclusion -> OPTIONS -> token extraction -> validation -> deny/pass)
 * - On success, ValidatedClaims goes into the request extensions
 * - Token source, denial response and exclusion rule are pluggable
 */
pub mod access;
pub mod error_handler;
pub mod exclusion;
pub mod extractor;

pub use access::{JwtMiddleware, JwtMiddlewareBuilder, Outcome, apply, check_jwt};
pub use error_handler::{DefaultErrorHandler, ErrorHandler};
pub use exclusion::ExclusionUrls;
pub use extractor::{
    AuthHeaderExtractor, CookieExtractor, HeaderExtractor, MultiExtractor, QueryParamExtractor,
    TokenExtractor,
};
