pub mod claims;
pub mod clock;
pub mod context;
pub mod factory;
pub mod key_resolver;
pub mod validator;

pub use claims::{CustomClaims, NoCustomClaims, RegisteredClaims, ValidatedClaims};
pub use clock::{Clock, SystemClock};
pub use context::ValidationContext;
pub use factory::{build_middleware, build_validator};
pub use key_resolver::{FnKeyResolver, KeyResolver, StaticKeyResolver, key_resolver_fn};
pub use validator::{ExpectedClaims, TokenValidator, Validator, ValidatorBuilder};
