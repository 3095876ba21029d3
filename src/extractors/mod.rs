/*!
 * Handler-side access to the validated claims.
 *
 * Public API:
 * - Claims<C> (required; `Option<Claims<C>>` behind credentials-optional routes)
 */

mod claims;

pub use claims::Claims;
