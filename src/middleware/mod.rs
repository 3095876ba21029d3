/*
 * Responsibility
 * - Public middleware interface (re-exports)
 * - auth: JWT gate; http: request-id / trace / limit / timeout
 */
pub mod auth;
pub mod http;
