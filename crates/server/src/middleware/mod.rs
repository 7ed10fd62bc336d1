//! HTTP middleware stack for the Receetly server.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame and referrer policy)
//! 5. Basic auth (`/admin` only)

pub mod basic_auth;
pub mod request_id;
pub mod security_headers;

pub use basic_auth::require_admin;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
