//! Inbound request policy: hardening headers and rate limiting.

pub mod rate_limit;
pub mod security;

pub use rate_limit::enforce_rate_limit;
pub use security::add_security_headers;
