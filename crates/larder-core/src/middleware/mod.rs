//! Middleware for Larder.
//!
//! - `identity` - bearer token verification, resolving the caller's identity

mod identity;

pub use identity::{resolve_identity, Identity, TokenVerifier};
