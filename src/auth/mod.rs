//! Bearer-token authentication and scope-based authorization.
//!
//! Token validation is delegated to the configured issuer: signatures are
//! checked against its published JWKS, and `iss`/`aud` claims are enforced.
//! Authorization is an exact string match of `"<verb>:<model>"` against the
//! permission list carried by the validated token.

pub mod jwt;
pub mod permissions;

pub use jwt::{AuthError, Claims, Identity, JwksVerifier, TokenVerifier};
pub use permissions::required_permission;
