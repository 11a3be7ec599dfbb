//! `carkeeper-auth`: identity, credentials, and bearer tokens.
//!
//! This crate is decoupled from HTTP and storage: it knows how to hash and
//! verify passwords and how to issue and validate signed tokens, nothing more.

pub mod claims;
pub mod jwt;
pub mod password;
pub mod roles;
pub mod user;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256Jwt, JwtValidator, TokenError, TokenIssuer};
pub use password::{DEFAULT_PASSWORD_COST, PasswordError, hash_password, hash_password_with_cost, verify_password};
pub use roles::{Role, UnknownRole};
pub use user::{NewUser, RegisterUser, User, UserResponse};
