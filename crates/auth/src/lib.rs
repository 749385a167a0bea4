//! `dealroom-auth`: identity-provider contract and authorization checks.
//!
//! This crate is intentionally decoupled from HTTP and storage. The identity
//! provider is an external collaborator: it hands the core an authenticated
//! [`Actor`] and the core trusts `is_broker` as an authorization fact.

pub mod actor;
pub mod authorize;
pub mod claims;
pub mod jwt;

pub use actor::{Actor, normalize_email};
pub use authorize::{Capability, authorize, require_broker};
pub use claims::{BearerClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256TokenValidator, TokenValidator};
