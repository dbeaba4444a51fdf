pub mod auth;
pub mod permissions;

pub use auth::{hash_password, verify_password, TokenClaims, TokenIssuer};
pub use permissions::UserRole;
