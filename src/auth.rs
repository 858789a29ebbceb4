pub mod guard;
pub mod jwt;
pub mod tokens;

pub use guard::{authenticate, authorize_ownership, extract_bearer, AuthUser, BearerToken};
pub use jwt::{issue_access_token, validate_access_token, Keys};
pub use tokens::{generate_refresh_token, RefreshTokenStore};
