//! Authentication and authorization module

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, JwtService};
pub use middleware::{extract_token, jwt_auth_middleware, optional_auth_middleware, Actor};
