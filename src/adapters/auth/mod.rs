//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 validation against the auth provider's shared secret
//! - `mock` - Token table for tests

mod jwt;
mod mock;

pub use jwt::{Claims, JwtSessionValidator};
pub use mock::MockSessionValidator;
