//! Authentication module
//!
//! YCLIENTS authorizes every request with a partner (bearer) token. Reading
//! client and visit data additionally needs a user token, obtained by a
//! login exchange and appended to the same `Authorization` header.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::Credentials;
