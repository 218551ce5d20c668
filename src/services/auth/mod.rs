pub mod claims;
pub mod factory;
pub mod jwks;
pub mod key_cache;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use claims::Claims;
pub use factory::build_token_verifier;
pub use verifier::{InvalidToken, TokenVerifier};
