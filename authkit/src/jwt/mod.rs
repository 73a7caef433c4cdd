pub mod claims;
pub mod errors;
pub mod signer;

pub use claims::Claims;
pub use errors::JwtError;
pub use signer::TokenSigner;
